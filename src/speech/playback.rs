//! Per-message speech playback
//!
//! Owns at most one utterance at a time. Starting a new utterance always
//! cancels and releases the previous one first.

use super::{SpeechEvent, SpeechSynthesizer, Utterance, UtteranceId};
use crate::messages::MessageId;
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Speaking(MessageId),
    Paused(MessageId),
}

impl PlaybackState {
    pub fn message(&self) -> Option<MessageId> {
        match self {
            PlaybackState::Idle => None,
            PlaybackState::Speaking(id) | PlaybackState::Paused(id) => Some(*id),
        }
    }
}

struct ActiveUtterance {
    id: UtteranceId,
    message: MessageId,
    handle: Box<dyn Utterance>,
    paused: bool,
}

pub struct PlaybackController {
    synthesizer: Box<dyn SpeechSynthesizer>,
    language: String,
    active: Option<ActiveUtterance>,
    next_utterance: u64,
}

impl PlaybackController {
    pub fn new(synthesizer: Box<dyn SpeechSynthesizer>, language: impl Into<String>) -> Self {
        Self {
            synthesizer,
            language: language.into(),
            active: None,
            next_utterance: 0,
        }
    }

    pub fn state(&self) -> PlaybackState {
        match &self.active {
            None => PlaybackState::Idle,
            Some(active) if active.paused => PlaybackState::Paused(active.message),
            Some(active) => PlaybackState::Speaking(active.message),
        }
    }

    pub fn is_speaking(&self, message: MessageId) -> bool {
        self.state() == PlaybackState::Speaking(message)
    }

    /// Play/pause button for one message.
    ///
    /// Speaking this message pauses it, a paused utterance of this message
    /// resumes, anything else (including a paused utterance of a different
    /// message) starts a fresh utterance for this message.
    pub fn toggle(&mut self, message: MessageId, text: &str) {
        match self.active.as_mut() {
            Some(active) if active.message == message && !active.paused => {
                debug!("Pausing {} for message {}", active.id, message);
                active.handle.pause();
                active.paused = true;
            }
            Some(active) if active.message == message => {
                debug!("Resuming {} for message {}", active.id, message);
                active.handle.resume();
                active.paused = false;
            }
            _ => self.speak(message, text),
        }
    }

    /// Start a new utterance for `message`, replacing any existing one
    pub fn speak(&mut self, message: MessageId, text: &str) {
        self.cancel_active();

        if !self.synthesizer.is_available() {
            error!("Speech synthesis not supported on this system");
            return;
        }

        self.next_utterance += 1;
        let id = UtteranceId(self.next_utterance);

        match self.synthesizer.speak(id, text, &self.language) {
            Ok(handle) => {
                debug!("Started {} for message {}", id, message);
                self.active = Some(ActiveUtterance {
                    id,
                    message,
                    handle,
                    paused: false,
                });
            }
            Err(e) => {
                error!("Failed to start speech for message {}: {}", message, e);
            }
        }
    }

    /// Cancel whatever is playing or paused
    pub fn stop(&mut self) {
        self.cancel_active();
    }

    /// Apply a completion notification from the synthesizer
    pub fn handle_event(&mut self, event: SpeechEvent) {
        let (utterance, failure) = match event {
            SpeechEvent::Finished(utterance) => (utterance, None),
            SpeechEvent::Failed { utterance, error } => (utterance, Some(error)),
        };

        match &self.active {
            Some(active) if active.id == utterance => {
                if let Some(error) = failure {
                    warn!("{} failed: {}", utterance, error);
                } else {
                    debug!("{} finished", utterance);
                }
                self.active = None;
            }
            _ => debug!("Ignoring event for stale {}", utterance),
        }
    }

    fn cancel_active(&mut self) {
        if let Some(active) = self.active.take() {
            debug!("Cancelling {} for message {}", active.id, active.message);
            active.handle.cancel();
        }
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.cancel_active();
    }
}
