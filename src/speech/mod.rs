//! Speech capabilities
//!
//! The host speech engines sit behind two small traits so the playback
//! controller and the voice-input bridge can be driven by fakes in tests:
//! - [`SpeechSynthesizer`] turns text into a cancellable [`Utterance`] and
//!   reports natural completion as a [`SpeechEvent`]
//! - [`SpeechRecognizer`] runs one blocking recognition session

pub mod listener;
pub mod playback;
#[cfg(feature = "audio-io")]
pub mod stt;
#[cfg(feature = "audio-io")]
pub mod tts;
pub mod unsupported;

pub use listener::VoiceInput;
pub use playback::{PlaybackController, PlaybackState};
pub use unsupported::{UnsupportedRecognizer, UnsupportedSynthesizer};

use crate::config::AppConfig;
use crate::Result;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::fmt;
use std::sync::Arc;
#[cfg(feature = "audio-io")]
use tracing::warn;

/// Identifies one synthesis request for its whole lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UtteranceId(pub u64);

impl fmt::Display for UtteranceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "utterance-{}", self.0)
    }
}

/// Asynchronous notifications from a synthesizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    /// Playback reached the end of the text. Never sent for cancelled utterances.
    Finished(UtteranceId),

    /// The utterance could not be rendered
    Failed { utterance: UtteranceId, error: String },
}

/// Handle to a pending or playing utterance
pub trait Utterance: Send {
    fn pause(&self);
    fn resume(&self);
    /// Stop and discard. No [`SpeechEvent`] follows a cancel.
    fn cancel(&self);
}

pub trait SpeechSynthesizer {
    fn is_available(&self) -> bool;

    /// Start speaking `text`. Playback begins immediately.
    fn speak(&mut self, id: UtteranceId, text: &str, language: &str) -> Result<Box<dyn Utterance>>;
}

/// Final text of one recognition session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub text: String,
}

impl Transcript {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

pub trait SpeechRecognizer: Send + Sync {
    fn is_available(&self) -> bool;

    /// Listen once and return the final transcript. Blocks until the
    /// session completes, so callers run it off the UI thread.
    fn recognize_once(&self, language: &str) -> Result<Transcript>;
}

/// The speech capabilities a chat session runs with
pub struct SpeechBackends {
    pub synthesizer: Box<dyn SpeechSynthesizer>,
    pub recognizer: Arc<dyn SpeechRecognizer>,
    /// Completion events from `synthesizer`
    pub events: Receiver<SpeechEvent>,
}

impl SpeechBackends {
    /// Text-only operation
    pub fn unsupported(reason: &str) -> Self {
        let (_events_tx, events) = unbounded();
        Self {
            synthesizer: Box::new(UnsupportedSynthesizer::new(reason)),
            recognizer: Arc::new(UnsupportedRecognizer::new(reason)),
            events,
        }
    }

    /// On-device engines where configured and loadable, stand-ins otherwise
    pub fn from_config(config: &AppConfig) -> Self {
        let (events_tx, events) = unbounded();
        Self {
            synthesizer: build_synthesizer(config, events_tx),
            recognizer: build_recognizer(config),
            events,
        }
    }
}

#[cfg(feature = "audio-io")]
fn build_synthesizer(config: &AppConfig, events: Sender<SpeechEvent>) -> Box<dyn SpeechSynthesizer> {
    if !config.tts.enabled {
        return Box::new(UnsupportedSynthesizer::new("speech synthesis disabled in configuration"));
    }

    match tts::VitsSynthesizer::new(config.tts.clone(), events) {
        Ok(synthesizer) => Box::new(synthesizer),
        Err(e) => {
            warn!("Speech synthesis unavailable: {}", e);
            Box::new(UnsupportedSynthesizer::new(e.to_string()))
        }
    }
}

#[cfg(not(feature = "audio-io"))]
fn build_synthesizer(_config: &AppConfig, _events: Sender<SpeechEvent>) -> Box<dyn SpeechSynthesizer> {
    Box::new(UnsupportedSynthesizer::new("built without audio support"))
}

#[cfg(feature = "audio-io")]
fn build_recognizer(config: &AppConfig) -> Arc<dyn SpeechRecognizer> {
    if !config.stt.enabled {
        return Arc::new(UnsupportedRecognizer::new("speech recognition disabled in configuration"));
    }

    match stt::WhisperRecognizer::new(config.stt.clone()) {
        Ok(recognizer) => Arc::new(recognizer),
        Err(e) => {
            warn!("Speech recognition unavailable: {}", e);
            Arc::new(UnsupportedRecognizer::new(e.to_string()))
        }
    }
}

#[cfg(not(feature = "audio-io"))]
fn build_recognizer(_config: &AppConfig) -> Arc<dyn SpeechRecognizer> {
    Arc::new(UnsupportedRecognizer::new("built without audio support"))
}
