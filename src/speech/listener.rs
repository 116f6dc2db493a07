//! Voice entry: one recognition session at a time, run off the UI thread

use super::{SpeechRecognizer, Transcript};
use crate::Result;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use tracing::{debug, error, info, warn};

pub struct VoiceInput {
    recognizer: Arc<dyn SpeechRecognizer>,
    language: String,
    listening: bool,
    result_tx: Sender<Result<Transcript>>,
    result_rx: Receiver<Result<Transcript>>,
}

impl VoiceInput {
    pub fn new(recognizer: Arc<dyn SpeechRecognizer>, language: impl Into<String>) -> Self {
        let (result_tx, result_rx) = unbounded();
        Self {
            recognizer,
            language: language.into(),
            listening: false,
            result_tx,
            result_rx,
        }
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn is_available(&self) -> bool {
        self.recognizer.is_available()
    }

    /// Begin a recognition session. Returns `false` when nothing was started:
    /// the recognizer is unavailable or a session is already running.
    pub fn start_listening(&mut self) -> bool {
        if !self.recognizer.is_available() {
            error!("Speech recognition not supported on this system");
            return false;
        }

        if self.listening {
            debug!("Already listening, ignoring start request");
            return false;
        }

        let recognizer = Arc::clone(&self.recognizer);
        let language = self.language.clone();
        let result_tx = self.result_tx.clone();

        let spawned = thread::Builder::new()
            .name("askbot-recognizer".to_string())
            .spawn(move || {
                let result = recognizer.recognize_once(&language);
                // The receiver only disappears when the session is gone
                let _ = result_tx.send(result);
            });

        match spawned {
            Ok(_) => {
                info!("Listening for speech ({})", self.language);
                self.listening = true;
                true
            }
            Err(e) => {
                error!("Failed to start recognition thread: {}", e);
                false
            }
        }
    }

    /// Take a finished recognition session, if any.
    ///
    /// Errors are logged here and swallowed; only transcripts come back.
    pub fn poll_transcript(&mut self) -> Option<Transcript> {
        let result = self.result_rx.try_recv().ok()?;
        self.listening = false;

        match result {
            Ok(transcript) => {
                debug!("Recognized: \"{}\"", transcript.text);
                Some(transcript)
            }
            Err(e) => {
                warn!("Speech recognition error: {}", e);
                None
            }
        }
    }
}
