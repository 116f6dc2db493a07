//! Stand-ins for hosts without on-device speech
//!
//! Both report themselves unavailable, so callers log a diagnostic and carry
//! on without speech.

use super::{SpeechRecognizer, SpeechSynthesizer, Transcript, Utterance, UtteranceId};
use crate::{AskbotError, Result};

#[derive(Debug, Clone)]
pub struct UnsupportedSynthesizer {
    reason: String,
}

impl UnsupportedSynthesizer {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl SpeechSynthesizer for UnsupportedSynthesizer {
    fn is_available(&self) -> bool {
        false
    }

    fn speak(&mut self, _id: UtteranceId, _text: &str, _language: &str) -> Result<Box<dyn Utterance>> {
        Err(AskbotError::SpeechUnsupported(self.reason.clone()))
    }
}

#[derive(Debug, Clone)]
pub struct UnsupportedRecognizer {
    reason: String,
}

impl UnsupportedRecognizer {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl SpeechRecognizer for UnsupportedRecognizer {
    fn is_available(&self) -> bool {
        false
    }

    fn recognize_once(&self, _language: &str) -> Result<Transcript> {
        Err(AskbotError::SpeechUnsupported(self.reason.clone()))
    }
}
