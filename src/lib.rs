pub mod audio;
pub mod client;
pub mod config;
pub mod markdown;
pub mod messages;
pub mod speech;
pub mod ui;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AskbotError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Endpoint returned HTTP {status}")]
    Endpoint { status: u16 },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Speech capability unsupported: {0}")]
    SpeechUnsupported(String),

    #[error("Speech synthesis error: {0}")]
    Synthesis(String),

    #[error("Speech recognition error: {0}")]
    Recognition(String),

    #[error("No speech detected")]
    NoSpeech,

    #[error("Audio device error: {0}")]
    AudioDevice(String),

    #[error("Model load error: {0}")]
    ModelLoad(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for AskbotError {
    fn from(e: std::io::Error) -> Self {
        AskbotError::Io(e.to_string())
    }
}

impl From<reqwest::Error> for AskbotError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            AskbotError::Endpoint {
                status: status.as_u16(),
            }
        } else if e.is_decode() {
            AskbotError::InvalidResponse(e.to_string())
        } else {
            AskbotError::Network(e.to_string())
        }
    }
}

impl AskbotError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // The conversation continues after any endpoint failure
            AskbotError::Network(_) => true,
            AskbotError::Endpoint { .. } => true,
            AskbotError::InvalidResponse(_) => true,
            AskbotError::SpeechUnsupported(_) => true,
            AskbotError::Synthesis(_) => true,
            AskbotError::Recognition(_) => true,
            AskbotError::NoSpeech => true,
            // Hardware/model errors need user intervention
            AskbotError::AudioDevice(_) => false,
            AskbotError::ModelLoad(_) => false,
            AskbotError::Config(_) => false,
            AskbotError::Io(_) => false,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            AskbotError::Network(_) | AskbotError::Endpoint { .. } | AskbotError::InvalidResponse(_) => {
                "Could not reach the answer service. Please try again.".to_string()
            }
            AskbotError::SpeechUnsupported(_) => {
                "Speech is not available on this system.".to_string()
            }
            AskbotError::Synthesis(_) => {
                "Text-to-speech failed. The answer is still shown as text.".to_string()
            }
            AskbotError::Recognition(_) | AskbotError::NoSpeech => {
                "Speech recognition failed. Please try again.".to_string()
            }
            AskbotError::AudioDevice(_) => {
                "Audio device error. Please check your microphone/speakers.".to_string()
            }
            AskbotError::ModelLoad(_) => {
                "Failed to load a speech model. Please verify model files are present.".to_string()
            }
            AskbotError::Config(_) => "Configuration error. Please check settings.".to_string(),
            AskbotError::Io(_) => "File system error occurred.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AskbotError>;
