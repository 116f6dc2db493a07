//! Application configuration
//!
//! Loaded from `<config_dir>/askbot/config.toml`. Every field has a default,
//! so a missing file (or a partial one) is valid.

use crate::{AskbotError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Text-to-speech settings for the on-device VITS voice
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    /// Whether spoken answers are enabled at all
    pub enabled: bool,

    /// Path to the ONNX model file
    pub model_path: PathBuf,

    /// Path to the tokens file
    pub tokens_path: PathBuf,

    /// Path to the espeak-ng data directory (Piper models)
    pub data_dir: Option<PathBuf>,

    /// Speaker ID for multi-speaker models
    pub speaker_id: i32,

    /// Speech rate multiplier (1.0 = normal)
    pub speed: f32,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model_path: PathBuf::from("models/en_US-amy-low.onnx"),
            tokens_path: PathBuf::from("models/tokens.txt"),
            data_dir: Some(PathBuf::from("models/espeak-ng-data")),
            speaker_id: 0,
            speed: 1.0,
        }
    }
}

/// Speech-to-text settings for one-shot voice entry
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SttConfig {
    /// Whether voice entry is enabled at all
    pub enabled: bool,

    /// Path to the Whisper model file
    pub model_path: PathBuf,

    /// Number of threads to use for transcription
    pub n_threads: i32,

    /// Hard cap on a single listening session
    pub max_listen_secs: f32,

    /// Trailing silence that ends a session once speech was heard
    pub silence_secs: f32,

    /// Speech probability threshold for the VAD (0.0-1.0)
    pub vad_threshold: f32,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model_path: PathBuf::from("models/ggml-base.en.bin"),
            n_threads: 4,
            max_listen_secs: 15.0,
            silence_secs: 1.0,
            vad_threshold: 0.5,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Full URL of the question-answering endpoint
    pub endpoint: String,

    /// BCP 47 language tag used for both recognition and synthesis
    pub language: String,

    /// Request timeout. `None` waits indefinitely.
    pub request_timeout_secs: Option<u64>,

    pub tts: TtsConfig,

    pub stt: SttConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:5000/ask".to_string(),
            language: "en-US".to_string(),
            request_timeout_secs: None,
            tts: TtsConfig::default(),
            stt: SttConfig::default(),
        }
    }
}

impl AppConfig {
    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("askbot").join("config.toml"))
    }

    /// Load from the default location, falling back to defaults
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                debug!("No config directory on this platform, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load from a specific file. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("Config file {:?} not found, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AskbotError::Config(format!("Invalid config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Set the endpoint URL
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the language tag
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Disable both speech capabilities (text-only mode)
    pub fn without_speech(mut self) -> Self {
        self.tts.enabled = false;
        self.stt.enabled = false;
        self
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(AskbotError::Config(format!(
                "Endpoint must be an http(s) URL: {}",
                self.endpoint
            )));
        }

        if self.language.trim().is_empty() {
            return Err(AskbotError::Config("Language tag is required".to_string()));
        }

        if self.tts.speed <= 0.0 {
            return Err(AskbotError::Config("TTS speed must be positive".to_string()));
        }

        if self.stt.max_listen_secs <= 0.0 || self.stt.silence_secs <= 0.0 {
            return Err(AskbotError::Config(
                "Listening durations must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

/// Primary subtag of a language tag ("en" for "en-US"), as Whisper expects
pub fn primary_subtag(tag: &str) -> &str {
    tag.split(['-', '_']).next().unwrap_or(tag)
}
