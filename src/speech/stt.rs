//! One-shot on-device recognition with Whisper
//!
//! A session captures the default microphone, ends on trailing silence (or
//! a hard time cap) and transcribes what was heard.

use super::{SpeechRecognizer, Transcript};
use crate::audio::{rms, AudioResampler, Microphone, VoiceActivityDetector, SPEECH_SAMPLE_RATE};
use crate::config::{primary_subtag, SttConfig};
use crate::{AskbotError, Result};
use crossbeam_channel::{bounded, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

/// Raw frames fed to the resampler per step
const RESAMPLE_BLOCK: usize = 1024;

/// Tracks speech/silence over 16 kHz VAD chunks
#[derive(Debug, Default)]
struct Endpointer {
    heard_speech: bool,
    trailing_silence: usize,
}

impl Endpointer {
    /// Feed one VAD decision; returns true once the utterance is over
    fn update(&mut self, is_speech: bool, chunk_len: usize, silence_limit: usize) -> bool {
        if is_speech {
            self.heard_speech = true;
            self.trailing_silence = 0;
        } else if self.heard_speech {
            self.trailing_silence += chunk_len;
        }
        self.heard_speech && self.trailing_silence >= silence_limit
    }
}

/// Whisper emits bracketed markers such as `[BLANK_AUDIO]` for non-speech
fn clean_transcript(raw: &str) -> Option<String> {
    let text = raw.trim();
    if text.is_empty() || (text.starts_with('[') && text.ends_with(']')) {
        return None;
    }
    Some(text.to_string())
}

pub struct WhisperRecognizer {
    config: SttConfig,
    context: Arc<WhisperContext>,
}

impl WhisperRecognizer {
    pub fn new(config: SttConfig) -> Result<Self> {
        info!("Loading Whisper model from: {:?}", config.model_path);

        if !config.model_path.exists() {
            return Err(AskbotError::ModelLoad(format!(
                "Model file not found: {:?}",
                config.model_path
            )));
        }

        let path = config
            .model_path
            .to_str()
            .ok_or_else(|| AskbotError::ModelLoad("Invalid model path".to_string()))?;

        let context = WhisperContext::new_with_params(path, WhisperContextParameters::default())
            .map_err(|e| AskbotError::ModelLoad(format!("Failed to load Whisper model: {:?}", e)))?;

        info!("Whisper model loaded successfully");

        Ok(Self {
            config,
            context: Arc::new(context),
        })
    }

    /// Record until trailing silence or the time cap; returns 16 kHz samples
    fn capture(&self) -> Result<Vec<f32>> {
        let mut microphone = Microphone::open_default()?;
        let input_rate = microphone.sample_rate();
        let mut resampler = AudioResampler::new(input_rate, SPEECH_SAMPLE_RATE)?;
        let mut vad = VoiceActivityDetector::new(self.config.vad_threshold)?;

        let (audio_tx, audio_rx) = bounded(64);
        microphone.start(audio_tx)?;

        let deadline = Instant::now() + Duration::from_secs_f32(self.config.max_listen_secs);
        let silence_limit = (self.config.silence_secs * SPEECH_SAMPLE_RATE as f32) as usize;

        let mut raw = Vec::new();
        let mut speech = Vec::new();
        let mut vad_offset = 0;
        let mut endpointer = Endpointer::default();

        'listen: while Instant::now() < deadline {
            match audio_rx.recv_timeout(Duration::from_millis(100)) {
                Ok(block) => raw.extend_from_slice(&block),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }

            let whole = raw.len() - raw.len() % RESAMPLE_BLOCK;
            if whole == 0 {
                continue;
            }
            let converted = resampler.resample(&raw[..whole])?;
            raw.drain(..whole);
            speech.extend_from_slice(&converted);

            while vad_offset + VoiceActivityDetector::CHUNK_SIZE <= speech.len() {
                let chunk = &speech[vad_offset..vad_offset + VoiceActivityDetector::CHUNK_SIZE];
                vad_offset += VoiceActivityDetector::CHUNK_SIZE;

                if endpointer.update(vad.is_speech(chunk), chunk.len(), silence_limit) {
                    debug!("Trailing silence reached after {:.2}s", speech.len() as f32 / SPEECH_SAMPLE_RATE as f32);
                    break 'listen;
                }
            }
        }

        microphone.stop();

        if !endpointer.heard_speech {
            return Err(AskbotError::NoSpeech);
        }

        if !raw.is_empty() {
            speech.extend(resampler.resample(&raw)?);
        }

        debug!("Captured {} samples, level {:.3}", speech.len(), rms(&speech));
        Ok(speech)
    }

    fn transcribe(&self, samples: &[f32], language: &str) -> Result<String> {
        debug!(
            "Transcribing {} samples ({:.2}s)",
            samples.len(),
            samples.len() as f32 / SPEECH_SAMPLE_RATE as f32
        );

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_n_threads(self.config.n_threads);
        params.set_translate(false);
        params.set_print_timestamps(false);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_language(Some(language));

        let mut state = self
            .context
            .create_state()
            .map_err(|e| AskbotError::Recognition(format!("Failed to create state: {:?}", e)))?;

        state
            .full(params, samples)
            .map_err(|e| AskbotError::Recognition(format!("Transcription failed: {:?}", e)))?;

        let segments = state
            .full_n_segments()
            .map_err(|e| AskbotError::Recognition(format!("Failed to get segments: {:?}", e)))?;

        let mut text = String::new();
        for i in 0..segments {
            let segment = state.full_get_segment_text(i).map_err(|e| {
                AskbotError::Recognition(format!("Failed to get segment text: {:?}", e))
            })?;
            text.push_str(&segment);
        }

        Ok(text)
    }
}

impl SpeechRecognizer for WhisperRecognizer {
    fn is_available(&self) -> bool {
        true
    }

    fn recognize_once(&self, language: &str) -> Result<Transcript> {
        let language = primary_subtag(language);

        let samples = self.capture()?;
        let raw = self.transcribe(&samples, language)?;

        clean_transcript(&raw)
            .map(Transcript::new)
            .ok_or(AskbotError::NoSpeech)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpointer_waits_for_speech() {
        let mut endpointer = Endpointer::default();
        for _ in 0..100 {
            assert!(!endpointer.update(false, 512, 1024));
        }
        assert!(!endpointer.heard_speech);
    }

    #[test]
    fn test_endpointer_ends_after_trailing_silence() {
        let mut endpointer = Endpointer::default();
        assert!(!endpointer.update(true, 512, 1024));
        assert!(!endpointer.update(false, 512, 1024));
        // Speech again resets the silence run
        assert!(!endpointer.update(true, 512, 1024));
        assert!(!endpointer.update(false, 512, 1024));
        assert!(endpointer.update(false, 512, 1024));
    }

    #[test]
    fn test_clean_transcript() {
        assert_eq!(clean_transcript("  Where is the library? "), Some("Where is the library?".to_string()));
        assert_eq!(clean_transcript("[BLANK_AUDIO]"), None);
        assert_eq!(clean_transcript("   "), None);
    }

    #[test]
    fn test_missing_model_is_load_error() {
        let config = SttConfig {
            model_path: "does/not/exist.bin".into(),
            ..SttConfig::default()
        };
        assert!(matches!(
            WhisperRecognizer::new(config),
            Err(AskbotError::ModelLoad(_))
        ));
    }
}
