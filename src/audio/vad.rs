use crate::{AskbotError, Result};
use tracing::debug;
use voice_activity_detector::VoiceActivityDetector as VadDetector;

/// Silero voice activity detection on 16 kHz mono audio
pub struct VoiceActivityDetector {
    detector: VadDetector,
    threshold: f32,
}

impl VoiceActivityDetector {
    /// Samples per prediction at 16 kHz (32 ms)
    pub const CHUNK_SIZE: usize = 512;

    pub fn new(threshold: f32) -> Result<Self> {
        let detector = VadDetector::builder()
            .sample_rate(super::SPEECH_SAMPLE_RATE as i32)
            .chunk_size(Self::CHUNK_SIZE)
            .build()
            .map_err(|e| AskbotError::Recognition(format!("Failed to create VAD: {:?}", e)))?;

        debug!("Initialized VAD with threshold {}", threshold);

        Ok(Self {
            detector,
            threshold: threshold.clamp(0.0, 1.0),
        })
    }

    /// Whether a [`Self::CHUNK_SIZE`] block contains speech
    pub fn is_speech(&mut self, chunk: &[f32]) -> bool {
        self.detector.predict(chunk.iter().copied()) >= self.threshold
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }
}
