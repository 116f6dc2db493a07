//! Microphone capture and signal conditioning for on-device recognition

#[cfg(feature = "audio-io")]
pub mod input;
#[cfg(feature = "audio-io")]
pub mod resampler;
#[cfg(feature = "audio-io")]
pub mod vad;

#[cfg(feature = "audio-io")]
pub use input::Microphone;
#[cfg(feature = "audio-io")]
pub use resampler::AudioResampler;
#[cfg(feature = "audio-io")]
pub use vad::VoiceActivityDetector;

/// Sample rate Whisper and the VAD expect
pub const SPEECH_SAMPLE_RATE: u32 = 16000;

/// Root-mean-square level of a block of samples
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
}
