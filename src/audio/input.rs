use crate::{AskbotError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Default microphone, delivering mono f32 blocks over a channel.
///
/// Blocks are dropped rather than queued when the consumer falls behind.
pub struct Microphone {
    device: Device,
    config: StreamConfig,
    stream: Option<Stream>,
    capturing: Arc<AtomicBool>,
}

impl Microphone {
    pub fn open_default() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| AskbotError::AudioDevice("No microphone available".into()))?;

        info!(
            "Using microphone: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let config = device
            .default_input_config()
            .map_err(|e| AskbotError::AudioDevice(format!("Failed to get input config: {}", e)))?
            .into();

        Ok(Self {
            device,
            config,
            stream: None,
            capturing: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    pub fn start(&mut self, blocks: Sender<Vec<f32>>) -> Result<()> {
        if self.is_capturing() {
            warn!("Microphone already capturing");
            return Ok(());
        }

        let channels = self.config.channels as usize;
        let capturing = Arc::clone(&self.capturing);

        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if !capturing.load(Ordering::Relaxed) {
                        return;
                    }
                    if blocks.try_send(downmix(data, channels)).is_err() {
                        debug!("Dropped microphone block");
                    }
                },
                |err| error!("Microphone stream error: {}", err),
                None,
            )
            .map_err(|e| AskbotError::AudioDevice(format!("Failed to build input stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| AskbotError::AudioDevice(format!("Failed to start input stream: {}", e)))?;

        self.capturing.store(true, Ordering::Relaxed);
        self.stream = Some(stream);

        debug!("Capturing at {} Hz, {} channel(s)", self.sample_rate(), channels);
        Ok(())
    }

    pub fn stop(&mut self) {
        self.capturing.store(false, Ordering::Relaxed);
        if self.stream.take().is_some() {
            debug!("Microphone stopped");
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::Relaxed)
    }
}

impl Drop for Microphone {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Average interleaved frames down to one channel
fn downmix(data: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return data.to_vec();
    }
    data.chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    #[test]
    fn test_downmix_stereo() {
        assert_eq!(downmix(&[0.2, 0.4, -1.0, 1.0], 2), vec![0.3, 0.0]);
        assert_eq!(downmix(&[0.5, 0.25], 1), vec![0.5, 0.25]);
    }

    #[test]
    fn test_microphone_lifecycle() {
        // No input device in most CI environments
        if let Ok(mut microphone) = Microphone::open_default() {
            assert!(microphone.sample_rate() > 0);
            assert!(!microphone.is_capturing());

            let (tx, _rx) = bounded(10);
            if microphone.start(tx).is_ok() {
                assert!(microphone.is_capturing());
                microphone.stop();
                assert!(!microphone.is_capturing());
            }
        }
    }
}
