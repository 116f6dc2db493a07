use crate::{AskbotError, Result};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use tracing::debug;

const CHUNK_SIZE: usize = 1024;

/// Mono sample-rate converter (microphone rate to 16 kHz for Whisper)
pub struct AudioResampler {
    resampler: SincFixedIn<f32>,
    input_rate: u32,
    output_rate: u32,
}

impl AudioResampler {
    pub fn new(input_rate: u32, output_rate: u32) -> Result<Self> {
        if input_rate == 0 || output_rate == 0 {
            return Err(AskbotError::Config(
                "Sample rates must be greater than 0".into(),
            ));
        }

        let params = SincInterpolationParameters {
            sinc_len: 256,
            f_cutoff: 0.95,
            interpolation: SincInterpolationType::Linear,
            oversampling_factor: 256,
            window: WindowFunction::BlackmanHarris2,
        };

        let resampler = SincFixedIn::<f32>::new(
            output_rate as f64 / input_rate as f64,
            2.0,
            params,
            CHUNK_SIZE,
            1,
        )
        .map_err(|e| AskbotError::Recognition(format!("Failed to create resampler: {}", e)))?;

        debug!("Created resampler: {} Hz -> {} Hz", input_rate, output_rate);

        Ok(Self {
            resampler,
            input_rate,
            output_rate,
        })
    }

    /// Resample a complete recording
    pub fn resample(&mut self, input: &[f32]) -> Result<Vec<f32>> {
        if input.is_empty() {
            return Ok(Vec::new());
        }

        let chunk_size = self.resampler.input_frames_max();
        let ratio = self.output_rate as f64 / self.input_rate as f64;
        let mut output = Vec::with_capacity((input.len() as f64 * ratio * 1.1) as usize);

        for chunk in input.chunks(chunk_size) {
            // SincFixedIn needs exactly chunk_size frames per call
            let mut planar = vec![vec![0.0f32; chunk_size]];
            planar[0][..chunk.len()].copy_from_slice(chunk);

            let processed = self
                .resampler
                .process(&planar, None)
                .map_err(|e| AskbotError::Recognition(format!("Resampling failed: {}", e)))?;

            let produced = processed[0].len();
            let wanted = if chunk.len() < chunk_size {
                ((chunk.len() as f64) * ratio).ceil() as usize
            } else {
                produced
            };
            output.extend_from_slice(&processed[0][..wanted.min(produced)]);
        }

        Ok(output)
    }
}
