//! On-device speech synthesis: VITS voices via sherpa-rs, played through rodio
//!
//! Synthesis runs on a worker thread that owns the model. Each utterance gets
//! its own rodio [`Sink`], which provides pause, resume and cancel.

use super::{SpeechEvent, SpeechSynthesizer, Utterance, UtteranceId};
use crate::config::TtsConfig;
use crate::{AskbotError, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamHandle, Sink};
use sherpa_rs::tts::{VitsTts, VitsTtsConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, error, info, warn};

struct SynthesisJob {
    id: UtteranceId,
    text: String,
    sink: Arc<Sink>,
    cancelled: Arc<AtomicBool>,
}

struct VitsEngine {
    tts: VitsTts,
    config: TtsConfig,
}

impl VitsEngine {
    fn new(config: TtsConfig) -> Self {
        info!("Loading VITS TTS model from: {:?}", config.model_path);

        let path = |p: &std::path::Path| p.to_string_lossy().into_owned();
        let vits_config = VitsTtsConfig {
            model: path(config.model_path.as_path()),
            tokens: path(config.tokens_path.as_path()),
            data_dir: config.data_dir.as_deref().map(path).unwrap_or_default(),
            length_scale: 1.0 / config.speed.max(0.1),
            ..Default::default()
        };

        let tts = VitsTts::new(vits_config);
        info!("TTS engine initialized successfully");

        Self { tts, config }
    }

    fn synthesize(&mut self, text: &str) -> Result<(Vec<f32>, u32)> {
        let audio = self
            .tts
            .create(text, self.config.speaker_id, 1.0)
            .map_err(|e| AskbotError::Synthesis(format!("Synthesis failed: {}", e)))?;

        Ok((audio.samples, audio.sample_rate as u32))
    }
}

/// Normalize text so the voice reads it naturally
pub fn normalize_text_for_tts(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => result.push_str(" and "),
            '%' => result.push_str(" percent"),
            '@' => result.push_str(" at "),
            '*' | '_' | '#' | '`' | '|' => result.push(' '),
            c => result.push(c),
        }
    }
    result.split_whitespace().collect::<Vec<_>>().join(" ")
}

struct RodioUtterance {
    sink: Arc<Sink>,
    cancelled: Arc<AtomicBool>,
}

impl Utterance for RodioUtterance {
    fn pause(&self) {
        self.sink.pause();
    }

    fn resume(&self) {
        self.sink.play();
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.sink.stop();
    }
}

pub struct VitsSynthesizer {
    // Audio stops when the stream is dropped
    _stream: OutputStream,
    handle: OutputStreamHandle,
    job_tx: Sender<SynthesisJob>,
}

impl VitsSynthesizer {
    pub fn new(config: TtsConfig, events: Sender<SpeechEvent>) -> Result<Self> {
        for (what, path) in [("Model", &config.model_path), ("Tokens file", &config.tokens_path)] {
            if !path.exists() {
                return Err(AskbotError::ModelLoad(format!("{} not found: {:?}", what, path)));
            }
        }

        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| AskbotError::AudioDevice(format!("No output device: {}", e)))?;

        let (job_tx, job_rx) = unbounded();
        thread::Builder::new()
            .name("askbot-tts".to_string())
            .spawn(move || run_worker(config, job_rx, events))?;

        Ok(Self {
            _stream: stream,
            handle,
            job_tx,
        })
    }
}

fn run_worker(config: TtsConfig, job_rx: Receiver<SynthesisJob>, events: Sender<SpeechEvent>) {
    let mut engine = VitsEngine::new(config);

    while let Ok(job) = job_rx.recv() {
        if job.cancelled.load(Ordering::SeqCst) {
            continue;
        }

        let text = normalize_text_for_tts(&job.text);
        debug!("Synthesizing {} ({} chars)", job.id, text.len());

        let (samples, sample_rate) = match engine.synthesize(&text) {
            Ok(audio) => audio,
            Err(e) => {
                warn!("TTS synthesis failed for {}: {}", job.id, e);
                let _ = events.send(SpeechEvent::Failed {
                    utterance: job.id,
                    error: e.to_string(),
                });
                continue;
            }
        };

        if job.cancelled.load(Ordering::SeqCst) {
            continue;
        }

        if samples.is_empty() {
            let _ = events.send(SpeechEvent::Finished(job.id));
            continue;
        }

        if !enqueue(&job.sink, &job.cancelled, SamplesBuffer::new(1, sample_rate, samples)) {
            continue;
        }

        let events = events.clone();
        let spawned = thread::Builder::new()
            .name("askbot-tts-watch".to_string())
            .spawn(move || {
                job.sink.sleep_until_end();
                if !job.cancelled.load(Ordering::SeqCst) {
                    let _ = events.send(SpeechEvent::Finished(job.id));
                }
            });

        if let Err(e) = spawned {
            error!("Failed to watch utterance: {}", e);
        }
    }

    debug!("TTS worker stopped");
}

/// Append synthesized audio unless the utterance was cancelled.
///
/// `Sink::append` clears the sink's stopped flag, so a cancel that raced the
/// append is applied again. Returns whether the audio is left playing.
fn enqueue(sink: &Sink, cancelled: &AtomicBool, audio: SamplesBuffer<f32>) -> bool {
    if cancelled.load(Ordering::SeqCst) {
        return false;
    }

    sink.append(audio);

    if cancelled.load(Ordering::SeqCst) {
        sink.stop();
        return false;
    }
    true
}

impl SpeechSynthesizer for VitsSynthesizer {
    fn is_available(&self) -> bool {
        true
    }

    fn speak(&mut self, id: UtteranceId, text: &str, language: &str) -> Result<Box<dyn Utterance>> {
        debug!("Queueing {} in {}", id, language);

        let sink = Sink::try_new(&self.handle)
            .map_err(|e| AskbotError::AudioDevice(format!("Failed to open sink: {}", e)))?;
        let sink = Arc::new(sink);
        let cancelled = Arc::new(AtomicBool::new(false));

        self.job_tx
            .send(SynthesisJob {
                id,
                text: text.to_string(),
                sink: Arc::clone(&sink),
                cancelled: Arc::clone(&cancelled),
            })
            .map_err(|_| AskbotError::Synthesis("TTS worker is not running".to_string()))?;

        Ok(Box::new(RodioUtterance { sink, cancelled }))
    }
}
