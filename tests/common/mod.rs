//! Fakes shared by the integration tests

#![allow(dead_code)]

use askbot::client::{Answer, QuestionAnswerer};
use askbot::speech::{
    SpeechBackends, SpeechEvent, SpeechRecognizer, SpeechSynthesizer, Transcript, Utterance,
    UtteranceId,
};
use askbot::ui::ChatSession;
use askbot::{AskbotError, Result};
use async_trait::async_trait;
use crossbeam_channel::{unbounded, Sender};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Answers looked up by question, with an optional artificial latency
#[derive(Default)]
pub struct ScriptedAnswerer {
    answers: HashMap<String, Result<Answer>>,
    delays: HashMap<String, Duration>,
    pub asked: Mutex<Vec<String>>,
}

impl ScriptedAnswerer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, question: &str, answer: Result<Answer>) -> Self {
        self.answers.insert(question.to_string(), answer);
        self
    }

    pub fn delay(mut self, question: &str, delay: Duration) -> Self {
        self.delays.insert(question.to_string(), delay);
        self
    }
}

#[async_trait]
impl QuestionAnswerer for ScriptedAnswerer {
    async fn ask(&self, question: &str) -> Result<Answer> {
        self.asked.lock().push(question.to_string());
        if let Some(delay) = self.delays.get(question) {
            tokio::time::sleep(*delay).await;
        }
        self.answers
            .get(question)
            .cloned()
            .unwrap_or_else(|| Err(AskbotError::Network(format!("no answer for {question:?}"))))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechCall {
    Speak(UtteranceId, String),
    Pause(UtteranceId),
    Resume(UtteranceId),
    Cancel(UtteranceId),
}

pub type SpeechLog = Arc<Mutex<Vec<SpeechCall>>>;

struct LoggedUtterance {
    id: UtteranceId,
    log: SpeechLog,
}

impl Utterance for LoggedUtterance {
    fn pause(&self) {
        self.log.lock().push(SpeechCall::Pause(self.id));
    }
    fn resume(&self) {
        self.log.lock().push(SpeechCall::Resume(self.id));
    }
    fn cancel(&self) {
        self.log.lock().push(SpeechCall::Cancel(self.id));
    }
}

/// Synthesizer that records calls instead of producing audio
pub struct LoggingSynthesizer {
    log: SpeechLog,
}

impl SpeechSynthesizer for LoggingSynthesizer {
    fn is_available(&self) -> bool {
        true
    }

    fn speak(&mut self, id: UtteranceId, text: &str, _language: &str) -> Result<Box<dyn Utterance>> {
        self.log.lock().push(SpeechCall::Speak(id, text.to_string()));
        Ok(Box::new(LoggedUtterance {
            id,
            log: Arc::clone(&self.log),
        }))
    }
}

/// Hands out queued transcripts, one per session
pub struct QueuedRecognizer {
    transcripts: Mutex<Vec<Result<Transcript>>>,
}

impl QueuedRecognizer {
    pub fn new(transcripts: Vec<Result<Transcript>>) -> Self {
        Self {
            transcripts: Mutex::new(transcripts),
        }
    }
}

impl SpeechRecognizer for QueuedRecognizer {
    fn is_available(&self) -> bool {
        true
    }

    fn recognize_once(&self, _language: &str) -> Result<Transcript> {
        let mut transcripts = self.transcripts.lock();
        if transcripts.is_empty() {
            Err(AskbotError::NoSpeech)
        } else {
            transcripts.remove(0)
        }
    }
}

/// A session wired to fakes, plus handles to observe and drive speech
pub struct Fixture {
    pub session: ChatSession,
    pub speech_log: SpeechLog,
    pub speech_events: Sender<SpeechEvent>,
    pub runtime: tokio::runtime::Runtime,
}

impl Fixture {
    pub fn new(answerer: impl QuestionAnswerer + 'static) -> Self {
        Self::with_recognizer(answerer, QueuedRecognizer::new(Vec::new()))
    }

    pub fn with_recognizer(
        answerer: impl QuestionAnswerer + 'static,
        recognizer: QueuedRecognizer,
    ) -> Self {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();

        let speech_log = SpeechLog::default();
        let (speech_events, events) = unbounded();
        let speech = SpeechBackends {
            synthesizer: Box::new(LoggingSynthesizer {
                log: Arc::clone(&speech_log),
            }),
            recognizer: Arc::new(recognizer),
            events,
        };

        let session = ChatSession::new(Arc::new(answerer), speech, "en-US", runtime.handle().clone());

        Self {
            session,
            speech_log,
            speech_events,
            runtime,
        }
    }

    /// Poll until `done` holds or five seconds pass
    pub fn poll_until(&mut self, mut done: impl FnMut(&ChatSession) -> bool) {
        for _ in 0..500 {
            self.session.poll_events();
            if done(&self.session) {
                return;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        panic!("condition not reached within 5s");
    }

    pub fn settle(&mut self) {
        self.poll_until(|session| !session.is_pending());
    }

    pub fn spoken(&self) -> Vec<String> {
        self.speech_log
            .lock()
            .iter()
            .filter_map(|call| match call {
                SpeechCall::Speak(_, text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }
}
