//! Chat session state
//!
//! [`ChatSession`] is the single owner of the conversation. The UI thread
//! drives it: requests run on the tokio runtime and report back over a
//! channel that [`ChatSession::poll_events`] drains once per frame, so the
//! store, the playback controller and the voice bridge are only ever touched
//! from one thread.

use crate::client::{Answer, QuestionAnswerer};
use crate::markdown;
use crate::messages::{ConversationStore, Draft, Message, MessageId};
use crate::speech::{
    PlaybackController, PlaybackState, SpeechBackends, SpeechEvent, VoiceInput,
};
use crate::Result;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Bot message text appended when a request fails for any reason
pub const ANSWER_ERROR_TEXT: &str = "Error: Could not get response";

/// Called from worker tasks when new events are waiting
pub type RepaintCallback = Arc<dyn Fn() + Send + Sync>;

/// Results coming back from background work
#[derive(Debug)]
pub enum SessionEvent {
    AnswerSettled {
        request_id: Uuid,
        outcome: Result<Answer>,
    },
}

#[derive(Debug)]
struct InFlight {
    is_voice: bool,
    started: Instant,
}

pub struct ChatSession {
    store: ConversationStore,

    /// Current contents of the input box
    pub input_text: String,

    in_flight: HashMap<Uuid, InFlight>,
    answerer: Arc<dyn QuestionAnswerer>,
    runtime: Handle,
    event_tx: Sender<SessionEvent>,
    event_rx: Receiver<SessionEvent>,

    playback: PlaybackController,
    speech_events: Receiver<SpeechEvent>,
    voice: VoiceInput,

    repaint: Option<RepaintCallback>,
}

impl ChatSession {
    pub fn new(
        answerer: Arc<dyn QuestionAnswerer>,
        speech: SpeechBackends,
        language: &str,
        runtime: Handle,
    ) -> Self {
        let (event_tx, event_rx) = unbounded();

        Self {
            store: ConversationStore::default(),
            input_text: String::new(),
            in_flight: HashMap::new(),
            answerer,
            runtime,
            event_tx,
            event_rx,
            playback: PlaybackController::new(speech.synthesizer, language),
            speech_events: speech.events,
            voice: VoiceInput::new(speech.recognizer, language),
            repaint: None,
        }
    }

    /// Wake the UI when a request settles
    pub fn set_repaint_callback(&mut self, repaint: RepaintCallback) {
        self.repaint = Some(repaint);
    }

    pub fn messages(&self) -> &[Message] {
        self.store.messages()
    }

    pub fn message(&self, id: MessageId) -> Option<&Message> {
        self.store.get(id)
    }

    /// True while at least one request has not settled
    pub fn is_pending(&self) -> bool {
        !self.in_flight.is_empty()
    }

    pub fn is_listening(&self) -> bool {
        self.voice.is_listening()
    }

    pub fn can_listen(&self) -> bool {
        self.voice.is_available()
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.playback.state()
    }

    /// Append the question and start asking it.
    ///
    /// Whitespace-only text is ignored and returns `None`. The question is
    /// stored verbatim; only the emptiness check trims.
    pub fn submit(&mut self, text: &str, is_voice: bool) -> Option<Uuid> {
        if text.trim().is_empty() {
            debug!("Ignoring empty submission");
            return None;
        }

        let message_id = self.store.append(Draft::user(text));
        let request_id = Uuid::new_v4();
        self.in_flight.insert(
            request_id,
            InFlight {
                is_voice,
                started: Instant::now(),
            },
        );

        info!(
            "Asking {} for {} ({} in flight)",
            request_id,
            message_id,
            self.in_flight.len()
        );

        let answerer = Arc::clone(&self.answerer);
        let event_tx = self.event_tx.clone();
        let repaint = self.repaint.clone();
        let question = text.to_string();

        self.runtime.spawn(async move {
            let outcome = answerer.ask(&question).await;
            // The receiver only goes away with the session
            let _ = event_tx.send(SessionEvent::AnswerSettled {
                request_id,
                outcome,
            });
            if let Some(repaint) = repaint {
                repaint();
            }
        });

        Some(request_id)
    }

    /// Submit the input box as typed text, clearing it on success
    pub fn submit_input(&mut self) -> Option<Uuid> {
        let text = std::mem::take(&mut self.input_text);
        let request_id = self.submit(&text, false);
        if request_id.is_none() {
            self.input_text = text;
        }
        request_id
    }

    /// Drain background results. Call once per frame.
    pub fn poll_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            match event {
                SessionEvent::AnswerSettled {
                    request_id,
                    outcome,
                } => self.settle(request_id, outcome),
            }
        }

        while let Ok(event) = self.speech_events.try_recv() {
            self.playback.handle_event(event);
        }

        if let Some(transcript) = self.voice.poll_transcript() {
            info!("Heard: {:?}", transcript.text);
            self.submit(&transcript.text, true);
        }
    }

    /// Play/pause button for a bot message
    pub fn toggle_speech(&mut self, message: MessageId) {
        let Some(text) = self.store.get(message).map(|m| markdown::to_plain_text(m.text())) else {
            warn!("No message {} to speak", message);
            return;
        };
        self.playback.toggle(message, &text);
    }

    pub fn start_listening(&mut self) -> bool {
        self.voice.start_listening()
    }

    /// Cancel any speech. Used on shutdown.
    pub fn stop_speech(&mut self) {
        self.playback.stop();
    }

    fn settle(&mut self, request_id: Uuid, outcome: Result<Answer>) {
        let Some(request) = self.in_flight.remove(&request_id) else {
            warn!("Result for unknown request {}", request_id);
            return;
        };

        let elapsed = request.started.elapsed();

        match outcome {
            Ok(answer) => {
                let spoken = markdown::to_plain_text(&answer.text);
                let draft = Draft::bot(answer.text)
                    .with_locations(answer.locations)
                    .with_image(answer.image_url);
                let message_id = self.store.append(draft);
                info!("Answer {} arrived after {:?}", message_id, elapsed);

                if request.is_voice {
                    self.playback.speak(message_id, &spoken);
                }
            }
            Err(e) => {
                warn!("Request {} failed after {:?}: {}", request_id, elapsed, e);
                self.store.append(Draft::bot(ANSWER_ERROR_TEXT));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AskbotError;
    use async_trait::async_trait;
    use std::time::Duration;

    struct Canned(Result<Answer>);

    #[async_trait]
    impl QuestionAnswerer for Canned {
        async fn ask(&self, _question: &str) -> Result<Answer> {
            self.0.clone()
        }
    }

    fn session(answer: Result<Answer>, runtime: &tokio::runtime::Runtime) -> ChatSession {
        ChatSession::new(
            Arc::new(Canned(answer)),
            SpeechBackends::unsupported("test"),
            "en-US",
            runtime.handle().clone(),
        )
    }

    fn settle_all(session: &mut ChatSession) {
        for _ in 0..200 {
            session.poll_events();
            if !session.is_pending() {
                return;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        panic!("requests never settled");
    }

    #[test]
    fn test_whitespace_input_is_kept() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let mut session = session(Ok(Answer::text("hi")), &runtime);
        session.input_text = "   ".to_string();

        assert!(session.submit_input().is_none());
        assert_eq!(session.input_text, "   ");
        assert!(session.messages().is_empty());
        assert!(!session.is_pending());
    }

    #[test]
    fn test_submit_input_clears_box() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let mut session = session(Ok(Answer::text("hi")), &runtime);
        session.input_text = "Hello".to_string();

        assert!(session.submit_input().is_some());
        assert!(session.input_text.is_empty());
        assert!(session.is_pending());
        assert_eq!(session.messages()[0].text(), "Hello");

        settle_all(&mut session);
        assert_eq!(session.messages().len(), 2);
    }

    #[test]
    fn test_failure_appends_error_text() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let mut session = session(Err(AskbotError::Endpoint { status: 502 }), &runtime);

        session.submit("Where?", false);
        settle_all(&mut session);

        let last = session.messages().last().unwrap();
        assert!(last.is_bot());
        assert_eq!(last.text(), ANSWER_ERROR_TEXT);
    }

    #[test]
    fn test_unknown_message_toggle_is_ignored() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let mut session = session(Ok(Answer::text("hi")), &runtime);
        session.toggle_speech(MessageId(42));
        assert_eq!(session.playback_state(), PlaybackState::Idle);
    }
}
