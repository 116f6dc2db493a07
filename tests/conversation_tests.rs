//! End-to-end conversation behavior against fake and local HTTP backends

mod common;

use askbot::client::{Answer, AskClient};
use askbot::markdown::{self, Block};
use askbot::messages::{Location, MessageId, Sender};
use askbot::speech::{PlaybackState, SpeechEvent, Transcript, UtteranceId};
use askbot::ui::ANSWER_ERROR_TEXT;
use askbot::AskbotError;
use common::{Fixture, QueuedRecognizer, ScriptedAnswerer, SpeechCall};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

fn library_answer() -> Answer {
    Answer {
        text: "It's **north**.".to_string(),
        locations: vec![Location {
            name: "**Main Library**".to_string(),
            image_url: None,
            map_link: "https://maps.example/lib".to_string(),
        }],
        image_url: None,
    }
}

/// Start a local endpoint on its own runtime. Keep the runtime alive for the test.
fn local_endpoint(status_line: &'static str, body: &'static str) -> (tokio::runtime::Runtime, String) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let endpoint = runtime.block_on(serve(status_line, body));
    (runtime, endpoint)
}

/// Serve every connection with the same canned HTTP response
async fn serve(status_line: &'static str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 4096];
                // Read the whole request so the client sees a clean response
                loop {
                    let n = match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => n,
                    };
                    request.extend_from_slice(&buf[..n]);
                    if request_complete(&request) {
                        break;
                    }
                }

                let response = format!(
                    "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{addr}/ask")
}

fn request_complete(request: &[u8]) -> bool {
    let text = String::from_utf8_lossy(request);
    let Some(header_end) = text.find("\r\n\r\n") else {
        return false;
    };
    let content_length = text[..header_end]
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);
    request.len() >= header_end + 4 + content_length
}

#[test]
fn test_submit_appends_question_then_answer() {
    let answerer = ScriptedAnswerer::new().answer("Hello", Ok(Answer::text("Hi there")));
    let mut fixture = Fixture::new(answerer);

    assert!(fixture.session.submit("Hello", false).is_some());
    assert!(fixture.session.is_pending());
    assert_eq!(fixture.session.messages().len(), 1);
    assert_eq!(fixture.session.messages()[0].sender(), Sender::User);

    fixture.settle();

    let messages = fixture.session.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].sender(), Sender::Bot);
    assert_eq!(messages[1].text(), "Hi there");
    assert!(messages[0].id() < messages[1].id());
    assert!(!fixture.session.is_pending());
}

#[test]
fn test_blank_submissions_are_ignored() {
    let mut fixture = Fixture::new(ScriptedAnswerer::new());

    assert!(fixture.session.submit("", false).is_none());
    assert!(fixture.session.submit("  \n\t ", false).is_none());

    assert!(fixture.session.messages().is_empty());
    assert!(!fixture.session.is_pending());
}

#[test]
fn test_question_text_is_stored_verbatim() {
    let answerer = ScriptedAnswerer::new().answer("  padded  ", Ok(Answer::text("ok")));
    let mut fixture = Fixture::new(answerer);

    fixture.session.submit("  padded  ", false);
    fixture.settle();

    assert_eq!(fixture.session.messages()[0].text(), "  padded  ");
    assert_eq!(fixture.session.messages()[1].text(), "ok");
}

#[test]
fn test_library_answer_with_location_card() {
    let answerer =
        ScriptedAnswerer::new().answer("Where is the library?", Ok(library_answer()));
    let mut fixture = Fixture::new(answerer);

    fixture.session.submit("Where is the library?", false);
    fixture.settle();

    let answer = fixture.session.messages().last().unwrap();
    assert!(answer.is_bot());
    assert_eq!(answer.locations().len(), 1);
    assert_eq!(answer.locations()[0].map_link, "https://maps.example/lib");

    let Block::Paragraph(spans) = &markdown::parse(answer.text())[0] else {
        panic!("expected a paragraph");
    };
    assert!(spans.iter().any(|span| span.style.strong && span.text == "north"));

    // Typed questions are never read aloud
    assert!(fixture.spoken().is_empty());
}

#[test]
fn test_overlapping_requests_settle_out_of_order() {
    let answerer = ScriptedAnswerer::new()
        .answer("slow", Ok(Answer::text("slow answer")))
        .delay("slow", Duration::from_millis(300))
        .answer("fast", Ok(Answer::text("fast answer")));
    let mut fixture = Fixture::new(answerer);

    fixture.session.submit("slow", false);
    fixture.session.submit("fast", false);

    fixture.poll_until(|session| session.messages().len() == 3);
    assert_eq!(fixture.session.messages()[2].text(), "fast answer");
    // The slow request is still outstanding
    assert!(fixture.session.is_pending());

    fixture.settle();
    let texts: Vec<&str> = fixture.session.messages().iter().map(|m| m.text()).collect();
    assert_eq!(texts, vec!["slow", "fast", "fast answer", "slow answer"]);

    let ids: Vec<MessageId> = fixture.session.messages().iter().map(|m| m.id()).collect();
    assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn test_failed_request_appends_error_text() {
    let answerer =
        ScriptedAnswerer::new().answer("boom", Err(AskbotError::InvalidResponse("bad".into())));
    let mut fixture = Fixture::new(answerer);

    fixture.session.submit("boom", false);
    fixture.settle();

    let last = fixture.session.messages().last().unwrap();
    assert!(last.is_bot());
    assert_eq!(last.text(), ANSWER_ERROR_TEXT);
    assert!(last.locations().is_empty());
}

#[test]
fn test_http_500_appends_error_text() {
    let (_server, endpoint) = local_endpoint("HTTP/1.1 500 Internal Server Error", "{}");
    let mut fixture = Fixture::new(AskClient::new(endpoint));

    fixture.session.submit("Hi", false);
    fixture.settle();

    let texts: Vec<&str> = fixture.session.messages().iter().map(|m| m.text()).collect();
    assert_eq!(texts, vec!["Hi", ANSWER_ERROR_TEXT]);
    assert!(!fixture.session.is_pending());
}

#[test]
fn test_http_success_carries_locations_and_image() {
    let (_server, endpoint) = local_endpoint(
        "HTTP/1.1 200 OK",
        r#"{"status":"success","data":{"answer":"It's **north**.","locations":[{"name":"Main Library","image_url":"https://img.example/lib.png","map_link":"https://maps.example/lib"}],"image_url":"https://img.example/campus.png"}}"#,
    );
    let mut fixture = Fixture::new(AskClient::new(endpoint));

    fixture.session.submit("Where is the library?", false);
    fixture.settle();

    let answer = fixture.session.messages().last().unwrap();
    assert_eq!(answer.text(), "It's **north**.");
    assert_eq!(answer.image_url(), Some("https://img.example/campus.png"));
    assert_eq!(answer.locations()[0].name, "Main Library");
    assert_eq!(
        answer.locations()[0].image_url.as_deref(),
        Some("https://img.example/lib.png")
    );
}

#[test]
fn test_voice_question_is_answered_aloud() {
    let answerer =
        ScriptedAnswerer::new().answer("where is the library", Ok(library_answer()));
    let recognizer = QueuedRecognizer::new(vec![Ok(Transcript::new("where is the library"))]);
    let mut fixture = Fixture::with_recognizer(answerer, recognizer);

    assert!(fixture.session.start_listening());
    assert!(fixture.session.is_listening());

    fixture.poll_until(|session| session.messages().len() == 2 && !session.is_pending());

    assert!(!fixture.session.is_listening());
    let answer_id = fixture.session.messages()[1].id();
    assert_eq!(fixture.spoken(), vec!["It's north.".to_string()]);
    assert_eq!(
        fixture.session.playback_state(),
        PlaybackState::Speaking(answer_id)
    );
}

#[test]
fn test_failed_voice_answer_is_not_spoken() {
    let recognizer = QueuedRecognizer::new(vec![Ok(Transcript::new("anyone there"))]);
    let mut fixture = Fixture::with_recognizer(ScriptedAnswerer::new(), recognizer);

    fixture.session.start_listening();
    fixture.poll_until(|session| session.messages().len() == 2 && !session.is_pending());

    assert_eq!(fixture.session.messages()[1].text(), ANSWER_ERROR_TEXT);
    assert!(fixture.spoken().is_empty());
    assert_eq!(fixture.session.playback_state(), PlaybackState::Idle);
}

#[test]
fn test_recognition_failure_adds_nothing() {
    let recognizer = QueuedRecognizer::new(vec![Err(AskbotError::NoSpeech)]);
    let mut fixture = Fixture::with_recognizer(ScriptedAnswerer::new(), recognizer);

    fixture.session.start_listening();
    fixture.poll_until(|session| !session.is_listening());

    assert!(fixture.session.messages().is_empty());
    assert!(!fixture.session.is_pending());
}

#[test]
fn test_play_pause_resume_and_completion() {
    let answerer = ScriptedAnswerer::new().answer("Hello", Ok(Answer::text("Hi **there**")));
    let mut fixture = Fixture::new(answerer);

    fixture.session.submit("Hello", false);
    fixture.settle();
    let bot = fixture.session.messages()[1].id();

    fixture.session.toggle_speech(bot);
    assert_eq!(fixture.session.playback_state(), PlaybackState::Speaking(bot));

    fixture.session.toggle_speech(bot);
    assert_eq!(fixture.session.playback_state(), PlaybackState::Paused(bot));

    fixture.session.toggle_speech(bot);
    assert_eq!(fixture.session.playback_state(), PlaybackState::Speaking(bot));

    fixture
        .speech_events
        .send(SpeechEvent::Finished(UtteranceId(1)))
        .unwrap();
    fixture.session.poll_events();
    assert_eq!(fixture.session.playback_state(), PlaybackState::Idle);

    assert_eq!(
        *fixture.speech_log.lock(),
        vec![
            SpeechCall::Speak(UtteranceId(1), "Hi there".to_string()),
            SpeechCall::Pause(UtteranceId(1)),
            SpeechCall::Resume(UtteranceId(1)),
        ]
    );
}

#[test]
fn test_switching_messages_cancels_previous_utterance() {
    let answerer = ScriptedAnswerer::new()
        .answer("one", Ok(Answer::text("first")))
        .answer("two", Ok(Answer::text("second")));
    let mut fixture = Fixture::new(answerer);

    fixture.session.submit("one", false);
    fixture.settle();
    fixture.session.submit("two", false);
    fixture.settle();

    let first = fixture.session.messages()[1].id();
    let second = fixture.session.messages()[3].id();

    fixture.session.toggle_speech(first);
    fixture.session.toggle_speech(second);
    assert_eq!(fixture.session.playback_state(), PlaybackState::Speaking(second));

    // A stale completion for the cancelled utterance is ignored
    fixture
        .speech_events
        .send(SpeechEvent::Finished(UtteranceId(1)))
        .unwrap();
    fixture.session.poll_events();
    assert_eq!(fixture.session.playback_state(), PlaybackState::Speaking(second));

    fixture.session.stop_speech();
    assert_eq!(fixture.session.playback_state(), PlaybackState::Idle);
    assert_eq!(
        fixture.speech_log.lock().last(),
        Some(&SpeechCall::Cancel(UtteranceId(2)))
    );
}

#[tokio::test]
async fn test_client_reports_endpoint_status() {
    let endpoint = serve("HTTP/1.1 503 Service Unavailable", "").await;
    let client = AskClient::new(endpoint);

    let result = askbot::client::QuestionAnswerer::ask(&client, "Hi").await;
    assert_eq!(result, Err(AskbotError::Endpoint { status: 503 }));
}

#[tokio::test]
async fn test_client_rejects_non_success_status_field() {
    let endpoint = serve("HTTP/1.1 200 OK", r#"{"status":"error","data":null}"#).await;
    let client = AskClient::new(endpoint);

    let result = askbot::client::QuestionAnswerer::ask(&client, "Hi").await;
    assert!(matches!(result, Err(AskbotError::InvalidResponse(_))));
}
