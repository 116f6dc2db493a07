//! Question-answering service
//!
//! The conversation only depends on [`QuestionAnswerer`]; [`AskClient`] is the
//! HTTP implementation used by the application.

pub mod ask;

pub use ask::{AskClient, AskRequest, AskResponse, AnswerData};

use crate::messages::Location;
use crate::Result;
use async_trait::async_trait;

/// A successful answer from the service
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Answer {
    /// Markdown
    pub text: String,
    pub locations: Vec<Location>,
    pub image_url: Option<String>,
}

impl Answer {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

#[async_trait]
pub trait QuestionAnswerer: Send + Sync {
    /// Ask one question. Every failure mode is reported as an error.
    async fn ask(&self, question: &str) -> Result<Answer>;
}
