//! HTTP client for `POST /ask`

use super::{Answer, QuestionAnswerer};
use crate::config::AppConfig;
use crate::messages::Location;
use crate::{AskbotError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, Serialize)]
pub struct AskRequest<'a> {
    pub question: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AskResponse {
    pub status: String,
    #[serde(default)]
    pub data: Option<AnswerData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnswerData {
    pub answer: String,
    #[serde(default)]
    pub locations: Option<Vec<Location>>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl AskResponse {
    /// Accept only `status == "success"` with a data payload
    pub fn into_answer(self) -> Result<Answer> {
        if self.status != "success" {
            return Err(AskbotError::InvalidResponse(format!(
                "Unexpected status: {}",
                self.status
            )));
        }

        let data = self
            .data
            .ok_or_else(|| AskbotError::InvalidResponse("Missing data".to_string()))?;

        Ok(Answer {
            text: data.answer,
            locations: data.locations.unwrap_or_default(),
            image_url: data.image_url.filter(|url| !url.is_empty()),
        })
    }
}

/// Client for the question-answering endpoint
#[derive(Clone, Debug)]
pub struct AskClient {
    client: reqwest::Client,
    endpoint: String,
}

impl AskClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| AskbotError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl QuestionAnswerer for AskClient {
    async fn ask(&self, question: &str) -> Result<Answer> {
        debug!("POST {} ({} chars)", self.endpoint, question.len());

        let response = self
            .client
            .post(&self.endpoint)
            .json(&AskRequest { question })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Answer endpoint returned {}", status);
            return Err(AskbotError::Endpoint {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let parsed: AskResponse = serde_json::from_str(&body)
            .map_err(|e| AskbotError::InvalidResponse(e.to_string()))?;

        parsed.into_answer()
    }
}
