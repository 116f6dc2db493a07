use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Session-unique message identifier, strictly increasing in append order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// A point of interest returned with a bot answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Markdown
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub map_link: String,
}

/// Message content before the store assigns it an id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub sender: Sender,
    pub text: String,
    pub locations: Vec<Location>,
    pub image_url: Option<String>,
}

impl Draft {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
            locations: Vec::new(),
            image_url: None,
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Bot,
            text: text.into(),
            locations: Vec::new(),
            image_url: None,
        }
    }

    pub fn with_locations(mut self, locations: Vec<Location>) -> Self {
        self.locations = locations;
        self
    }

    pub fn with_image(mut self, image_url: Option<String>) -> Self {
        self.image_url = image_url;
        self
    }
}

/// One entry in the transcript. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    sender: Sender,
    text: String,
    locations: Vec<Location>,
    image_url: Option<String>,
    timestamp: DateTime<Utc>,
}

impl Message {
    pub(crate) fn from_draft(id: MessageId, draft: Draft) -> Self {
        // Locations and images only ever belong to bot messages
        let (locations, image_url) = match draft.sender {
            Sender::Bot => (draft.locations, draft.image_url),
            Sender::User => (Vec::new(), None),
        };

        Self {
            id,
            sender: draft.sender,
            text: draft.text,
            locations,
            image_url,
            timestamp: Utc::now(),
        }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }

    pub fn is_bot(&self) -> bool {
        self.sender == Sender::Bot
    }
}
