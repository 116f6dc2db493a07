use super::types::{Draft, Message, MessageId};
use tracing::debug;

/// Append-only conversation transcript.
///
/// Insertion order is display order. Messages are never edited or removed.
#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    messages: Vec<Message>,
    last_id: u64,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message, assigning it the next id
    pub fn append(&mut self, draft: Draft) -> MessageId {
        self.last_id += 1;
        let id = MessageId(self.last_id);
        debug!("Appending {:?} message {}", draft.sender, id);
        self.messages.push(Message::from_draft(id, draft));
        id
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        // Ids are strictly increasing, so the transcript is sorted by id
        self.messages
            .binary_search_by_key(&id, Message::id)
            .ok()
            .map(|index| &self.messages[index])
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
