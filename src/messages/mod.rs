pub mod storage;
pub mod types;

pub use storage::ConversationStore;
pub use types::{Draft, Location, Message, MessageId, Sender};
