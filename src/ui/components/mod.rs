mod input_bar;
mod markdown_view;
mod message_list;

pub use input_bar::InputBar;
pub use markdown_view::MarkdownView;
pub use message_list::MessageList;
