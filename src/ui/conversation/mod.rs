//! Conversation UI components for the chat screen

pub mod commands;
pub mod composer;
pub mod history;
pub mod indicator;
pub mod manager;
pub mod settings;
pub mod store;

pub use commands::{get_help_text, SlashCommand};
pub use composer::{ComposerAction, ConversationComposer};
pub use history::ConversationHistory;
pub use indicator::ThinkingIndicator;
pub use manager::{AskTicket, ConversationAction, ConversationManager, Settled};
pub use settings::{SettingsAction, SettingsModal};
pub use store::{ConversationStore, Message, MessageId, MessagePatch};
