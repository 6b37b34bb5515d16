use crate::error::AskError;
use crate::ui::conversation::AskTicket;
use serde::{Deserialize, Serialize};

/// Internal application events delivered to the UI loop
#[derive(Debug)]
pub enum AppEvent {
    /// An outbound request settled
    AskFinished {
        ticket: AskTicket,
        result: Result<String, AskError>,
    },
}

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "You",
            Role::Assistant => "Assistant",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Role::User => "👤",
            Role::Assistant => "🤖",
        }
    }
}
