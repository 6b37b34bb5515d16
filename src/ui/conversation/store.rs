//! Ordered message transcript with id-based mutation

use crate::events::Role;
use chrono::{DateTime, Local};
use std::fmt;

/// Opaque message identifier, unique for the lifetime of a store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg-{}", self.0)
    }
}

/// A single message in the transcript
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: MessageId,
    pub content: String,
    pub role: Role,
    pub timestamp: DateTime<Local>,
    pub is_loading: bool,
}

/// Fields merged into an existing message by [`ConversationStore::replace_by_id`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessagePatch {
    pub content: Option<String>,
    pub is_loading: Option<bool>,
}

impl MessagePatch {
    /// Final content for a placeholder: text filled in, loading cleared
    pub fn resolved(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            is_loading: Some(false),
        }
    }
}

/// The conversation transcript
#[derive(Debug, Clone)]
pub struct ConversationStore {
    messages: Vec<Message>,
    greeting: String,
    next_id: u64,
}

impl ConversationStore {
    /// Create a store seeded with the greeting message
    pub fn new(greeting: impl Into<String>) -> Self {
        let mut store = Self {
            messages: Vec::new(),
            greeting: greeting.into(),
            next_id: 0,
        };
        store.reset();
        store
    }

    fn next_id(&mut self) -> MessageId {
        self.next_id += 1;
        MessageId(self.next_id)
    }

    fn message(&mut self, role: Role, content: String, is_loading: bool) -> Message {
        Message {
            id: self.next_id(),
            content,
            role,
            timestamp: Local::now(),
            is_loading,
        }
    }

    /// A finished message from the user
    pub fn user_message(&mut self, content: impl Into<String>) -> Message {
        self.message(Role::User, content.into(), false)
    }

    /// A finished message from the assistant side
    pub fn assistant_message(&mut self, content: impl Into<String>) -> Message {
        self.message(Role::Assistant, content.into(), false)
    }

    /// An empty assistant message awaiting its answer
    pub fn placeholder(&mut self) -> Message {
        self.message(Role::Assistant, String::new(), true)
    }

    /// Add a message to the end of the transcript
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Merge `patch` into the message with `id`. Returns false if there is none.
    pub fn replace_by_id(&mut self, id: MessageId, patch: MessagePatch) -> bool {
        let Some(message) = self.messages.iter_mut().find(|m| m.id == id) else {
            return false;
        };

        if let Some(content) = patch.content {
            message.content = content;
        }
        if let Some(is_loading) = patch.is_loading {
            message.is_loading = is_loading;
        }
        true
    }

    /// Delete the message with `id`. Returns false if there is none.
    pub fn remove_by_id(&mut self, id: MessageId) -> bool {
        let before = self.messages.len();
        self.messages.retain(|m| m.id != id);
        self.messages.len() != before
    }

    /// Replace the transcript with a single fresh greeting
    pub fn reset(&mut self) {
        let greeting = self.greeting.clone();
        let message = self.assistant_message(greeting);
        self.messages = vec![message];
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
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

    /// Number of messages still awaiting an answer
    pub fn loading_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_loading).count()
    }
}
