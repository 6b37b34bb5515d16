//! Terminal UI components

pub mod conversation;
