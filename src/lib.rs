//! Terminal chat client for a remote question-answering endpoint.

pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod qa;
pub mod ui;

pub use error::AskError;
pub use qa::{AskBackend, QaClient};
