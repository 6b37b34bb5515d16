use reqwest::StatusCode;
use thiserror::Error;

/// Everything that can go wrong between sending a prompt and holding an answer.
///
/// The `Display` text is what ends up in the error banner, so each variant
/// renders as a sentence a user can act on.
#[derive(Debug, Error)]
pub enum AskError {
    /// The endpoint answered with a non-success status.
    #[error("{message}")]
    Status { status: StatusCode, message: String },

    /// Connection, timeout or body read failure.
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A success status whose body is not JSON.
    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The endpoint reported an error inside an otherwise successful reply.
    #[error("{0}")]
    Server(String),
}

impl AskError {
    /// Build a status error, preferring the message the server supplied.
    pub fn status(status: StatusCode, server_message: Option<String>) -> Self {
        let message = server_message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("request failed: status {}", status.as_u16()));
        AskError::Status { status, message }
    }
}
