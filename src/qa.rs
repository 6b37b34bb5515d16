use crate::config::Config;
use crate::error::AskError;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::time::Duration;

/// GraphQL operation sent with every prompt: one string in, one string out.
pub const ASK_QUERY: &str = "query Ask($prompt: String!) { ask(prompt: $prompt) }";

/// Answer used when the reply parses but carries no answer text.
pub const NO_VALID_REPLY: &str = "Sorry, I did not receive a valid reply.";

/// The external question-answering capability.
#[async_trait]
pub trait AskBackend: Send + Sync {
    /// Send one prompt and return the answer text.
    async fn ask(&self, prompt: &str) -> Result<String, AskError>;
}

/// Request envelope posted to the endpoint
#[derive(Debug, Clone, Serialize)]
pub struct AskRequest<'a> {
    pub query: &'static str,
    pub variables: AskVariables<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AskVariables<'a> {
    pub prompt: &'a str,
}

impl<'a> AskRequest<'a> {
    pub fn new(prompt: &'a str) -> Self {
        Self {
            query: ASK_QUERY,
            variables: AskVariables { prompt },
        }
    }
}

/// HTTP client for the Q&A endpoint
#[derive(Clone)]
pub struct QaClient {
    endpoint: String,
    answer_paths: Vec<String>,
    client: reqwest::Client,
}

impl QaClient {
    pub fn new(config: &Config) -> Result<Self, AskError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            endpoint: config.endpoint.clone(),
            answer_paths: config.answer_paths.clone(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AskBackend for QaClient {
    async fn ask(&self, prompt: &str) -> Result<String, AskError> {
        tracing::debug!(endpoint = %self.endpoint, prompt_len = prompt.len(), "sending prompt");

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&AskRequest::new(prompt))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(%status, "endpoint returned an error status");
            let server_message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|value| server_error_message(&value));
            return Err(AskError::status(status, server_message));
        }

        let payload: Value = serde_json::from_str(&body)?;
        let answer = extract_answer(&payload, &self.answer_paths)?;
        tracing::debug!(%status, answer_len = answer.len(), "received answer");
        Ok(answer)
    }
}

/// Pull the answer text out of a successful reply.
///
/// The first configured path holding a string wins. A reply with no answer but a
/// GraphQL error becomes a failure; anything else falls back to [`NO_VALID_REPLY`].
pub fn extract_answer(payload: &Value, paths: &[String]) -> Result<String, AskError> {
    for path in paths {
        if let Some(text) = lookup(payload, path).and_then(Value::as_str) {
            return Ok(text.to_string());
        }
    }

    if let Some(message) = server_error_message(payload) {
        return Err(AskError::Server(message));
    }

    Ok(NO_VALID_REPLY.to_string())
}

/// Best-effort error message from an error body: `error.message`, then `errors[0].message`.
pub fn server_error_message(payload: &Value) -> Option<String> {
    lookup(payload, "error.message")
        .or_else(|| lookup(payload, "errors.0.message"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Walk a dotted path; numeric segments index into arrays.
fn lookup<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(value, |current, segment| match current {
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            Value::Object(map) => map.get(segment),
            _ => None,
        })
}
