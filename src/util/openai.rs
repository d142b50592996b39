//! Client for an OpenAI-compatible chat completions endpoint.

use core::fmt;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::util::env::{EnvErr, Var};
use crate::var;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// One completion call: message list plus sampling parameters. The model id is supplied by the
/// client.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature: DEFAULT_TEMPERATURE,
            max_tokens,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequestBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponseBody {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[async_trait]
pub trait Completer: Send + Sync + fmt::Debug {
    /// Returns the text of the first choice.
    async fn complete(&self, req: &CompletionRequest) -> CompletionResult<String>;
}

/// Runs a completion and parses the answer as JSON.
///
/// Models frequently wrap JSON in a markdown code fence; a surrounding fence is stripped before
/// parsing. Nothing beyond deserialization into `T` is validated.
pub async fn complete_json<T>(completer: &dyn Completer, req: &CompletionRequest) -> CompletionResult<T>
where
    T: DeserializeOwned,
{
    let text = completer.complete(req).await?;
    Ok(serde_json::from_str(strip_code_fence(&text))?)
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // drop an optional language tag on the opening fence
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    body.trim_end().trim_end_matches("```").trim()
}

#[derive(Debug, Clone)]
pub struct CompletionClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl CompletionClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into(),
        }
    }

    pub async fn from_env() -> CompletionResult<Self> {
        Ok(Self::new(
            var!(Var::OpenAiApiKey).await?,
            var!(Var::OpenAiModel).await?,
            var!(Var::OpenAiBaseUrl).await?,
        ))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl Completer for CompletionClient {
    #[instrument(skip(self, req), fields(model = %self.model, messages = req.messages.len()))]
    async fn complete(&self, req: &CompletionRequest) -> CompletionResult<String> {
        let body = ChatRequestBody {
            model: &self.model,
            messages: &req.messages,
            temperature: req.temperature,
            max_tokens: req.max_tokens,
        };

        let res = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "completion request failed"))?;

        let status = res.status();
        if !status.is_success() {
            let message = res.text().await.unwrap_or_default();
            tracing::error!(code = %status, body = message, "non-2xx completion response");

            return Err(CompletionErr::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed = res.json::<ChatResponseBody>().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(CompletionErr::EmptyResponse)?;

        tracing::debug!(chars = content.chars().count(), "received completion");
        Ok(content)
    }
}

/// Canned completer for tests; `None` fails every call.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct FakeCompleter {
    pub reply: Option<String>,
    pub calls: std::sync::Mutex<Vec<CompletionRequest>>,
}

#[cfg(test)]
impl FakeCompleter {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Some(text.to_string()),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn last_call(&self) -> Option<CompletionRequest> {
        self.calls.lock().unwrap().last().cloned()
    }
}

#[cfg(test)]
#[async_trait]
impl Completer for FakeCompleter {
    async fn complete(&self, req: &CompletionRequest) -> CompletionResult<String> {
        self.calls.lock().unwrap().push(req.clone());
        self.reply.clone().ok_or(CompletionErr::EmptyResponse)
    }
}

pub type CompletionResult<T> = core::result::Result<T, CompletionErr>;

#[derive(Debug, Error)]
pub enum CompletionErr {
    #[error("reqwest error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion api error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("completion contained no content")]
    EmptyResponse,

    #[error("malformed json in completion: {0}")]
    Json(#[from] serde_json::Error),

    #[error("while reading environment vars: {0}")]
    EnvError(#[from] EnvErr),
}
