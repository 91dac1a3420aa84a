//! Model-service client: an OpenAI-compatible chat-completions endpoint.
//!
//! `dispatch` is a single awaited call. Transport failures and throttling
//! surface as distinct errors; only throttling is retried, with a bounded
//! jittered backoff.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use anyhow::Context;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::agent::conversation::ConversationTurn;
use crate::config::ModelConfig;

#[derive(Debug)]
pub enum ChatError {
    /// Transport failure or a non-throttling error status.
    Remote(String),
    /// The service answered 429.
    RateLimited,
    /// The service answered but the reply text is absent.
    MalformedResponse(String),
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatError::Remote(reason) => write!(f, "model service error: {reason}"),
            ChatError::RateLimited => write!(f, "model service rate limited"),
            ChatError::MalformedResponse(reason) => {
                write!(f, "model response malformed: {reason}")
            }
        }
    }
}

impl std::error::Error for ChatError {}

/// A fully assembled conversational request: system context, prior turns and
/// the fresh user turn, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub system: String,
    pub turns: Vec<ConversationTurn>,
    pub max_tokens: u32,
}

impl ChatRequest {
    /// Text of the trailing user turn; what the session records into history
    /// after a successful dispatch.
    pub fn last_user_text(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.role == crate::agent::conversation::TurnRole::User)
            .map(|t| t.text.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatResponse {
    pub text: Option<String>,
    pub finish_reason: Option<String>,
}

pub trait ModelClient: Send + Sync {
    fn dispatch<'a>(
        &'a self,
        request: ChatRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ChatResponse, ChatError>> + Send + 'a>>;
}

// Wire shapes for the OpenAI-compatible endpoint.

#[derive(Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<WireMessage>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    choices: Vec<WireChoice>,
}

#[derive(Deserialize)]
struct WireChoice {
    #[serde(default)]
    message: WireChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize, Default)]
struct WireChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_backoff: Duration::from_millis(500),
        }
    }
}

pub struct HttpModelClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    retry: RetryPolicy,
}

impl HttpModelClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn from_config(cfg: &ModelConfig, api_key: String) -> Self {
        Self::new(cfg.base_url.clone(), api_key)
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Reads the service credential from the process environment.
    pub fn api_key_from_env(var: &str) -> anyhow::Result<String> {
        std::env::var(var).with_context(|| format!("missing model credential in env var {var}"))
    }

    async fn post_once(&self, request: &ChatRequest) -> Result<ChatResponse, ChatError> {
        let mut messages = Vec::with_capacity(request.turns.len() + 1);
        messages.push(WireMessage {
            role: "system",
            content: request.system.clone(),
        });
        for turn in &request.turns {
            messages.push(WireMessage {
                role: turn.role.as_str(),
                content: turn.text.clone(),
            });
        }

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let res = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&WireRequest {
                model: request.model.clone(),
                messages,
                max_tokens: request.max_tokens,
            })
            .send()
            .await
            .map_err(|e| ChatError::Remote(format!("send: {e}")))?;

        if res.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ChatError::RateLimited);
        }
        if !res.status().is_success() {
            return Err(ChatError::Remote(format!("status {}", res.status())));
        }

        let wire: WireResponse = res
            .json()
            .await
            .map_err(|e| ChatError::MalformedResponse(format!("decode: {e}")))?;
        let choice = wire
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ChatError::MalformedResponse("no choices".to_string()))?;
        Ok(ChatResponse {
            text: choice.message.content,
            finish_reason: choice.finish_reason,
        })
    }
}

impl ModelClient for HttpModelClient {
    fn dispatch<'a>(
        &'a self,
        request: ChatRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ChatResponse, ChatError>> + Send + 'a>> {
        Box::pin(async move {
            let mut attempt = 0u32;
            loop {
                match self.post_once(&request).await {
                    Err(ChatError::RateLimited) if attempt < self.retry.max_retries => {
                        let backoff = self.retry.base_backoff * 2u32.saturating_pow(attempt);
                        let jitter =
                            Duration::from_millis(rand::rng().random_range(0..250));
                        attempt += 1;
                        tracing::warn!(attempt, "model service throttled, backing off");
                        tokio::time::sleep(backoff + jitter).await;
                    }
                    other => return other,
                }
            }
        })
    }
}
