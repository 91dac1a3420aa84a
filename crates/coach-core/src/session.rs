//! Session surface the front-end drives: two agent tabs, each with its own
//! history, an auto-reset flag and an at-most-one-in-flight gate.
//!
//! A second trigger while a tab's dispatch is in flight is rejected, not
//! queued. Tabs never share state; the build-data cache is the only resource
//! shared across invocations and lives behind its own locks.

use std::fmt;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::agent::CoachAgent;
use crate::agent::conversation::{ConversationHistory, ConversationTurn};
use crate::game::fetcher::FetchError;
use crate::game::summary::SchemaError;
use crate::game::{GameStateFetcher, normalize};
use crate::llm::{ChatError, ModelClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabKind {
    Macro,
    Build,
}

impl fmt::Display for TabKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TabKind::Macro => write!(f, "Macro"),
            TabKind::Build => write!(f, "Build"),
        }
    }
}

#[derive(Debug)]
pub enum SessionError {
    /// A dispatch is already in flight for this tab.
    Busy,
    Fetch(FetchError),
    Schema(SchemaError),
    Chat(ChatError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Busy => write!(f, "a request is already in flight for this tab"),
            SessionError::Fetch(e) => write!(f, "{e}"),
            SessionError::Schema(e) => write!(f, "{e}"),
            SessionError::Chat(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<FetchError> for SessionError {
    fn from(e: FetchError) -> Self {
        SessionError::Fetch(e)
    }
}

impl From<SchemaError> for SessionError {
    fn from(e: SchemaError) -> Self {
        SessionError::Schema(e)
    }
}

impl From<ChatError> for SessionError {
    fn from(e: ChatError) -> Self {
        SessionError::Chat(e)
    }
}

/// What one successful action produced: the prompt that was recorded as the
/// user turn and the model's reply text.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReply {
    pub prompt: String,
    pub text: String,
}

struct TabState {
    history: ConversationHistory,
    auto_reset: bool,
}

struct Tab {
    agent: Box<dyn CoachAgent>,
    state: Mutex<TabState>,
}

impl Tab {
    fn new(agent: Box<dyn CoachAgent>) -> Self {
        Self {
            agent,
            state: Mutex::new(TabState {
                history: ConversationHistory::default(),
                auto_reset: false,
            }),
        }
    }
}

pub struct CoachSession {
    fetcher: GameStateFetcher,
    model: Arc<dyn ModelClient>,
    macro_tab: Tab,
    build_tab: Tab,
}

impl CoachSession {
    pub fn new(
        fetcher: GameStateFetcher,
        model: Arc<dyn ModelClient>,
        macro_agent: Box<dyn CoachAgent>,
        build_agent: Box<dyn CoachAgent>,
    ) -> Self {
        Self {
            fetcher,
            model,
            macro_tab: Tab::new(macro_agent),
            build_tab: Tab::new(build_agent),
        }
    }

    fn tab(&self, kind: TabKind) -> &Tab {
        match kind {
            TabKind::Macro => &self.macro_tab,
            TabKind::Build => &self.build_tab,
        }
    }

    /// Fetch, normalize, dispatch, record. Errors abort the action and leave
    /// the tab's history untouched.
    pub async fn update(
        &self,
        kind: TabKind,
        user_text: Option<&str>,
    ) -> Result<SessionReply, SessionError> {
        let tab = self.tab(kind);
        let mut state = tab.state.try_lock().map_err(|_| SessionError::Busy)?;

        let raw = self.fetcher.fetch().await?;
        let summary = normalize(&raw)?;
        let request = tab
            .agent
            .build_request(&summary, &state.history, user_text)
            .await;
        let prompt = request.last_user_text().unwrap_or_default().to_string();

        tracing::debug!(tab = %kind, turns = request.turns.len(), "dispatching update");
        let response = self.model.dispatch(request).await?;
        let text = tab.agent.parse_response(&response)?;

        state.history.push(ConversationTurn::user(prompt.clone()));
        state.history.push(ConversationTurn::assistant(text.clone()));
        if state.auto_reset {
            state.history.clear();
        }
        Ok(SessionReply { prompt, text })
    }

    /// Free-form chat turn against the tab's history; no game-state fetch.
    pub async fn send(&self, kind: TabKind, text: &str) -> Result<SessionReply, SessionError> {
        let tab = self.tab(kind);
        let mut state = tab.state.try_lock().map_err(|_| SessionError::Busy)?;

        let request = tab.agent.chat_request(&state.history, text);
        let prompt = request.last_user_text().unwrap_or_default().to_string();

        tracing::debug!(tab = %kind, "dispatching chat turn");
        let response = self.model.dispatch(request).await?;
        let reply = tab.agent.parse_response(&response)?;

        state.history.push(ConversationTurn::user(prompt.clone()));
        state.history.push(ConversationTurn::assistant(reply.clone()));
        Ok(SessionReply {
            prompt,
            text: reply,
        })
    }

    /// Clears the named tab's history; the other tab is untouched.
    pub async fn reset(&self, kind: TabKind) {
        self.tab(kind).state.lock().await.history.clear();
    }

    pub async fn set_auto_reset(&self, kind: TabKind, enabled: bool) {
        self.tab(kind).state.lock().await.auto_reset = enabled;
    }

    pub async fn history_len(&self, kind: TabKind) -> usize {
        self.tab(kind).state.lock().await.history.len()
    }
}
