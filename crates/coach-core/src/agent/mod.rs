//! Agent contracts: turning a game summary plus conversation history into a
//! model request, and a model response back into display text.

pub mod build_agent;
pub mod conversation;
pub mod macro_agent;

use std::future::Future;
use std::pin::Pin;

use crate::game::GameStateSummary;
use crate::llm::{ChatError, ChatRequest, ChatResponse};
use conversation::ConversationHistory;

pub use build_agent::{BuildAgent, extract_recommendation};
pub use conversation::{ConversationTurn, TurnRole};
pub use macro_agent::MacroAgent;

pub trait CoachAgent: Send + Sync {
    fn name(&self) -> &'static str;

    /// Deterministic request assembly from a fresh summary: system context,
    /// the entire prior history, then the new user turn. The build agent
    /// consults its reference data here, so the boundary is async.
    fn build_request<'a>(
        &'a self,
        summary: &'a GameStateSummary,
        history: &'a ConversationHistory,
        user_text: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = ChatRequest> + Send + 'a>>;

    /// Free-form chat turn: no fresh summary, history plus user text only.
    fn chat_request(&self, history: &ConversationHistory, user_text: &str) -> ChatRequest;

    /// Extracts display text from the model reply.
    fn parse_response(&self, response: &ChatResponse) -> Result<String, ChatError> {
        match response.text.as_deref() {
            Some(text) if !text.trim().is_empty() => Ok(text.to_string()),
            Some(_) => Err(ChatError::MalformedResponse("empty reply text".to_string())),
            None => Err(ChatError::MalformedResponse(
                "reply text field absent".to_string(),
            )),
        }
    }
}

/// History turns followed by the fresh user prompt, ready for dispatch.
pub(crate) fn turns_with_prompt(
    history: &ConversationHistory,
    prompt: String,
) -> Vec<ConversationTurn> {
    let mut turns: Vec<ConversationTurn> = history.turns().to_vec();
    turns.push(ConversationTurn::user(prompt));
    turns
}
