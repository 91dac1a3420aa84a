//! Per-tab conversation history.
//!
//! Append-only within a session; cleared only by explicit reset or the
//! auto-reset policy. A configured turn ceiling trims oldest turns first --
//! there is no other truncation anywhere in prompt assembly.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    System,
    User,
    Assistant,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::System => "system",
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub text: String,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConversationHistory {
    turns: Vec<ConversationTurn>,
    /// Oldest turns are dropped once the history exceeds this many entries.
    max_turns: usize,
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::with_max_turns(40)
    }
}

impl ConversationHistory {
    pub fn with_max_turns(max_turns: usize) -> Self {
        Self {
            turns: Vec::new(),
            max_turns: max_turns.max(2),
        }
    }

    pub fn push(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
        while self.turns.len() > self.max_turns {
            self.turns.remove(0);
        }
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_appends_in_order() {
        let mut history = ConversationHistory::default();
        history.push(ConversationTurn::user("first"));
        history.push(ConversationTurn::assistant("second"));
        let roles: Vec<TurnRole> = history.turns().iter().map(|t| t.role).collect();
        assert_eq!(roles, vec![TurnRole::User, TurnRole::Assistant]);
    }

    #[test]
    fn ceiling_trims_oldest_first() {
        let mut history = ConversationHistory::with_max_turns(3);
        for i in 0..5 {
            history.push(ConversationTurn::user(format!("turn {i}")));
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.turns()[0].text, "turn 2");
        assert_eq!(history.turns()[2].text, "turn 4");
    }

    #[test]
    fn clear_empties_the_history() {
        let mut history = ConversationHistory::default();
        history.push(ConversationTurn::user("hello"));
        history.clear();
        assert!(history.is_empty());
    }
}
