//! Macro-strategy agent: renders the whole-map picture and asks for
//! objective/rotation guidance.

use std::fmt::Write;
use std::future::Future;
use std::pin::Pin;

use super::conversation::ConversationHistory;
use super::{CoachAgent, turns_with_prompt};
use crate::config::ModelConfig;
use crate::game::GameStateSummary;
use crate::game::summary::{ChampionSummary, TeamSummary, format_clock};
use crate::llm::ChatRequest;

const SYSTEM_PROMPT: &str = "You are a macro-level coach for a League of Legends game.";

pub struct MacroAgent {
    model: String,
    max_tokens: u32,
    chat_max_tokens: u32,
}

impl MacroAgent {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            max_tokens: 1024,
            chat_max_tokens: 256,
        }
    }

    pub fn from_config(cfg: &ModelConfig) -> Self {
        Self::new(cfg.macro_model.clone())
    }

    /// Flattens the summary into the line-oriented text the model sees.
    pub fn summarize(&self, summary: &GameStateSummary) -> String {
        let mut out = String::new();
        let now = summary.game_time_secs;

        writeln!(out, "Game Time: {}", format_clock(now)).unwrap();

        // A side's fallen turrets are the ones the other side took.
        writeln!(
            out,
            "Turrets Fallen - Ours: {}",
            lane_turret_counts(&summary.enemies)
        )
        .unwrap();
        writeln!(
            out,
            "Turrets Fallen - Enemy: {}",
            lane_turret_counts(&summary.allies)
        )
        .unwrap();
        writeln!(
            out,
            "Nexus Turrets Taken - Ours: {} | Enemy: {}",
            summary.allies.nexus_turrets_taken, summary.enemies.nexus_turrets_taken
        )
        .unwrap();
        writeln!(
            out,
            "Inhibitors Taken - Ours: {} | Enemy: {}",
            lane_list(&summary.allies.inhibs_taken),
            lane_list(&summary.enemies.inhibs_taken)
        )
        .unwrap();
        writeln!(out, "Jungle Control - Ours: {}", monster_counts(&summary.allies)).unwrap();
        writeln!(out, "Jungle Control - Enemy: {}", monster_counts(&summary.enemies)).unwrap();

        if let Some(line) = buff_line(
            "Baron",
            summary.allies.baron_buff_expires_at,
            summary.enemies.baron_buff_expires_at,
            now,
        ) {
            writeln!(out, "{line}").unwrap();
        }
        if let Some(line) = buff_line(
            "Elder",
            summary.allies.elder_buff_expires_at,
            summary.enemies.elder_buff_expires_at,
            now,
        ) {
            writeln!(out, "{line}").unwrap();
        }

        let timers: Vec<String> = [
            ("Dragon", summary.objectives.dragon_respawn),
            ("Herald", summary.objectives.herald_respawn),
            ("Baron", summary.objectives.baron_respawn),
        ]
        .iter()
        .filter_map(|(label, at)| {
            at.filter(|at| *at > now)
                .map(|at| format!("{label} at {}", format_clock(at)))
        })
        .collect();
        writeln!(
            out,
            "Next Objectives: {}",
            if timers.is_empty() {
                "None".to_string()
            } else {
                timers.join(", ")
            }
        )
        .unwrap();

        writeln!(out, "\nOurs:").unwrap();
        for champ in &summary.allies.champions {
            writeln!(out, "{}", player_line(champ)).unwrap();
        }
        writeln!(out, "\nEnemy:").unwrap();
        for champ in &summary.enemies.champions {
            writeln!(out, "{}", player_line(champ)).unwrap();
        }

        out.trim_end().to_string()
    }
}

fn lane_turret_counts(team: &TeamSummary) -> String {
    let parts: Vec<String> = team
        .turrets_taken
        .iter()
        .filter(|(_, tiers)| !tiers.is_empty())
        .map(|(lane, tiers)| format!("{lane} {}", tiers.len()))
        .collect();
    if parts.is_empty() {
        "None".to_string()
    } else {
        parts.join(", ")
    }
}

fn lane_list(lanes: &[crate::game::structures::Lane]) -> String {
    if lanes.is_empty() {
        return "None".to_string();
    }
    lanes
        .iter()
        .map(|l| l.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn monster_counts(team: &TeamSummary) -> String {
    if team.monster_counts.is_empty() {
        return "None".to_string();
    }
    team.monster_counts
        .iter()
        .map(|(name, count)| format!("{name} x{count}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// A buff line is shown only while at least one side's buff is live.
fn buff_line(label: &str, ours: Option<f64>, enemy: Option<f64>, now: f64) -> Option<String> {
    let live = |t: Option<f64>| t.filter(|t| *t > now);
    let (ours, enemy) = (live(ours), live(enemy));
    if ours.is_none() && enemy.is_none() {
        return None;
    }
    let show = |t: Option<f64>| t.map_or("None".to_string(), format_clock);
    Some(format!(
        "{label} Buff - Ours: {} | Enemy: {}",
        show(ours),
        show(enemy)
    ))
}

fn player_line(champ: &ChampionSummary) -> String {
    let role = if champ.role.is_empty() {
        "?"
    } else {
        champ.role.as_str()
    };
    let status = match champ.respawn_in {
        Some(t) if champ.is_dead => format!("Respawning in {}", format_clock(t)),
        _ if champ.is_dead => "Dead".to_string(),
        _ => "Alive".to_string(),
    };
    let items = if champ.items.is_empty() {
        "None".to_string()
    } else {
        champ.items.join(", ")
    };
    format!(
        "[{role}] {} (Lv {}) | {}/{}/{} | {status} | {items}",
        champ.name, champ.level, champ.score.kills, champ.score.deaths, champ.score.assists
    )
}

impl CoachAgent for MacroAgent {
    fn name(&self) -> &'static str {
        "MacroAgent"
    }

    fn build_request<'a>(
        &'a self,
        summary: &'a GameStateSummary,
        history: &'a ConversationHistory,
        user_text: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = ChatRequest> + Send + 'a>> {
        Box::pin(async move {
            let state = self.summarize(summary);
            let mut prompt = format!(
                "Based on the following game state summary, provide a concise macro strategy recommendation:\n\n{state}\n\n"
            );
            if let Some(user_text) = user_text.filter(|t| !t.trim().is_empty()) {
                prompt.push_str(user_text);
                prompt.push('\n');
            }
            prompt.push_str("Recommendation:");

            ChatRequest {
                model: self.model.clone(),
                system: SYSTEM_PROMPT.to_string(),
                turns: turns_with_prompt(history, prompt),
                max_tokens: self.max_tokens,
            }
        })
    }

    fn chat_request(&self, history: &ConversationHistory, user_text: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            system: SYSTEM_PROMPT.to_string(),
            turns: turns_with_prompt(history, user_text.to_string()),
            max_tokens: self.chat_max_tokens,
        }
    }
}
