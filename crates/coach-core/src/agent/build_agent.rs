//! Item-build agent: folds the scraped reference statistics into the prompt
//! and asks for the next purchase.

use std::fmt::Write;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use super::conversation::ConversationHistory;
use super::{CoachAgent, turns_with_prompt};
use crate::builds::{BuildDataClient, BuildDataError, BuildRecord, ItemCatalog, ItemSet};
use crate::config::ModelConfig;
use crate::game::GameStateSummary;
use crate::game::summary::{ChampionSummary, format_clock};
use crate::llm::ChatRequest;

const SYSTEM_PROMPT: &str = "You are a League of Legends coach for item builds.";

/// Game time below which component items still count toward the build.
const COMPONENT_CUTOFF_SECS: f64 = 1200.0;
/// Game time below which the early-items section is shown.
const EARLY_SECTION_CUTOFF_SECS: f64 = 600.0;

pub struct BuildAgent {
    model: String,
    max_tokens: u32,
    chat_max_tokens: u32,
    builds: Arc<BuildDataClient>,
    catalog: ItemCatalog,
    patch: String,
}

impl BuildAgent {
    pub fn new(
        model: impl Into<String>,
        builds: Arc<BuildDataClient>,
        catalog: ItemCatalog,
        patch: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            max_tokens: 512,
            chat_max_tokens: 256,
            builds,
            catalog,
            patch: patch.into(),
        }
    }

    pub fn from_config(
        cfg: &ModelConfig,
        builds: Arc<BuildDataClient>,
        catalog: ItemCatalog,
        patch: impl Into<String>,
    ) -> Self {
        Self::new(cfg.build_model.clone(), builds, catalog, patch)
    }

    /// Owned items that still matter for build decisions at this game time:
    /// consumables never, components only before the cutoff.
    fn filter_items(&self, items: &[String], game_time: f64) -> Vec<String> {
        items
            .iter()
            .filter(|item| {
                if game_time < COMPONENT_CUTOFF_SECS {
                    self.catalog.is_legendary(item) || self.catalog.is_non_consumable(item)
                } else {
                    self.catalog.is_legendary(item)
                }
            })
            .cloned()
            .collect()
    }

    /// Sections relevant to the current build progress, each truncated to
    /// its entry budget.
    fn reference_text(&self, record: &BuildRecord, game_time: f64, legendary_count: usize) -> String {
        let mut parts = Vec::new();

        if game_time < EARLY_SECTION_CUTOFF_SECS
            && let Some(section) = record.section("early_items")
        {
            let budget = max_entries("early_items", legendary_count);
            parts.push(section_text("early_items", &section.sets, budget));
        }

        for slot in 1..=legendary_count + 1 {
            let name = format!("item_{slot}");
            if let Some(section) = record.section(&name) {
                let budget = max_entries(&name, legendary_count);
                parts.push(section_text(&name, &section.sets, budget));
            }
        }

        parts.join("\n\n")
    }

    async fn reference_section(&self, summary: &GameStateSummary, owned: &[String]) -> String {
        let champion = &summary.local.champion;
        let role = lolalytics_role(&summary.local.role);
        let legendary_count = owned
            .iter()
            .filter(|i| self.catalog.is_legendary(i))
            .count();

        match self.builds.get(champion, role, &self.patch).await {
            Ok(record) => {
                let text = self.reference_text(&record, summary.game_time_secs, legendary_count);
                if text.is_empty() {
                    format!("No reference sets apply to the current build of {champion}.")
                } else {
                    text
                }
            }
            Err(BuildDataError::NotFound { .. }) => format!(
                "No reference build data exists for {champion} {role} on patch {}.",
                self.patch
            ),
            Err(err) => {
                tracing::warn!(%err, "build data lookup failed, degrading prompt");
                format!("Reference build data for {champion} is currently unavailable.")
            }
        }
    }

    /// The line-oriented game context for the item question.
    async fn summarize(&self, summary: &GameStateSummary) -> String {
        let local_champ = summary
            .allies
            .champions
            .iter()
            .find(|c| c.name == summary.local.champion);
        let owned: Vec<String> = local_champ
            .map(|c| self.filter_items(&c.items, summary.game_time_secs))
            .unwrap_or_default();

        let reference = self.reference_section(summary, &owned).await;

        let mut out = String::new();
        writeln!(out, "Here is the current state of my league of legends game:\n").unwrap();
        writeln!(out, "Game Time: {}", format_clock(summary.game_time_secs)).unwrap();
        writeln!(
            out,
            "I am playing {} {} with the following stats:",
            summary.local.champion, summary.local.role
        )
        .unwrap();
        let s = &summary.local.stats;
        writeln!(
            out,
            "HP {:.0} | Mana {:.0} | AD {:.0} | Armor {:.0} | MR {:.0} | AS {:.2} | Haste {:.0} | MS {:.0} | Gold {:.0}",
            s.health,
            s.mana,
            s.attack_damage,
            s.armor,
            s.magic_resist,
            s.attack_speed,
            s.ability_haste,
            s.move_speed,
            summary.local.gold
        )
        .unwrap();
        if let Some(champ) = local_champ {
            writeln!(out, "{}", item_line(champ, &owned)).unwrap();
        }

        writeln!(out, "\nAlly champions and their items:").unwrap();
        for champ in summary
            .allies
            .champions
            .iter()
            .filter(|c| c.name != summary.local.champion)
        {
            writeln!(out, "{}", item_line(champ, &champ.items)).unwrap();
        }
        writeln!(out, "\nEnemy champions and their items:").unwrap();
        for champ in &summary.enemies.champions {
            writeln!(out, "{}", item_line(champ, &champ.items)).unwrap();
        }

        writeln!(
            out,
            "\nHere is a reference build for {} in the {} role:",
            summary.local.champion,
            lolalytics_role(&summary.local.role)
        )
        .unwrap();
        writeln!(
            out,
            "Each item is listed with its winrate, pickrate, and number of games played."
        )
        .unwrap();
        write!(out, "{reference}").unwrap();
        out
    }
}

/// Maps a roster position to the role key the statistics source uses.
pub fn lolalytics_role(position: &str) -> &'static str {
    match position.to_ascii_uppercase().as_str() {
        "TOP" => "top",
        "JUNGLE" => "jungle",
        "MIDDLE" | "MID" => "middle",
        "BOTTOM" => "bottom",
        "UTILITY" | "SUPPORT" => "support",
        _ => "middle",
    }
}

/// Entry budget per section: slots already behind the current build show
/// little, the slot being decided shows the most.
fn max_entries(section: &str, legendary_count: usize) -> usize {
    if let Some(slot) = section
        .strip_prefix("item_")
        .and_then(|s| s.parse::<usize>().ok())
    {
        if slot + 2 <= legendary_count {
            2
        } else if slot + 1 == legendary_count {
            4
        } else if slot == legendary_count {
            6
        } else {
            10
        }
    } else if section == "boots" {
        3
    } else {
        5
    }
}

fn section_text(name: &str, sets: &[ItemSet], budget: usize) -> String {
    let title: Vec<String> = name
        .split('_')
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();
    let mut out = format!("== {} ==", title.join(" "));
    for set in sets.iter().take(budget) {
        let stat = |v: Option<f64>| v.map_or("?".to_string(), |v| format!("{v:.1}"));
        let games = set
            .games
            .map_or("?".to_string(), |g| g.to_string());
        write!(
            out,
            "\n- {} (WR: {}%, PR: {}%, {} games)",
            set.items.join(", "),
            stat(set.win_rate),
            stat(set.pick_rate),
            games
        )
        .unwrap();
    }
    out
}

fn item_line(champ: &ChampionSummary, items: &[String]) -> String {
    let items = if items.is_empty() {
        "None".to_string()
    } else {
        items.join(", ")
    };
    format!("{} (Lv {}): {}", champ.name, champ.level, items)
}

/// Pulls the curated tail out of a reply that honors the response contract.
pub fn extract_recommendation(text: &str) -> Option<String> {
    text.rsplit_once("Final recommendation:")
        .map(|(_, tail)| tail.trim().to_string())
        .filter(|tail| !tail.is_empty())
}

impl CoachAgent for BuildAgent {
    fn name(&self) -> &'static str {
        "BuildAgent"
    }

    fn build_request<'a>(
        &'a self,
        summary: &'a GameStateSummary,
        history: &'a ConversationHistory,
        user_text: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = ChatRequest> + Send + 'a>> {
        Box::pin(async move {
            let state = self.summarize(summary).await;
            let prefix = "Based on the following game state summary, what is the best next item to purchase, and briefly explain why. Think step by step.";
            let mut suffix = String::new();
            if let Some(user_text) = user_text.filter(|t| !t.trim().is_empty()) {
                suffix.push_str(user_text);
                suffix.push('\n');
            }
            suffix.push_str(
                "Your response must always end with the exact sentence: 'Final recommendation: I recommend you build <item>.' Replace <item> with the item name.\nRecommendation:",
            );
            let prompt = format!("{prefix}\n{state}\n{suffix}");

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builds::client::BuildSource;
    use crate::builds::store::BuildStore;
    use crate::builds::BuildSection;
    use crate::game::normalize;
    use crate::game::raw::RawGameState;
    use serde_json::json;
    use std::collections::BTreeSet;

    struct FixedSource {
        record: Option<BuildRecord>,
    }

    impl BuildSource for FixedSource {
        fn fetch<'a>(
            &'a self,
            champion: &'a str,
            role: &'a str,
            patch: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<BuildRecord, BuildDataError>> + Send + 'a>>
        {
            Box::pin(async move {
                self.record.clone().ok_or(BuildDataError::NotFound {
                    champion: champion.to_string(),
                    role: role.to_string(),
                    patch: patch.to_string(),
                })
            })
        }
    }

    fn catalog() -> ItemCatalog {
        let legendary: BTreeSet<String> = ["Kraken Slayer", "Runaan's Hurricane"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mut non_consumable = legendary.clone();
        non_consumable.insert("Doran's Blade".to_string());
        non_consumable.insert("B. F. Sword".to_string());
        ItemCatalog {
            legendary,
            non_consumable,
        }
    }

    fn summary() -> GameStateSummary {
        let raw: RawGameState = serde_json::from_value(json!({
            "activePlayer": {"riotIdGameName": "Coach#EUW", "currentGold": 2400.0,
                             "championStats": {"health": 1620.0, "attackDamage": 155.0}},
            "allPlayers": [
                {"championName": "Kog'Maw", "riotIdGameName": "Coach#EUW", "team": "ORDER",
                 "position": "BOTTOM", "level": 12,
                 "items": [{"displayName": "Kraken Slayer"},
                           {"displayName": "B. F. Sword"},
                           {"displayName": "Health Potion"}]},
                {"championName": "Lucian", "riotIdGameName": "Rival#EUW", "team": "CHAOS",
                 "position": "BOTTOM", "level": 12,
                 "items": [{"displayName": "The Collector"}]}
            ],
            "gameData": {"gameTime": 1000.0}
        }))
        .unwrap();
        normalize(&raw).unwrap()
    }

    fn agent_with(record: Option<BuildRecord>, dir: &std::path::Path) -> BuildAgent {
        let builds = Arc::new(BuildDataClient::new(
            BuildStore::new(dir),
            Arc::new(FixedSource { record }),
        ));
        BuildAgent::new("test-model", builds, catalog(), "15.7.1")
    }

    fn record() -> BuildRecord {
        BuildRecord {
            champion: "Kog'Maw".to_string(),
            role: "bottom".to_string(),
            patch: "15.7.1".to_string(),
            sections: vec![BuildSection {
                name: "item_2".to_string(),
                sets: vec![ItemSet {
                    items: vec!["Runaan's Hurricane".to_string()],
                    win_rate: Some(54.3),
                    pick_rate: Some(38.1),
                    games: Some(9211),
                }],
            }],
        }
    }

    #[test]
    fn item_filter_drops_consumables_and_late_components() {
        let dir = tempfile::tempdir().unwrap();
        let agent = agent_with(None, dir.path());
        let items = vec![
            "Kraken Slayer".to_string(),
            "B. F. Sword".to_string(),
            "Health Potion".to_string(),
        ];
        let early = agent.filter_items(&items, 800.0);
        assert_eq!(early, vec!["Kraken Slayer", "B. F. Sword"]);
        let late = agent.filter_items(&items, 1500.0);
        assert_eq!(late, vec!["Kraken Slayer"]);
    }

    #[test]
    fn entry_budget_peaks_at_the_next_slot() {
        assert_eq!(max_entries("item_1", 3), 2);
        assert_eq!(max_entries("item_2", 3), 4);
        assert_eq!(max_entries("item_3", 3), 6);
        assert_eq!(max_entries("item_4", 3), 10);
        assert_eq!(max_entries("boots", 3), 3);
        assert_eq!(max_entries("early_items", 0), 5);
    }

    #[tokio::test]
    async fn request_includes_reference_sets() {
        let dir = tempfile::tempdir().unwrap();
        let agent = agent_with(Some(record()), dir.path());
        let history = ConversationHistory::default();
        let request = agent.build_request(&summary(), &history, None).await;
        let prompt = &request.turns[0].text;
        assert!(prompt.contains("== Item 2 =="));
        assert!(prompt.contains("Runaan's Hurricane (WR: 54.3%, PR: 38.1%, 9211 games)"));
        assert!(prompt.contains("Final recommendation:"));
    }

    #[tokio::test]
    async fn missing_build_data_degrades_instead_of_aborting() {
        let dir = tempfile::tempdir().unwrap();
        let agent = agent_with(None, dir.path());
        let history = ConversationHistory::default();
        let request = agent.build_request(&summary(), &history, None).await;
        let prompt = &request.turns[0].text;
        assert!(prompt.contains("No reference build data exists for Kog'Maw bottom on patch 15.7.1."));
    }

    #[test]
    fn recommendation_tail_is_extracted() {
        let reply = "Lots of reasoning.\nFinal recommendation: I recommend you build Runaan's Hurricane.";
        assert_eq!(
            extract_recommendation(reply).as_deref(),
            Some("I recommend you build Runaan's Hurricane.")
        );
        assert!(extract_recommendation("no contract here").is_none());
    }
}
