//! Serde model of the live-client game document.
//!
//! The schema is owned by the game client, not by us: every field that can be
//! absent defaults instead of failing deserialization. Structural requirements
//! (a player roster, an active-player block) are enforced by `normalize`, not
//! here.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawGameState {
    #[serde(default)]
    pub active_player: Option<RawActivePlayer>,
    #[serde(default)]
    pub all_players: Vec<RawPlayer>,
    #[serde(default)]
    pub events: RawEvents,
    #[serde(default)]
    pub game_data: RawGameData,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawActivePlayer {
    #[serde(default)]
    pub summoner_name: String,
    #[serde(default)]
    pub riot_id_game_name: String,
    #[serde(default)]
    pub current_gold: f64,
    #[serde(default)]
    pub champion_stats: RawChampionStats,
    #[serde(default)]
    pub full_runes: Option<RawRunes>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawChampionStats {
    #[serde(default)]
    pub health: f64,
    #[serde(default)]
    pub mana: f64,
    #[serde(default)]
    pub armor: f64,
    #[serde(default)]
    pub magic_resist: f64,
    #[serde(default)]
    pub attack_damage: f64,
    #[serde(default)]
    pub attack_speed: f64,
    #[serde(default)]
    pub ability_haste: f64,
    #[serde(default)]
    pub move_speed: f64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawPlayer {
    #[serde(default)]
    pub champion_name: String,
    #[serde(default)]
    pub summoner_name: String,
    #[serde(default)]
    pub riot_id_game_name: String,
    /// `ORDER` or `CHAOS`.
    #[serde(default)]
    pub team: String,
    /// Assigned position; empty in practice-tool games.
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub is_dead: bool,
    #[serde(default)]
    pub respawn_timer: f64,
    #[serde(default)]
    pub items: Vec<RawItem>,
    #[serde(default)]
    pub scores: RawScores,
    #[serde(default)]
    pub summoner_spells: Option<RawSummonerSpells>,
    #[serde(default)]
    pub runes: Option<RawRunes>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawItem {
    #[serde(default)]
    pub display_name: String,
    #[serde(rename = "itemID", default)]
    pub item_id: u32,
    #[serde(default)]
    pub slot: u32,
    #[serde(default = "default_item_count")]
    pub count: u32,
    #[serde(default)]
    pub price: u32,
    #[serde(default)]
    pub consumable: bool,
    #[serde(default)]
    pub can_use: bool,
}

fn default_item_count() -> u32 {
    1
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawScores {
    #[serde(default)]
    pub kills: u32,
    #[serde(default)]
    pub deaths: u32,
    #[serde(default)]
    pub assists: u32,
    #[serde(default)]
    pub creep_score: u32,
    #[serde(default)]
    pub ward_score: f64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawSummonerSpells {
    #[serde(default)]
    pub summoner_spell_one: RawSpell,
    #[serde(default)]
    pub summoner_spell_two: RawSpell,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawSpell {
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawRunes {
    #[serde(default)]
    pub keystone: Option<RawRune>,
    #[serde(default)]
    pub primary_rune_tree: Option<RawRune>,
    #[serde(default)]
    pub secondary_rune_tree: Option<RawRune>,
    #[serde(default)]
    pub general_runes: Vec<RawRune>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawRune {
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct RawEvents {
    #[serde(rename = "Events", default)]
    pub events: Vec<RawEvent>,
}

/// One entry of the event log. Field presence depends on the event kind, so
/// everything beyond id/name/time is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct RawEvent {
    #[serde(rename = "EventID", default)]
    pub id: u32,
    #[serde(rename = "EventName", default)]
    pub name: String,
    #[serde(rename = "EventTime", default)]
    pub time: f64,
    #[serde(rename = "DragonType", default)]
    pub dragon_type: Option<String>,
    #[serde(rename = "KillerName", default)]
    pub killer: Option<String>,
    #[serde(rename = "VictimName", default)]
    pub victim: Option<String>,
    #[serde(rename = "Assisters", default)]
    pub assisters: Vec<String>,
    #[serde(rename = "TurretKilled", default)]
    pub turret: Option<String>,
    #[serde(rename = "InhibKilled", default)]
    pub inhib_killed: Option<String>,
    #[serde(rename = "InhibRespawned", default)]
    pub inhib_respawned: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawGameData {
    #[serde(default)]
    pub game_time: f64,
    #[serde(default)]
    pub map_name: String,
    #[serde(default)]
    pub game_mode: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_with_all_optional_fields_missing() {
        let raw: RawGameState = serde_json::from_str("{}").unwrap();
        assert!(raw.active_player.is_none());
        assert!(raw.all_players.is_empty());
        assert!(raw.events.events.is_empty());
        assert_eq!(raw.game_data.game_time, 0.0);
    }

    #[test]
    fn decodes_event_specific_fields() {
        let doc = r#"{
            "events": {"Events": [
                {"EventID": 3, "EventName": "TurretKilled", "EventTime": 612.5,
                 "TurretKilled": "Turret_T200_L1_P2_1", "KillerName": "Coach#EUW"}
            ]}
        }"#;
        let raw: RawGameState = serde_json::from_str(doc).unwrap();
        let ev = &raw.events.events[0];
        assert_eq!(ev.name, "TurretKilled");
        assert_eq!(ev.turret.as_deref(), Some("Turret_T200_L1_P2_1"));
        assert!(ev.inhib_killed.is_none());
    }
}
