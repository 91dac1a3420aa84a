//! Normalization of a raw game document into a stable, agent-consumable
//! summary.
//!
//! `normalize` is a pure function: no clocks, no network, no hidden state.
//! The same raw document always produces the same summary (aggregate maps
//! are `BTreeMap` so iteration order is stable). Optional fields substitute
//! defaults; only the structural requirements (a non-empty roster and an
//! active-player block) can fail it.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::monsters::MonsterLedger;
use super::raw::{RawGameState, RawPlayer, RawRunes};
use super::structures::{Lane, StructureBoard, TeamSide, Tier};

/// Position assigned when the roster does not carry one (practice tool).
const DEFAULT_ROLE: &str = "MIDDLE";

const HERALD_DEFAULT_RESPAWN: f64 = 900.0;
const HERALD_WINDOW_CLOSES: f64 = 1500.0;
const DRAGON_DEFAULT_RESPAWN: f64 = 300.0;
const BARON_DEFAULT_RESPAWN: f64 = 1500.0;

/// A structurally required field of the raw document is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    pub field: String,
}

impl SchemaError {
    pub fn missing(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "game data missing required field: {}", self.field)
    }
}

impl std::error::Error for SchemaError {}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq)]
pub struct ScoreLine {
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub creep_score: u32,
    pub ward_score: f64,
}

impl ScoreLine {
    pub fn kda(&self) -> f64 {
        (self.kills + self.assists) as f64 / self.deaths.max(1) as f64
    }
}

impl fmt::Display for ScoreLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{} ({:.1})",
            self.kills,
            self.deaths,
            self.assists,
            self.kda()
        )
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq)]
pub struct StatsSummary {
    pub health: f64,
    pub mana: f64,
    pub armor: f64,
    pub magic_resist: f64,
    pub attack_damage: f64,
    pub attack_speed: f64,
    pub ability_haste: f64,
    pub move_speed: f64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct RuneSummary {
    pub keystone: Option<String>,
    pub primary: Option<String>,
    pub secondary: Option<String>,
}

impl RuneSummary {
    fn from_raw(raw: &RawRunes) -> Self {
        let name = |r: &Option<super::raw::RawRune>| {
            r.as_ref()
                .map(|r| r.display_name.clone())
                .filter(|n| !n.is_empty())
        };
        Self {
            keystone: name(&raw.keystone),
            primary: name(&raw.primary_rune_tree),
            secondary: name(&raw.secondary_rune_tree),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ChampionSummary {
    pub name: String,
    /// Assigned position string (`TOP`, `JUNGLE`, ...); empty when unknown.
    pub role: String,
    pub level: u32,
    pub score: ScoreLine,
    pub is_bot: bool,
    pub is_dead: bool,
    pub respawn_in: Option<f64>,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TeamSummary {
    pub side: TeamSide,
    pub champions: Vec<ChampionSummary>,
    /// Enemy structures this team has destroyed, grouped by lane.
    pub turrets_taken: BTreeMap<Lane, Vec<Tier>>,
    pub nexus_turrets_taken: u32,
    pub inhibs_taken: Vec<Lane>,
    pub kills: u32,
    /// Epic monsters taken, keyed by display label (`Infernal Dragon`).
    pub monster_counts: BTreeMap<String, u32>,
    pub baron_buff_expires_at: Option<f64>,
    pub elder_buff_expires_at: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LocalPlayer {
    pub summoner_name: String,
    pub riot_id: String,
    pub champion: String,
    pub role: String,
    pub side: TeamSide,
    pub gold: f64,
    pub stats: StatsSummary,
    pub runes: Option<RuneSummary>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ObjectiveTimers {
    pub dragon_respawn: Option<f64>,
    pub herald_respawn: Option<f64>,
    pub baron_respawn: Option<f64>,
    /// Dragon element shown once the soul threshold is in sight.
    pub dragon_type: Option<String>,
}

impl ObjectiveTimers {
    fn from_ledger(ledger: &MonsterLedger, game_time: f64) -> Self {
        let latest_dragon = ledger.latest("Dragon");
        let dragon_respawn = latest_dragon
            .and_then(|k| k.respawn_at)
            .or(Some(DRAGON_DEFAULT_RESPAWN));
        let dragon_type = latest_dragon
            .filter(|k| k.ordinal > 3)
            .and_then(|k| k.kind.clone());

        let herald_respawn = ledger
            .latest("Herald")
            .and_then(|k| k.respawn_at)
            .or_else(|| (game_time < HERALD_WINDOW_CLOSES).then_some(HERALD_DEFAULT_RESPAWN));

        let baron_respawn = ledger
            .latest("Baron")
            .and_then(|k| k.respawn_at)
            .or(Some(BARON_DEFAULT_RESPAWN));

        Self {
            dragon_respawn,
            herald_respawn,
            baron_respawn,
            dragon_type,
        }
    }
}

/// Immutable snapshot derived from exactly one raw document.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct GameStateSummary {
    pub game_time_secs: f64,
    pub local: LocalPlayer,
    pub allies: TeamSummary,
    pub enemies: TeamSummary,
    pub objectives: ObjectiveTimers,
    /// Enemy champion sharing the local player's lane, if any.
    pub enemy_laner: Option<String>,
}

/// Renders seconds as `M:SS` game-clock time.
pub fn format_clock(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

pub fn normalize(raw: &RawGameState) -> Result<GameStateSummary, SchemaError> {
    let players: Vec<&RawPlayer> = raw
        .all_players
        .iter()
        .filter(|p| !p.champion_name.is_empty())
        .collect();
    if players.is_empty() {
        return Err(SchemaError::missing("allPlayers"));
    }
    let active = raw
        .active_player
        .as_ref()
        .ok_or_else(|| SchemaError::missing("activePlayer"))?;

    let game_time = raw.game_data.game_time;

    let riot_to_team: BTreeMap<String, String> = players
        .iter()
        .filter(|p| !p.riot_id_game_name.is_empty() && !p.team.is_empty())
        .map(|p| (p.riot_id_game_name.clone(), p.team.clone()))
        .collect();

    // If the active player's riot id does not match any roster entry, fall
    // back to the first entry rather than failing the snapshot.
    let local_idx = players
        .iter()
        .position(|p| p.riot_id_game_name == active.riot_id_game_name)
        .unwrap_or(0);
    let local_raw = players[local_idx];

    let ally_side = TeamSide::from_name(&local_raw.team).unwrap_or(TeamSide::Order);
    let enemy_side = ally_side.opposite();

    let events = &raw.events.events;
    let mut ally_board = StructureBoard::new(ally_side);
    let mut enemy_board = StructureBoard::new(enemy_side);
    ally_board.apply_events(events, game_time);
    enemy_board.apply_events(events, game_time);

    let ledger = MonsterLedger::from_events(events, &riot_to_team);

    let role = if local_raw.position.is_empty() {
        DEFAULT_ROLE.to_string()
    } else {
        local_raw.position.clone()
    };

    let enemy_laner = players
        .iter()
        .find(|p| p.team != local_raw.team && !p.position.is_empty() && p.position == role)
        .map(|p| p.champion_name.clone());

    let allies = summarize_team(ally_side, &players, &enemy_board, &ledger);
    let enemies = summarize_team(enemy_side, &players, &ally_board, &ledger);

    let objectives = ObjectiveTimers::from_ledger(&ledger, game_time);

    Ok(GameStateSummary {
        game_time_secs: game_time,
        local: LocalPlayer {
            summoner_name: active.summoner_name.clone(),
            riot_id: active.riot_id_game_name.clone(),
            champion: local_raw.champion_name.clone(),
            role,
            side: ally_side,
            gold: active.current_gold,
            stats: StatsSummary {
                health: active.champion_stats.health,
                mana: active.champion_stats.mana,
                armor: active.champion_stats.armor,
                magic_resist: active.champion_stats.magic_resist,
                attack_damage: active.champion_stats.attack_damage,
                attack_speed: active.champion_stats.attack_speed,
                ability_haste: active.champion_stats.ability_haste,
                move_speed: active.champion_stats.move_speed,
            },
            runes: active.full_runes.as_ref().map(RuneSummary::from_raw),
        },
        allies,
        enemies,
        objectives,
        enemy_laner,
    })
}

fn summarize_team(
    side: TeamSide,
    players: &[&RawPlayer],
    enemy_board: &StructureBoard,
    ledger: &MonsterLedger,
) -> TeamSummary {
    let side_name = side.to_string();
    let champions: Vec<ChampionSummary> = players
        .iter()
        .filter(|p| p.team == side_name)
        .map(|p| ChampionSummary {
            name: p.champion_name.clone(),
            role: p.position.clone(),
            level: p.level,
            score: ScoreLine {
                kills: p.scores.kills,
                deaths: p.scores.deaths,
                assists: p.scores.assists,
                creep_score: p.scores.creep_score,
                ward_score: p.scores.ward_score,
            },
            is_bot: p.is_bot,
            is_dead: p.is_dead,
            respawn_in: (p.is_dead && p.respawn_timer > 0.0).then_some(p.respawn_timer),
            items: p
                .items
                .iter()
                .map(|i| i.display_name.trim_matches('"').to_string())
                .collect(),
        })
        .collect();

    // What this team took is what fell on the other side's board.
    let turrets_taken = enemy_board.fallen_turrets();
    let nexus_turrets_taken = turrets_taken
        .values()
        .flatten()
        .filter(|t| t.is_nexus())
        .count() as u32;
    let inhibs_taken = enemy_board.fallen_inhibitors();
    let kills = champions.iter().map(|c| c.score.kills).sum();

    TeamSummary {
        side,
        champions,
        turrets_taken,
        nexus_turrets_taken,
        inhibs_taken,
        kills,
        monster_counts: ledger.counts_for_team(&side_name),
        baron_buff_expires_at: ledger.baron_buff_expiry(&side_name),
        elder_buff_expires_at: ledger.elder_buff_expiry(&side_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixture() -> RawGameState {
        serde_json::from_value(json!({
            "activePlayer": {
                "summonerName": "Coach",
                "riotIdGameName": "Coach#EUW",
                "currentGold": 1350.0,
                "championStats": {"health": 1450.0, "attackDamage": 142.0}
            },
            "allPlayers": [
                {"championName": "Kog'Maw", "riotIdGameName": "Coach#EUW", "team": "ORDER",
                 "position": "BOTTOM", "level": 11,
                 "items": [{"displayName": "Doran's Blade"}],
                 "scores": {"kills": 4, "deaths": 1, "assists": 3}},
                {"championName": "Lucian", "riotIdGameName": "Rival#EUW", "team": "CHAOS",
                 "position": "BOTTOM", "level": 10,
                 "scores": {"kills": 2, "deaths": 4, "assists": 1}}
            ],
            "events": {"Events": [
                {"EventID": 1, "EventName": "TurretKilled", "EventTime": 640.0,
                 "TurretKilled": "Turret_T200_L0_P3_1", "KillerName": "Coach#EUW"},
                {"EventID": 2, "EventName": "DragonKill", "EventTime": 700.0,
                 "DragonType": "Infernal", "KillerName": "Coach#EUW"}
            ]},
            "gameData": {"gameTime": 812.0, "mapName": "Map11"}
        }))
        .unwrap()
    }

    #[test]
    fn normalize_is_deterministic() {
        let raw = fixture();
        assert_eq!(normalize(&raw).unwrap(), normalize(&raw).unwrap());
    }

    #[test]
    fn normalize_fills_documented_defaults() {
        let raw: RawGameState = serde_json::from_value(json!({
            "activePlayer": {"riotIdGameName": "Solo#NA"},
            "allPlayers": [{"championName": "Annie", "riotIdGameName": "Solo#NA", "team": "ORDER"}]
        }))
        .unwrap();
        let summary = normalize(&raw).unwrap();
        assert_eq!(summary.local.role, "MIDDLE");
        assert_eq!(summary.local.gold, 0.0);
        assert_eq!(summary.game_time_secs, 0.0);
        assert_eq!(summary.objectives.dragon_respawn, Some(300.0));
        assert_eq!(summary.objectives.herald_respawn, Some(900.0));
        assert_eq!(summary.objectives.baron_respawn, Some(1500.0));
        assert!(summary.enemy_laner.is_none());
    }

    #[test]
    fn normalize_rejects_missing_roster() {
        let raw: RawGameState =
            serde_json::from_value(json!({"activePlayer": {"riotIdGameName": "x"}})).unwrap();
        let err = normalize(&raw).unwrap_err();
        assert_eq!(err.field, "allPlayers");
    }

    #[test]
    fn normalize_rejects_missing_active_player() {
        let raw: RawGameState = serde_json::from_value(json!({
            "allPlayers": [{"championName": "Annie", "team": "ORDER"}]
        }))
        .unwrap();
        let err = normalize(&raw).unwrap_err();
        assert_eq!(err.field, "activePlayer");
    }

    #[test]
    fn turret_and_monster_attribution_lands_on_the_taking_team() {
        let summary = normalize(&fixture()).unwrap();
        assert_eq!(summary.allies.turrets_taken[&Lane::Bot], vec![Tier::Outer]);
        assert!(summary.enemies.turrets_taken.values().all(|v| v.is_empty()));
        assert_eq!(summary.allies.monster_counts["Infernal Dragon"], 1);
        assert!(summary.enemies.monster_counts.is_empty());
        assert_eq!(summary.objectives.dragon_respawn, Some(1000.0));
    }

    #[test]
    fn enemy_laner_matches_on_shared_position() {
        let summary = normalize(&fixture()).unwrap();
        assert_eq!(summary.enemy_laner.as_deref(), Some("Lucian"));
        assert_eq!(summary.local.champion, "Kog'Maw");
        assert_eq!(summary.allies.kills, 4);
        assert_eq!(summary.enemies.kills, 2);
    }

    #[test]
    fn format_clock_renders_game_time() {
        assert_eq!(format_clock(812.0), "13:32");
        assert_eq!(format_clock(59.9), "0:59");
    }
}
