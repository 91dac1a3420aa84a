//! Per-team turret and inhibitor board, replayed from the event log.
//!
//! The live client never reports structure state directly; it only emits
//! `TurretKilled` / `InhibKilled` / `InhibRespawned` events. The board starts
//! from the full Summoner's Rift layout and marks structures dead as events
//! arrive. Nexus turrets respawn 180 s after falling, inhibitors 300 s.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::raw::RawEvent;

const NEXUS_TURRET_RESPAWN_SECS: f64 = 180.0;
const INHIB_RESPAWN_SECS: f64 = 300.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
pub enum Lane {
    Bot,
    Mid,
    Top,
}

impl Lane {
    fn from_code(code: &str) -> Option<Self> {
        match code {
            "L0" | "Bot" => Some(Lane::Bot),
            "L1" | "Mid" => Some(Lane::Mid),
            "L2" | "Top" => Some(Lane::Top),
            _ => None,
        }
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Lane::Bot => "Bot",
            Lane::Mid => "Mid",
            Lane::Top => "Top",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
pub enum Tier {
    Outer,
    Inner,
    Inhibitor,
    Nexus1,
    Nexus2,
}

impl Tier {
    fn from_code(code: &str) -> Option<Self> {
        match code {
            "P3" | "Outer" => Some(Tier::Outer),
            "P2" | "Inner" => Some(Tier::Inner),
            "P1" | "Inhibitor" => Some(Tier::Inhibitor),
            "P4" | "Nexus1" => Some(Tier::Nexus1),
            "P5" | "Nexus2" => Some(Tier::Nexus2),
            _ => None,
        }
    }

    pub fn is_nexus(&self) -> bool {
        matches!(self, Tier::Nexus1 | Tier::Nexus2)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Tier::Outer => "Outer",
            Tier::Inner => "Inner",
            Tier::Inhibitor => "Inhibitor",
            Tier::Nexus1 => "Nexus1",
            Tier::Nexus2 => "Nexus2",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
pub enum TeamSide {
    Order,
    Chaos,
}

impl TeamSide {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ORDER" => Some(TeamSide::Order),
            "CHAOS" => Some(TeamSide::Chaos),
            _ => None,
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            TeamSide::Order => TeamSide::Chaos,
            TeamSide::Chaos => TeamSide::Order,
        }
    }

    /// The numeric team code used inside structure identifiers.
    fn code(&self) -> &'static str {
        match self {
            TeamSide::Order => "T100",
            TeamSide::Chaos => "T200",
        }
    }
}

impl fmt::Display for TeamSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TeamSide::Order => "ORDER",
            TeamSide::Chaos => "CHAOS",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    pub lane: Lane,
    pub tier: Tier,
    pub is_dead: bool,
    pub respawn_at: Option<f64>,
}

/// All turrets and inhibitors belonging to one side.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureBoard {
    pub side: TeamSide,
    /// Keyed by the truncated raw identifier, e.g. `Turret_T100_L0_P3`.
    pub turrets: BTreeMap<String, Structure>,
    pub inhibitors: BTreeMap<String, Structure>,
}

impl StructureBoard {
    pub fn new(side: TeamSide) -> Self {
        let mut turrets = BTreeMap::new();
        let lanes = [("L0", Lane::Bot), ("L1", Lane::Mid), ("L2", Lane::Top)];
        let tiers = [
            ("P3", Tier::Outer),
            ("P2", Tier::Inner),
            ("P1", Tier::Inhibitor),
            ("P4", Tier::Nexus1),
            ("P5", Tier::Nexus2),
        ];
        for (lane_code, lane) in lanes {
            for (tier_code, tier) in tiers {
                // Nexus turrets only exist behind mid.
                if tier.is_nexus() && lane != Lane::Mid {
                    continue;
                }
                let id = format!("Turret_{}_{}_{}", side.code(), lane_code, tier_code);
                turrets.insert(
                    id,
                    Structure {
                        lane,
                        tier,
                        is_dead: false,
                        respawn_at: None,
                    },
                );
            }
        }

        let mut inhibitors = BTreeMap::new();
        for (lane_code, lane) in lanes {
            let id = format!("Inhib_{}_{}_P1", side.code(), lane_code);
            inhibitors.insert(
                id,
                Structure {
                    lane,
                    tier: Tier::Inhibitor,
                    is_dead: false,
                    respawn_at: None,
                },
            );
        }

        Self {
            side,
            turrets,
            inhibitors,
        }
    }

    /// Replays the event log onto this board, then elapses respawn timers
    /// against the current game time.
    pub fn apply_events(&mut self, events: &[RawEvent], game_time: f64) {
        for event in events {
            match event.name.as_str() {
                "TurretKilled" => {
                    let Some(id) = event.turret.as_deref().and_then(truncate_structure_id) else {
                        continue;
                    };
                    if let Some(turret) = self.turrets.get_mut(&id) {
                        turret.is_dead = true;
                        if turret.tier.is_nexus() {
                            turret.respawn_at = Some(event.time + NEXUS_TURRET_RESPAWN_SECS);
                        }
                    }
                }
                "InhibKilled" => {
                    let Some(id) = event.inhib_killed.as_deref().and_then(truncate_structure_id)
                    else {
                        continue;
                    };
                    if let Some(inhib) = self.inhibitors.get_mut(&id) {
                        inhib.is_dead = true;
                        inhib.respawn_at = Some(event.time + INHIB_RESPAWN_SECS);
                    }
                }
                "InhibRespawned" => {
                    let Some(id) = event
                        .inhib_respawned
                        .as_deref()
                        .or(event.inhib_killed.as_deref())
                        .and_then(truncate_structure_id)
                    else {
                        continue;
                    };
                    if let Some(inhib) = self.inhibitors.get_mut(&id) {
                        inhib.is_dead = false;
                        inhib.respawn_at = None;
                    }
                }
                _ => {}
            }
        }

        for inhib in self.inhibitors.values_mut() {
            if inhib.is_dead && inhib.respawn_at.is_some_and(|at| game_time > at) {
                inhib.is_dead = false;
                inhib.respawn_at = None;
            }
        }
        for turret in self.turrets.values_mut() {
            if turret.is_dead
                && turret.tier.is_nexus()
                && turret.respawn_at.is_some_and(|at| game_time > at)
            {
                turret.is_dead = false;
                turret.respawn_at = None;
            }
        }
    }

    /// Dead lane turrets, grouped by lane. Every lane is present even when
    /// nothing has fallen, so callers iterate a stable set of keys.
    pub fn fallen_turrets(&self) -> BTreeMap<Lane, Vec<Tier>> {
        let mut fallen: BTreeMap<Lane, Vec<Tier>> = BTreeMap::new();
        for lane in [Lane::Bot, Lane::Mid, Lane::Top] {
            fallen.insert(lane, Vec::new());
        }
        for turret in self.turrets.values() {
            if turret.is_dead {
                fallen.entry(turret.lane).or_default().push(turret.tier);
            }
        }
        for tiers in fallen.values_mut() {
            tiers.sort();
        }
        fallen
    }

    pub fn fallen_inhibitors(&self) -> Vec<Lane> {
        let mut lanes: Vec<Lane> = self
            .inhibitors
            .values()
            .filter(|i| i.is_dead)
            .map(|i| i.lane)
            .collect();
        lanes.sort();
        lanes
    }
}

/// Event identifiers carry a trailing instance suffix
/// (`Turret_T200_L1_P2_1`); the board is keyed on the first four segments.
fn truncate_structure_id(raw: &str) -> Option<String> {
    let parts: Vec<&str> = raw.split('_').collect();
    if parts.len() < 4 {
        return None;
    }
    // Validate lane/tier codes so malformed ids are dropped rather than
    // producing keys that can never match the board.
    Lane::from_code(parts[2])?;
    Tier::from_code(parts[3])?;
    Some(parts[..4].join("_"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turret_killed(id: &str, time: f64) -> RawEvent {
        RawEvent {
            name: "TurretKilled".to_string(),
            time,
            turret: Some(id.to_string()),
            ..RawEvent::default()
        }
    }

    fn inhib_killed(id: &str, time: f64) -> RawEvent {
        RawEvent {
            name: "InhibKilled".to_string(),
            time,
            inhib_killed: Some(id.to_string()),
            ..RawEvent::default()
        }
    }

    #[test]
    fn board_has_full_rift_layout() {
        let board = StructureBoard::new(TeamSide::Order);
        // 3 lanes x 3 lane tiers + 2 nexus turrets in mid.
        assert_eq!(board.turrets.len(), 11);
        assert_eq!(board.inhibitors.len(), 3);
    }

    #[test]
    fn turret_kill_marks_board_and_groups_by_lane() {
        let mut board = StructureBoard::new(TeamSide::Chaos);
        board.apply_events(
            &[
                turret_killed("Turret_T200_L1_P2_1", 612.0),
                turret_killed("Turret_T200_L2_P3_2", 700.0),
            ],
            800.0,
        );
        let fallen = board.fallen_turrets();
        assert_eq!(fallen[&Lane::Mid], vec![Tier::Inner]);
        assert_eq!(fallen[&Lane::Top], vec![Tier::Outer]);
        assert!(fallen[&Lane::Bot].is_empty());
    }

    #[test]
    fn inhibitor_respawns_after_five_minutes() {
        let mut board = StructureBoard::new(TeamSide::Order);
        let events = vec![inhib_killed("Inhib_T100_L1_P1", 1200.0)];
        board.apply_events(&events.clone(), 1300.0);
        assert_eq!(board.fallen_inhibitors(), vec![Lane::Mid]);

        let mut board = StructureBoard::new(TeamSide::Order);
        board.apply_events(&events, 1501.0);
        assert!(board.fallen_inhibitors().is_empty());
    }

    #[test]
    fn nexus_turret_respawns_lane_turret_does_not() {
        let events = vec![
            turret_killed("Turret_T100_L1_P4_1", 1000.0),
            turret_killed("Turret_T100_L0_P3_1", 1000.0),
        ];
        let mut board = StructureBoard::new(TeamSide::Order);
        board.apply_events(&events, 1500.0);
        let fallen = board.fallen_turrets();
        // Nexus turret came back at 1180; the bot outer stays dead forever.
        assert!(fallen[&Lane::Mid].is_empty());
        assert_eq!(fallen[&Lane::Bot], vec![Tier::Outer]);
    }

    #[test]
    fn malformed_identifiers_are_ignored() {
        let mut board = StructureBoard::new(TeamSide::Order);
        board.apply_events(&[turret_killed("Turret_bogus", 10.0)], 20.0);
        assert!(board.fallen_turrets().values().all(|v| v.is_empty()));
    }
}
