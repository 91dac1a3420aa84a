//! Epic-monster ledger, replayed from the event log.
//!
//! Tracks dragon/baron/herald kills with team attribution, respawn windows
//! and buff expiries. Respawn windows: dragon 300 s, elder 360 s, baron
//! 420 s; herald never respawns. A team's fourth dragon ends dragon
//! respawns for the map. Baron grants a 180 s buff, elder a 150 s buff.

use std::collections::BTreeMap;

use super::raw::RawEvent;

const DRAGON_RESPAWN_SECS: f64 = 300.0;
const ELDER_RESPAWN_SECS: f64 = 360.0;
const BARON_RESPAWN_SECS: f64 = 420.0;
const HERALD_RESPAWN_SECS: f64 = 360.0;
const BARON_BUFF_SECS: f64 = 180.0;
const ELDER_BUFF_SECS: f64 = 150.0;
const DRAGONS_TO_SOUL: u32 = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct MonsterKill {
    /// `Dragon`, `Baron` or `Herald`.
    pub name: &'static str,
    /// Dragon element for dragon kills (`Infernal`, `Elder`, ...).
    pub kind: Option<String>,
    pub killed_at: f64,
    /// Team name the kill is attributed to; falls back to the raw killer
    /// string when the killer is not in the roster.
    pub team: Option<String>,
    pub spawn_time: f64,
    pub respawn_at: Option<f64>,
    pub respawnable: bool,
    /// 1-based kill ordinal per monster name.
    pub ordinal: u32,
    pub buff_expires_at: Option<f64>,
}

impl MonsterKill {
    pub fn is_elder(&self) -> bool {
        self.kind.as_deref().is_some_and(|k| k.eq_ignore_ascii_case("elder"))
    }

    /// Display label for aggregate counts, e.g. `Infernal Dragon`.
    pub fn label(&self) -> String {
        match self.kind.as_deref() {
            Some(kind) if !kind.is_empty() => format!("{kind} {}", self.name),
            _ => self.name.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonsterLedger {
    pub kills: Vec<MonsterKill>,
}

impl MonsterLedger {
    /// Replays kill events in log order. `riot_id_to_team` maps roster riot
    /// ids to team names for attribution.
    pub fn from_events(events: &[RawEvent], riot_id_to_team: &BTreeMap<String, String>) -> Self {
        struct Spec {
            event: &'static str,
            name: &'static str,
            respawn: f64,
            respawnable: bool,
        }
        let specs = [
            Spec {
                event: "DragonKill",
                name: "Dragon",
                respawn: DRAGON_RESPAWN_SECS,
                respawnable: true,
            },
            Spec {
                event: "BaronKill",
                name: "Baron",
                respawn: BARON_RESPAWN_SECS,
                respawnable: true,
            },
            Spec {
                event: "HeraldKill",
                name: "Herald",
                respawn: HERALD_RESPAWN_SECS,
                respawnable: false,
            },
        ];

        let mut kills = Vec::new();
        let mut counters: BTreeMap<&str, u32> = BTreeMap::new();
        let mut last_respawn: BTreeMap<&str, Option<f64>> = BTreeMap::new();
        let mut dragons_per_team: BTreeMap<String, u32> = BTreeMap::new();

        for event in events {
            let Some(spec) = specs.iter().find(|s| s.event == event.name) else {
                continue;
            };

            let team = event
                .killer
                .as_deref()
                .and_then(|k| riot_id_to_team.get(k).cloned())
                .or_else(|| event.killer.clone());

            let ordinal = {
                let c = counters.entry(spec.name).or_insert(1);
                let current = *c;
                *c += 1;
                current
            };
            let spawn_time = last_respawn
                .get(spec.name)
                .copied()
                .flatten()
                .unwrap_or(0.0);

            let mut respawnable = spec.respawnable;
            let mut buff_expires_at = None;
            let respawn_at;

            if spec.name == "Dragon" {
                let team_key = team.clone().unwrap_or_default();
                let taken = dragons_per_team.entry(team_key).or_insert(0);
                *taken += 1;
                // The team's soul dragon: nothing respawns after it.
                if *taken == DRAGONS_TO_SOUL {
                    respawnable = false;
                }
                let is_elder = event
                    .dragon_type
                    .as_deref()
                    .is_some_and(|k| k.eq_ignore_ascii_case("elder"));
                if is_elder {
                    respawn_at = respawnable.then(|| event.time + ELDER_RESPAWN_SECS);
                    buff_expires_at = Some(event.time + ELDER_BUFF_SECS);
                } else {
                    respawn_at = respawnable.then(|| event.time + spec.respawn);
                }
            } else {
                respawn_at = respawnable.then(|| event.time + spec.respawn);
                if spec.name == "Baron" {
                    buff_expires_at = Some(event.time + BARON_BUFF_SECS);
                }
            }

            last_respawn.insert(spec.name, respawn_at);
            kills.push(MonsterKill {
                name: spec.name,
                kind: event.dragon_type.clone().filter(|k| !k.is_empty()),
                killed_at: event.time,
                team,
                spawn_time,
                respawn_at,
                respawnable,
                ordinal,
                buff_expires_at,
            });
        }

        Self { kills }
    }

    pub fn latest(&self, name: &str) -> Option<&MonsterKill> {
        self.kills
            .iter()
            .filter(|k| k.name == name)
            .max_by(|a, b| a.killed_at.total_cmp(&b.killed_at))
    }

    pub fn taken_by_team<'a>(&'a self, team: &str) -> impl Iterator<Item = &'a MonsterKill> {
        self.kills
            .iter()
            .filter(move |k| k.team.as_deref() == Some(team))
    }

    /// Aggregate kill counts for one team, keyed by display label.
    pub fn counts_for_team(&self, team: &str) -> BTreeMap<String, u32> {
        let mut counts = BTreeMap::new();
        for kill in self.taken_by_team(team) {
            *counts.entry(kill.label()).or_insert(0) += 1;
        }
        counts
    }

    /// Freshest baron-buff expiry for one team, if any kill granted one.
    pub fn baron_buff_expiry(&self, team: &str) -> Option<f64> {
        self.taken_by_team(team)
            .filter(|k| k.name == "Baron")
            .filter_map(|k| k.buff_expires_at)
            .max_by(f64::total_cmp)
    }

    /// Freshest elder-buff expiry for one team, if any kill granted one.
    pub fn elder_buff_expiry(&self, team: &str) -> Option<f64> {
        self.taken_by_team(team)
            .filter(|k| k.name == "Dragon" && k.is_elder())
            .filter_map(|k| k.buff_expires_at)
            .max_by(f64::total_cmp)
    }
}
