//! End-to-end pipeline over the shipped fixture: fetch -> normalize ->
//! prompt assembly -> dispatch -> history bookkeeping.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use rift_coach_core::agent::conversation::ConversationHistory;
use rift_coach_core::agent::{CoachAgent, MacroAgent};
use rift_coach_core::game::fetcher::{GameStateFetcher, GameStateSource};
use rift_coach_core::game::normalize;
use rift_coach_core::game::structures::Lane;
use rift_coach_core::llm::{ChatError, ChatRequest, ChatResponse, ModelClient};
use rift_coach_core::session::{CoachSession, TabKind};

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../fixtures/example_game_state.json")
}

fn fetcher() -> GameStateFetcher {
    GameStateFetcher::new(GameStateSource::Mock {
        fixture: fixture_path(),
    })
}

struct CannedModel;

impl ModelClient for CannedModel {
    fn dispatch<'a>(
        &'a self,
        _request: ChatRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ChatResponse, ChatError>> + Send + 'a>> {
        Box::pin(async move {
            Ok(ChatResponse {
                text: Some("Group bot, take the second dragon on spawn.".to_string()),
                finish_reason: Some("stop".to_string()),
            })
        })
    }
}

#[tokio::test]
async fn fixture_normalizes_to_the_recorded_board_state() {
    let raw = fetcher().fetch().await.unwrap();
    let summary = normalize(&raw).unwrap();

    assert_eq!(summary.local.champion, "Kog'Maw");
    assert_eq!(summary.local.role, "BOTTOM");
    assert_eq!(summary.enemy_laner.as_deref(), Some("Lucian"));

    // Two bot-lane turrets taken by ORDER, one mid turret by CHAOS.
    assert_eq!(summary.allies.turrets_taken[&Lane::Bot].len(), 2);
    assert_eq!(summary.enemies.turrets_taken[&Lane::Mid].len(), 1);
    assert_eq!(summary.allies.monster_counts["Infernal Dragon"], 1);
    assert_eq!(summary.enemies.monster_counts["Herald"], 1);
    assert_eq!(summary.allies.kills, 9);
    assert_eq!(summary.enemies.kills, 7);
    // Dragon fell at 880, so the next one spawns at 1180.
    assert_eq!(summary.objectives.dragon_respawn, Some(1180.0));
}

#[tokio::test]
async fn macro_request_carries_the_fixture_counts_verbatim() {
    let raw = fetcher().fetch().await.unwrap();
    let summary = normalize(&raw).unwrap();

    let agent = MacroAgent::new("test-model");
    let history = ConversationHistory::default();
    let request = agent.build_request(&summary, &history, None).await;
    let prompt = &request.turns[0].text;

    assert!(prompt.contains("Game Time: 18:25"));
    assert!(prompt.contains("Turrets Fallen - Enemy: Bot 2"));
    assert!(prompt.contains("Turrets Fallen - Ours: Mid 1"));
    assert!(prompt.contains("Nexus Turrets Taken - Ours: 0 | Enemy: 0"));
    assert!(prompt.contains("Jungle Control - Ours: Infernal Dragon x1"));
    assert!(prompt.contains("Jungle Control - Enemy: Herald x1"));
    assert!(prompt.contains("Next Objectives: Dragon at 19:40, Baron at 25:00"));
    assert!(prompt.contains("[JUNGLE] Vi (Lv 11) | 3/4/6 | Respawning in 0:18"));
}

#[tokio::test]
async fn session_update_round_trips_through_the_model() {
    let session = CoachSession::new(
        fetcher(),
        Arc::new(CannedModel),
        Box::new(MacroAgent::new("test-model")),
        Box::new(MacroAgent::new("test-model")),
    );

    let reply = session.update(TabKind::Macro, None).await.unwrap();
    assert!(reply.prompt.contains("Turrets Fallen - Enemy: Bot 2"));
    assert_eq!(reply.text, "Group bot, take the second dragon on spawn.");
    assert_eq!(session.history_len(TabKind::Macro).await, 2);
    assert_eq!(session.history_len(TabKind::Build).await, 0);
}
