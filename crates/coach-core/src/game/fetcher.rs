//! Fetches the raw game document from the live-client endpoint or a fixture.
//!
//! One attempt per call; the caller decides whether to re-invoke. The source
//! is an explicit constructor argument, never a process-wide toggle.

use std::fmt;
use std::path::PathBuf;

use super::raw::RawGameState;
use crate::config::GameConfig;

/// Local live-client endpoint. Serves a self-signed certificate.
pub const DEFAULT_LIVE_ENDPOINT: &str = "https://127.0.0.1:2999/liveclientdata/allgamedata";

#[derive(Debug)]
pub enum FetchError {
    /// Endpoint unreachable, or no match is currently active.
    Unavailable(String),
    /// The endpoint answered but the payload did not decode.
    Parse(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Unavailable(reason) => write!(f, "game state unavailable: {reason}"),
            FetchError::Parse(reason) => write!(f, "game state payload malformed: {reason}"),
        }
    }
}

impl std::error::Error for FetchError {}

#[derive(Debug, Clone)]
pub enum GameStateSource {
    Live { endpoint: String },
    Mock { fixture: PathBuf },
}

#[derive(Debug)]
pub struct GameStateFetcher {
    source: GameStateSource,
    http: reqwest::Client,
}

impl GameStateFetcher {
    pub fn new(source: GameStateSource) -> Self {
        // The live client serves a self-signed certificate on localhost.
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .build()
            .unwrap_or_default();
        Self { source, http }
    }

    pub fn from_config(cfg: &GameConfig) -> Self {
        let source = if cfg.mock {
            GameStateSource::Mock {
                fixture: PathBuf::from(&cfg.fixture),
            }
        } else {
            GameStateSource::Live {
                endpoint: cfg.endpoint.clone(),
            }
        };
        Self::new(source)
    }

    pub async fn fetch(&self) -> Result<RawGameState, FetchError> {
        match &self.source {
            GameStateSource::Live { endpoint } => self.fetch_live(endpoint).await,
            GameStateSource::Mock { fixture } => {
                tracing::debug!(fixture = %fixture.display(), "loading mock game state");
                let text = std::fs::read_to_string(fixture)
                    .map_err(|e| FetchError::Unavailable(format!("fixture read: {e}")))?;
                decode(&text)
            }
        }
    }

    async fn fetch_live(&self, endpoint: &str) -> Result<RawGameState, FetchError> {
        tracing::debug!(%endpoint, "fetching live game state");
        let res = self
            .http
            .get(endpoint)
            .send()
            .await
            .map_err(|e| FetchError::Unavailable(format!("connect: {e}")))?;
        if !res.status().is_success() {
            // The client answers 404 between games.
            return Err(FetchError::Unavailable(format!(
                "endpoint returned {}",
                res.status()
            )));
        }
        let text = res
            .text()
            .await
            .map_err(|e| FetchError::Unavailable(format!("read body: {e}")))?;
        decode(&text)
    }
}

fn decode(text: &str) -> Result<RawGameState, FetchError> {
    serde_json::from_str(text).map_err(|e| FetchError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn mock_source_is_deterministic() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"allPlayers": [{{"championName": "Annie", "team": "ORDER"}}],
                "gameData": {{"gameTime": 42.0}}}}"#
        )
        .unwrap();
        let fetcher = GameStateFetcher::new(GameStateSource::Mock {
            fixture: file.path().to_path_buf(),
        });
        let first = fetcher.fetch().await.unwrap();
        let second = fetcher.fetch().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.game_data.game_time, 42.0);
    }

    #[tokio::test]
    async fn missing_fixture_is_unavailable() {
        let fetcher = GameStateFetcher::new(GameStateSource::Mock {
            fixture: PathBuf::from("/nonexistent/fixture.json"),
        });
        match fetcher.fetch().await {
            Err(FetchError::Unavailable(_)) => {}
            other => panic!("expected Unavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_fixture_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let fetcher = GameStateFetcher::new(GameStateSource::Mock {
            fixture: file.path().to_path_buf(),
        });
        match fetcher.fetch().await {
            Err(FetchError::Parse(_)) => {}
            other => panic!("expected Parse, got {other:?}"),
        }
    }
}
