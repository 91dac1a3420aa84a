//! Runtime configuration: TOML file plus one credential from the process
//! environment.
//!
//! Search order for the config file:
//! 1) `COACH_CONFIG_DIR/<relative_path>`
//! 2) `./<relative_path>`
//! 3) `<repo_root>/config/<relative_path>`

use std::env;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Env var holding the model-service credential.
pub const API_KEY_ENV: &str = "COACH_API_KEY";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub builds: BuildsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameConfig {
    /// Substitute the fixture file for the live endpoint.
    #[serde(default)]
    pub mock: bool,
    #[serde(default = "default_fixture")]
    pub fixture: String,
    #[serde(default = "default_game_endpoint")]
    pub endpoint: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            mock: false,
            fixture: default_fixture(),
            endpoint: default_game_endpoint(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_base_url")]
    pub base_url: String,
    #[serde(default = "default_macro_model")]
    pub macro_model: String,
    #[serde(default = "default_build_model")]
    pub build_model: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: default_model_base_url(),
            macro_model: default_macro_model(),
            build_model: default_build_model(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuildsConfig {
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,
    #[serde(default = "default_builds_base_url")]
    pub base_url: String,
    /// Pinned patch; unset discovers the current one at startup.
    #[serde(default)]
    pub patch: Option<String>,
    #[serde(default = "default_item_data_dir")]
    pub item_data_dir: String,
    #[serde(default = "default_versions_url")]
    pub versions_url: String,
    /// `{patch}` is substituted before fetching.
    #[serde(default = "default_item_url")]
    pub item_url: String,
}

impl Default for BuildsConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            base_url: default_builds_base_url(),
            patch: None,
            item_data_dir: default_item_data_dir(),
            versions_url: default_versions_url(),
            item_url: default_item_url(),
        }
    }
}

fn default_fixture() -> String {
    "fixtures/example_game_state.json".to_string()
}

fn default_game_endpoint() -> String {
    crate::game::fetcher::DEFAULT_LIVE_ENDPOINT.to_string()
}

fn default_model_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta/openai".to_string()
}

fn default_macro_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_build_model() -> String {
    "gemini-2.0-flash-lite".to_string()
}

fn default_cache_dir() -> String {
    "cache_builds".to_string()
}

fn default_builds_base_url() -> String {
    "https://lolalytics-proxy.local/builds".to_string()
}

fn default_item_data_dir() -> String {
    "patch_item_data".to_string()
}

fn default_versions_url() -> String {
    "https://ddragon.leagueoflegends.com/api/versions.json".to_string()
}

fn default_item_url() -> String {
    "https://ddragon.leagueoflegends.com/cdn/{patch}/data/en_US/item.json".to_string()
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn parse_from_file<T: DeserializeOwned>(relative_path: &str) -> anyhow::Result<T> {
        let path = Self::resolve_path(relative_path)?;
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        Self::parse_from_string(text)
    }

    pub fn parse_from_string<T: DeserializeOwned>(text: String) -> anyhow::Result<T> {
        toml::from_str(&text).with_context(|| "Failed to parse TOML")
    }

    fn resolve_path(relative_path: &str) -> anyhow::Result<PathBuf> {
        let rel = Path::new(relative_path);

        if let Some(root) = env::var_os("COACH_CONFIG_DIR") {
            let candidate = PathBuf::from(root).join(rel);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }

        if let Ok(cwd) = env::current_dir() {
            let candidate = cwd.join(rel);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }

        // Repo convenience: <repo_root>/config/<relative_path>.
        // This crate lives at <repo_root>/crates/coach-core.
        let candidate = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .ancestors()
            .nth(2)
            .ok_or_else(|| anyhow::anyhow!("CARGO_MANIFEST_DIR has insufficient ancestors"))?
            .join("config")
            .join(rel);
        if candidate.is_file() {
            return Ok(candidate);
        }

        anyhow::bail!("Config file not found for {:?}", rel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_gets_all_defaults() {
        let cfg: Config = ConfigLoader::parse_from_string(String::new()).unwrap();
        assert!(!cfg.game.mock);
        assert_eq!(cfg.game.endpoint, crate::game::fetcher::DEFAULT_LIVE_ENDPOINT);
        assert_eq!(cfg.model.macro_model, "gemini-2.0-flash");
        assert!(cfg.builds.patch.is_none());
    }

    #[test]
    fn partial_sections_override_only_what_they_name() {
        let text = "[game]\nmock = true\n\n[builds]\npatch = \"15.7.1\"\n".to_string();
        let cfg: Config = ConfigLoader::parse_from_string(text).unwrap();
        assert!(cfg.game.mock);
        assert_eq!(cfg.game.fixture, "fixtures/example_game_state.json");
        assert_eq!(cfg.builds.patch.as_deref(), Some("15.7.1"));
    }
}
