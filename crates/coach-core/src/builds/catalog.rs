//! Per-patch item catalog from the static data CDN.
//!
//! Classifies the raw item sheet into the two sets the build agent filters
//! with: completed ("legendary") items and purchasable non-consumables.
//! The sheet is cached on disk per patch.

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use super::BuildDataError;
use crate::config::BuildsConfig;

/// Summoner's Rift map id in the static item sheet.
pub const RIFT_MAP_ID: u32 = 11;

const CHEAP_STARTER_GOLD: u64 = 1500;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemCatalog {
    /// Completed items: purchasable, on-map, build into nothing further,
    /// not consumable, and not a flat cheap starter.
    pub legendary: BTreeSet<String>,
    /// Purchasable non-consumable items, components included.
    pub non_consumable: BTreeSet<String>,
}

impl ItemCatalog {
    pub fn from_item_sheet(sheet: &serde_json::Value, map_id: u32) -> Self {
        let mut legendary = BTreeSet::new();
        let mut non_consumable = BTreeSet::new();

        let Some(data) = sheet.get("data").and_then(|d| d.as_object()) else {
            return Self::default();
        };

        let null = serde_json::Value::Null;
        for item in data.values() {
            let Some(name) = item.get("name").and_then(|n| n.as_str()) else {
                continue;
            };
            let gold = item.get("gold").unwrap_or(&null);
            let purchasable = gold
                .get("purchasable")
                .and_then(|p| p.as_bool())
                .unwrap_or(false);
            let on_map = item
                .get("maps")
                .and_then(|m| m.get(map_id.to_string()))
                .and_then(|v| v.as_bool())
                .unwrap_or(false);
            let tags: Vec<&str> = item
                .get("tags")
                .and_then(|t| t.as_array())
                .map(|t| t.iter().filter_map(|v| v.as_str()).collect())
                .unwrap_or_default();
            let consumable_like = tags.contains(&"Consumable") || tags.contains(&"Trinket");

            if !purchasable || !on_map || consumable_like {
                continue;
            }
            non_consumable.insert(name.to_string());

            // Legendary: terminal in the build tree and not a cheap starter
            // whose total equals its base cost.
            if item.get("into").is_some() {
                continue;
            }
            let total = gold.get("total").and_then(|v| v.as_u64()).unwrap_or(0);
            let base = gold.get("base").and_then(|v| v.as_u64()).unwrap_or(0);
            if total == base && total < CHEAP_STARTER_GOLD {
                continue;
            }
            legendary.insert(name.to_string());
        }

        Self {
            legendary,
            non_consumable,
        }
    }

    pub fn is_legendary(&self, item: &str) -> bool {
        self.legendary.contains(item)
    }

    pub fn is_non_consumable(&self, item: &str) -> bool {
        self.non_consumable.contains(item)
    }
}

/// Downloads and caches the static item sheet, and discovers the current
/// patch from the versions listing.
pub struct ItemCatalogClient {
    http: reqwest::Client,
    versions_url: String,
    item_url: String,
    cache_dir: PathBuf,
}

impl ItemCatalogClient {
    pub fn from_config(cfg: &BuildsConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            versions_url: cfg.versions_url.clone(),
            item_url: cfg.item_url.clone(),
            cache_dir: PathBuf::from(&cfg.item_data_dir),
        }
    }

    /// First entry of the versions listing.
    pub async fn current_patch(&self) -> Result<String, BuildDataError> {
        let versions: Vec<String> = self
            .http
            .get(&self.versions_url)
            .send()
            .await
            .map_err(|e| BuildDataError::Remote(format!("versions: {e}")))?
            .json()
            .await
            .map_err(|e| BuildDataError::Remote(format!("versions decode: {e}")))?;
        versions
            .into_iter()
            .next()
            .ok_or_else(|| BuildDataError::Remote("empty versions listing".to_string()))
    }

    /// The item sheet for one patch, from disk when cached.
    pub async fn item_sheet(&self, patch: &str) -> Result<serde_json::Value, BuildDataError> {
        let path = self.cache_dir.join(format!("items_{patch}.json"));
        if path.is_file() {
            let text = fs::read_to_string(&path)
                .map_err(|e| BuildDataError::Store(format!("read {}: {e}", path.display())))?;
            return serde_json::from_str(&text)
                .map_err(|e| BuildDataError::Store(format!("decode {}: {e}", path.display())));
        }

        let url = self.item_url.replace("{patch}", patch);
        tracing::debug!(%url, "downloading item sheet");
        let sheet: serde_json::Value = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| BuildDataError::Remote(format!("items: {e}")))?
            .json()
            .await
            .map_err(|e| BuildDataError::Remote(format!("items decode: {e}")))?;

        fs::create_dir_all(&self.cache_dir).map_err(|e| {
            BuildDataError::Store(format!("create {}: {e}", self.cache_dir.display()))
        })?;
        let text = serde_json::to_string(&sheet)
            .map_err(|e| BuildDataError::Store(format!("encode: {e}")))?;
        fs::write(&path, text)
            .map_err(|e| BuildDataError::Store(format!("write {}: {e}", path.display())))?;
        Ok(sheet)
    }

    /// Catalog for one patch; `patch = None` discovers the current one.
    pub async fn catalog(&self, patch: Option<&str>) -> Result<(String, ItemCatalog), BuildDataError> {
        let patch = match patch {
            Some(p) => p.to_string(),
            None => self.current_patch().await?,
        };
        let sheet = self.item_sheet(&patch).await?;
        Ok((patch.clone(), ItemCatalog::from_item_sheet(&sheet, RIFT_MAP_ID)))
    }
}
