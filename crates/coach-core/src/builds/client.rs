//! Build-data client: disk cache in front of the external statistics source.
//!
//! Concurrent `get`s for the same (champion, role, patch) key are serialized
//! by a per-key lock so the source is hit at most once per key; different
//! keys never contend.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::Mutex;

use super::store::{BuildStore, sanitize};
use super::{BuildDataError, BuildRecord};
use crate::config::BuildsConfig;

pub trait BuildSource: Send + Sync {
    fn fetch<'a>(
        &'a self,
        champion: &'a str,
        role: &'a str,
        patch: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<BuildRecord, BuildDataError>> + Send + 'a>>;
}

/// Fetches the build listing as JSON from the statistics service.
pub struct HttpBuildSource {
    http: reqwest::Client,
    base_url: String,
}

impl HttpBuildSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

impl BuildSource for HttpBuildSource {
    fn fetch<'a>(
        &'a self,
        champion: &'a str,
        role: &'a str,
        patch: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<BuildRecord, BuildDataError>> + Send + 'a>> {
        Box::pin(async move {
            let url = format!(
                "{}/{}/{}?patch={}",
                self.base_url.trim_end_matches('/'),
                sanitize(champion),
                sanitize(role),
                patch
            );
            tracing::debug!(%url, "fetching build listing");
            let res = self
                .http
                .get(&url)
                .send()
                .await
                .map_err(|e| BuildDataError::Remote(format!("send: {e}")))?;
            if res.status() == reqwest::StatusCode::NOT_FOUND {
                return Err(BuildDataError::NotFound {
                    champion: champion.to_string(),
                    role: role.to_string(),
                    patch: patch.to_string(),
                });
            }
            if !res.status().is_success() {
                return Err(BuildDataError::Remote(format!("status {}", res.status())));
            }
            let sections = res
                .json()
                .await
                .map_err(|e| BuildDataError::Remote(format!("decode: {e}")))?;
            Ok(BuildRecord {
                champion: champion.to_string(),
                role: role.to_string(),
                patch: patch.to_string(),
                sections,
            })
        })
    }
}

pub struct BuildDataClient {
    store: BuildStore,
    source: Arc<dyn BuildSource>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl BuildDataClient {
    pub fn new(store: BuildStore, source: Arc<dyn BuildSource>) -> Self {
        Self {
            store,
            source,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(cfg: &BuildsConfig) -> Self {
        Self::new(
            BuildStore::new(cfg.cache_dir.clone()),
            Arc::new(HttpBuildSource::new(cfg.base_url.clone())),
        )
    }

    async fn key_lock(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Cached record if present under this exact key, fresh fetch otherwise.
    pub async fn get(
        &self,
        champion: &str,
        role: &str,
        patch: &str,
    ) -> Result<BuildRecord, BuildDataError> {
        let key = format!(
            "{}_{}_{}",
            sanitize(champion),
            sanitize(role),
            sanitize(patch)
        );
        let lock = self.key_lock(&key).await;
        let _guard = lock.lock().await;

        if let Some(record) = self.store.load(champion, role, patch)? {
            tracing::debug!(%key, "build record cache hit");
            return Ok(record);
        }

        let record = self.source.fetch(champion, role, patch).await?;
        self.store.save(&record)?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    struct FakeSource {
        fetches: AtomicU32,
        delay: Duration,
        found: bool,
    }

    impl FakeSource {
        fn new(found: bool) -> Self {
            Self {
                fetches: AtomicU32::new(0),
                delay: Duration::ZERO,
                found,
            }
        }

        fn fetch_count(&self) -> u32 {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    impl BuildSource for FakeSource {
        fn fetch<'a>(
            &'a self,
            champion: &'a str,
            role: &'a str,
            patch: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<BuildRecord, BuildDataError>> + Send + 'a>>
        {
            Box::pin(async move {
                self.fetches.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(self.delay).await;
                if !self.found {
                    return Err(BuildDataError::NotFound {
                        champion: champion.to_string(),
                        role: role.to_string(),
                        patch: patch.to_string(),
                    });
                }
                Ok(BuildRecord {
                    champion: champion.to_string(),
                    role: role.to_string(),
                    patch: patch.to_string(),
                    sections: Vec::new(),
                })
            })
        }
    }

    fn client_with(source: Arc<FakeSource>, dir: &std::path::Path) -> BuildDataClient {
        BuildDataClient::new(BuildStore::new(dir), source)
    }

    #[tokio::test]
    async fn second_get_hits_the_cache() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(FakeSource::new(true));
        let client = client_with(source.clone(), dir.path());

        let first = client.get("Kog'Maw", "bottom", "15.7.1").await.unwrap();
        let second = client.get("Kog'Maw", "bottom", "15.7.1").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn patch_change_forces_a_fresh_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(FakeSource::new(true));
        let client = client_with(source.clone(), dir.path());

        client.get("Lucian", "bottom", "15.7.1").await.unwrap();
        client.get("Lucian", "bottom", "15.8.1").await.unwrap();
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn concurrent_gets_for_one_key_fetch_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = FakeSource::new(true);
        source.delay = Duration::from_millis(30);
        let source = Arc::new(source);
        let client = Arc::new(client_with(source.clone(), dir.path()));

        let a = {
            let client = client.clone();
            tokio::spawn(async move { client.get("Jinx", "bottom", "15.7.1").await })
        };
        let b = {
            let client = client.clone();
            tokio::spawn(async move { client.get("Jinx", "bottom", "15.7.1").await })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn not_found_propagates_and_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(FakeSource::new(false));
        let client = client_with(source.clone(), dir.path());

        for _ in 0..2 {
            match client.get("Zilean", "support", "15.7.1").await {
                Err(BuildDataError::NotFound { champion, .. }) => {
                    assert_eq!(champion, "Zilean");
                }
                other => panic!("expected NotFound, got {other:?}"),
            }
        }
        assert_eq!(source.fetch_count(), 2);
    }
}
