//! On-disk key-value store for build records.
//!
//! One JSON file per (champion, role, patch) key; the filename is the key.
//! The only invalidation signal is the patch: saving a record removes files
//! for the same champion/role under any other patch (latest-patch-wins).

use std::fs;
use std::path::{Path, PathBuf};

use super::{BuildDataError, BuildRecord};

#[derive(Debug, Clone)]
pub struct BuildStore {
    dir: PathBuf,
}

/// Lowercases and strips apostrophes/whitespace so champion names like
/// `Kog'Maw` produce stable filenames.
pub fn sanitize(part: &str) -> String {
    part.chars()
        .filter(|c| !c.is_whitespace() && *c != '\'')
        .flat_map(|c| c.to_lowercase())
        .collect()
}

impl BuildStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn file_name(champion: &str, role: &str, patch: &str) -> String {
        format!(
            "{}_{}_{}.json",
            sanitize(champion),
            sanitize(role),
            sanitize(patch)
        )
    }

    fn path_for(&self, champion: &str, role: &str, patch: &str) -> PathBuf {
        self.dir.join(Self::file_name(champion, role, patch))
    }

    pub fn load(
        &self,
        champion: &str,
        role: &str,
        patch: &str,
    ) -> Result<Option<BuildRecord>, BuildDataError> {
        let path = self.path_for(champion, role, patch);
        if !path.is_file() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path)
            .map_err(|e| BuildDataError::Store(format!("read {}: {e}", path.display())))?;
        let record = serde_json::from_str(&text)
            .map_err(|e| BuildDataError::Store(format!("decode {}: {e}", path.display())))?;
        Ok(Some(record))
    }

    pub fn save(&self, record: &BuildRecord) -> Result<(), BuildDataError> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| BuildDataError::Store(format!("create {}: {e}", self.dir.display())))?;
        let path = self.path_for(&record.champion, &record.role, &record.patch);
        let text = serde_json::to_string_pretty(record)
            .map_err(|e| BuildDataError::Store(format!("encode: {e}")))?;
        fs::write(&path, text)
            .map_err(|e| BuildDataError::Store(format!("write {}: {e}", path.display())))?;
        self.remove_other_patches(&record.champion, &record.role, &record.patch)?;
        Ok(())
    }

    /// Latest-patch-wins: drops records for the same champion/role cached
    /// under any other patch.
    fn remove_other_patches(
        &self,
        champion: &str,
        role: &str,
        patch: &str,
    ) -> Result<(), BuildDataError> {
        let keep = Self::file_name(champion, role, patch);
        let prefix = format!("{}_{}_", sanitize(champion), sanitize(role));
        let entries = fs::read_dir(&self.dir)
            .map_err(|e| BuildDataError::Store(format!("scan {}: {e}", self.dir.display())))?;
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.starts_with(&prefix) && name.ends_with(".json") && name != keep {
                tracing::debug!(stale = name, "removing stale build record");
                let _ = fs::remove_file(entry.path());
            }
        }
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
