//! Reference build data: externally sourced item statistics per
//! champion/role/patch, cached on disk.

pub mod catalog;
pub mod client;
pub mod store;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use catalog::ItemCatalog;
pub use client::{BuildDataClient, BuildSource, HttpBuildSource};
pub use store::BuildStore;

#[derive(Debug)]
pub enum BuildDataError {
    /// The source has no data for this champion/role/patch.
    NotFound {
        champion: String,
        role: String,
        patch: String,
    },
    Remote(String),
    Store(String),
}

impl fmt::Display for BuildDataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildDataError::NotFound {
                champion,
                role,
                patch,
            } => write!(f, "no build data for {champion} {role} on patch {patch}"),
            BuildDataError::Remote(reason) => write!(f, "build source error: {reason}"),
            BuildDataError::Store(reason) => write!(f, "build cache error: {reason}"),
        }
    }
}

impl std::error::Error for BuildDataError {}

/// One item combination with its observed statistics.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ItemSet {
    pub items: Vec<String>,
    pub win_rate: Option<f64>,
    pub pick_rate: Option<f64>,
    pub games: Option<u64>,
}

/// A named slice of the build listing (`early_items`, `item_1`, ...).
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct BuildSection {
    pub name: String,
    pub sets: Vec<ItemSet>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct BuildRecord {
    pub champion: String,
    pub role: String,
    pub patch: String,
    pub sections: Vec<BuildSection>,
}

impl BuildRecord {
    pub fn section(&self, name: &str) -> Option<&BuildSection> {
        self.sections.iter().find(|s| s.name == name)
    }
}
