//! Backup and restore records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::catalog::NewLocation;
use super::item::Item;

/// How restored records interact with existing ones sharing a natural key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RestoreMode {
    /// Update in place when present, insert otherwise.
    #[default]
    Merge,
    /// Delete the existing record, then insert.
    Replace,
}

impl std::fmt::Display for RestoreMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RestoreMode::Merge => write!(f, "merge"),
            RestoreMode::Replace => write!(f, "replace"),
        }
    }
}

/// A backend-neutral snapshot of items and reference data.
///
/// Backend ids are not included; a backup taken from one backend restores
/// into the other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backup {
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub items: Vec<Item>,
    /// Type names.
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub locations: Vec<NewLocation>,
}

/// Records written by a restore, per aggregate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreReport {
    pub items: usize,
    pub types: usize,
    pub locations: usize,
}

impl RestoreReport {
    pub fn total(&self) -> usize {
        self.items + self.types + self.locations
    }
}
