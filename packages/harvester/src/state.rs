//! Persisted harvest state.
//!
//! The state file remembers when the last *completed* harvest started, so
//! the next run only asks the source for records changed since then.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestState {
    /// Start time of the last harvest that finished without push failures.
    #[serde(default)]
    pub last_successful_harvest: Option<DateTime<Utc>>,
}

impl HarvestState {
    /// Load the state file. A missing or empty file is an empty state.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no state file, starting a full harvest");
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml_ng::from_str(&contents)?)
    }

    /// Write the state atomically: to a sibling temp file, then rename.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, serde_yaml_ng::to_string(self)?)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Record a completed harvest that started at `started_at`.
    pub fn mark_success(&mut self, started_at: DateTime<Utc>) {
        self.last_successful_harvest = Some(started_at);
    }
}
