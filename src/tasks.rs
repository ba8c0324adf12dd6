//! Task list loading.
//!
//! The task file names the items to watch for one run:
//!
//! ```toml
//! outputs   = ["Karambit", "Sport Gloves | Vice"]
//! materials = ["Case A", "Case B"]
//! ```
//!
//! Output names get the configured wear-condition suffix appended here, so
//! the rest of the pipeline only ever sees full item names.

use serde::Deserialize;
use std::path::Path;
use tracing::info;

use crate::types::{ItemCategory, MonitorError};

/// Raw shape of the task file.
#[derive(Debug, Deserialize, Default)]
struct TaskFile {
    #[serde(default)]
    outputs: Vec<String>,
    #[serde(default)]
    materials: Vec<String>,
}

/// Items requested for one cycle, names fully normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskList {
    pub outputs: Vec<String>,
    pub materials: Vec<String>,
    wear_suffix: String,
}

impl TaskList {
    /// Build a task list from base names, applying trimming and the wear
    /// suffix. Fails if no item survives normalization.
    pub fn new<S: AsRef<str>>(
        outputs: &[S],
        materials: &[S],
        wear_suffix: &str,
    ) -> Result<Self, MonitorError> {
        let outputs: Vec<String> = outputs
            .iter()
            .map(|s| s.as_ref().trim())
            .filter(|s| !s.is_empty())
            .map(|s| with_suffix(s, wear_suffix))
            .collect();
        let materials: Vec<String> = materials
            .iter()
            .map(|s| s.as_ref().trim())
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        if outputs.is_empty() && materials.is_empty() {
            return Err(MonitorError::TaskSource("task list contains no items".into()));
        }

        Ok(Self {
            outputs,
            materials,
            wear_suffix: wear_suffix.to_string(),
        })
    }

    /// Parse a TOML task file body.
    pub fn from_toml(contents: &str, wear_suffix: &str) -> Result<Self, MonitorError> {
        let raw: TaskFile = toml::from_str(contents)
            .map_err(|e| MonitorError::TaskSource(format!("unparseable task file: {e}")))?;
        Self::new(&raw.outputs, &raw.materials, wear_suffix)
    }

    /// Load and parse the task file at `path`.
    pub fn load(path: &Path, wear_suffix: &str) -> Result<Self, MonitorError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            MonitorError::TaskSource(format!("cannot read {}: {e}", path.display()))
        })?;
        let tasks = Self::from_toml(&contents, wear_suffix)?;
        info!(
            path = %path.display(),
            outputs = tasks.outputs.len(),
            materials = tasks.materials.len(),
            "Task list loaded"
        );
        Ok(tasks)
    }

    /// Every distinct item name, outputs first, in file order.
    pub fn all_items(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.outputs
            .iter()
            .chain(self.materials.iter())
            .filter(|name| seen.insert(name.as_str()))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.all_items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty() && self.materials.is_empty()
    }

    /// Short name for reports: outputs lose the wear suffix.
    pub fn display_name(&self, name: &str, category: ItemCategory) -> String {
        match category {
            ItemCategory::Output => name
                .strip_suffix(self.wear_suffix.as_str())
                .unwrap_or(name)
                .trim()
                .to_string(),
            ItemCategory::Material => name.to_string(),
        }
    }
}

fn with_suffix(name: &str, suffix: &str) -> String {
    let trimmed_suffix = suffix.trim();
    if trimmed_suffix.is_empty() || name.ends_with(trimmed_suffix) {
        name.to_string()
    } else {
        format!("{name}{suffix}")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
