//! Batch changes loaded from a YAML or TOML file.
//!
//! ```yaml
//! entries:
//!   - id: backup
//!     schedule: "0 3 * * * /usr/local/bin/backup"
//!   - id: report
//!     schedule: { minute: 30, hour: 8, weekday: mon-fri, command: report.sh }
//! remove: [old-agent]
//! ```

use anyhow::{Context, Result};
use common::{CrontabSession, CrontabStore, Definition};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestEntry {
    pub id: String,
    pub schedule: Definition,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Manifest {
    #[serde(default)]
    pub entries: Vec<ManifestEntry>,
    #[serde(default)]
    pub remove: Vec<String>,
}

impl Manifest {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {:?}", path))?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let manifest = match ext {
            "yaml" | "yml" => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse manifest: {:?}", path))?,
            "toml" => toml::from_str(&content)
                .with_context(|| format!("Failed to parse manifest: {:?}", path))?,
            _ => return Err(anyhow::anyhow!("Unsupported manifest format. Use .yaml, .yml, or .toml")),
        };
        Ok(manifest)
    }

    /// Stage every entry and removal. Removals are staged last, so an id
    /// listed in both ends up removed.
    pub fn stage<S: CrontabStore>(&self, session: &mut CrontabSession<S>) -> Result<()> {
        for entry in &self.entries {
            session
                .add(entry.id.as_str(), &entry.schedule)
                .with_context(|| format!("Invalid entry '{}'", entry.id))?;
        }
        for id in &self.remove {
            session
                .remove(id.as_str())
                .with_context(|| format!("Invalid removal '{}'", id))?;
        }
        Ok(())
    }
}
