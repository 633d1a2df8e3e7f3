//! Loading and dumping of plan documents in YAML and JSON.

use crate::error::{PlanError, Result};
use crate::validate::{ensure_loadable, Validate};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::path::Path;
use tracing::debug;

// ---------------------------------------------------------------------------
// Format
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    #[default]
    Yaml,
    Json,
}

impl Format {
    pub fn as_str(self) -> &'static str {
        match self {
            Format::Yaml => "yaml",
            Format::Json => "json",
        }
    }

    /// `.json` files are JSON; everything else is read as YAML.
    pub fn from_path(path: &Path) -> Format {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Yaml,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Format {
    type Err = PlanError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(Format::Yaml),
            "json" => Ok(Format::Json),
            _ => Err(PlanError::UnknownFormat(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// A top-level object that can be read from and written to YAML or JSON.
///
/// Every loader runs the field checks of [`Validate::check`] after
/// deserialization and fails with all error-level findings at once.
/// Completeness checks are left to [`Validate::validate`].
pub trait Document: Serialize + DeserializeOwned + Validate {
    const KIND: &'static str;

    fn from_yaml(yaml: &str) -> Result<Self> {
        let doc: Self = serde_yaml::from_str(yaml)?;
        ensure_loadable(&doc)?;
        debug!(kind = Self::KIND, "loaded document from yaml");
        Ok(doc)
    }

    fn from_json(json: &str) -> Result<Self> {
        let doc: Self = serde_json::from_str(json)?;
        ensure_loadable(&doc)?;
        debug!(kind = Self::KIND, "loaded document from json");
        Ok(doc)
    }

    fn from_value(value: Value) -> Result<Self> {
        let doc: Self = serde_json::from_value(value)?;
        ensure_loadable(&doc)?;
        Ok(doc)
    }

    fn from_yaml_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_yaml(&data)
    }

    /// Read a file, choosing the parser from its extension.
    fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        debug!(kind = Self::KIND, path = %path.display(), "reading document");
        match Format::from_path(path) {
            Format::Json => Self::from_json(&data),
            Format::Yaml => Self::from_yaml(&data),
        }
    }

    fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Compact JSON, the form the engine reads from its environment.
    fn dump_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    fn dump_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// YAML with keys in declaration order.
    fn dump_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    fn dump(&self, format: Format) -> Result<String> {
        match format {
            Format::Yaml => self.dump_yaml(),
            Format::Json => self.dump_json_pretty(),
        }
    }

    fn write(&self, path: &Path, format: Format) -> Result<()> {
        let data = self.dump(format)?;
        crate::io::atomic_write(path, data.as_bytes())?;
        debug!(kind = Self::KIND, path = %path.display(), %format, "wrote document");
        Ok(())
    }
}
