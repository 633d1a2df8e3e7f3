//! Hand a config to the engine through the process environment.
//!
//! The engine reads its plans either inline from `MULTIO_PLANS` (JSON) or from
//! the file named by `MULTIO_PLANS_FILE`. [`PlanExport`] sets one of these for
//! the lifetime of an [`EnvGuard`] and restores the previous state on drop.
//!
//! The environment is process-global: callers running exports on several
//! threads must serialize them themselves.

use crate::configs::Config;
use crate::document::{Document, Format};
use crate::error::{PlanError, Result};
use serde_json::Value;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const PLANS_ENV: &str = "MULTIO_PLANS";
pub const PLANS_FILE_ENV: &str = "MULTIO_PLANS_FILE";

// ---------------------------------------------------------------------------
// PlanSource
// ---------------------------------------------------------------------------

/// Anything a config can be built from.
#[derive(Debug, Clone)]
pub enum PlanSource {
    Config(Config),
    Value(Value),
    /// Tried as a file path, then as YAML, then as JSON.
    Text(String),
    Path(PathBuf),
}

impl PlanSource {
    pub fn resolve(self) -> Result<Config> {
        match self {
            PlanSource::Config(config) => Ok(config),
            PlanSource::Value(value) => Config::from_value(value),
            PlanSource::Path(path) => Config::from_file(&path),
            PlanSource::Text(text) => resolve_text(&text),
        }
    }
}

fn resolve_text(text: &str) -> Result<Config> {
    let path = Path::new(text);
    if !text.contains('\n') && path.is_file() {
        return Config::from_file(path);
    }
    match Config::from_yaml(text) {
        Ok(config) => return Ok(config),
        Err(e) => debug!(error = %e, "plan source is not yaml"),
    }
    match Config::from_json(text) {
        Ok(config) => Ok(config),
        Err(e) => {
            debug!(error = %e, "plan source is not json");
            Err(PlanError::UnparsableSource(abbreviate(text)))
        }
    }
}

fn abbreviate(text: &str) -> String {
    const MAX: usize = 80;
    match text.char_indices().nth(MAX) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

impl From<Config> for PlanSource {
    fn from(config: Config) -> Self {
        PlanSource::Config(config)
    }
}

impl From<Value> for PlanSource {
    fn from(value: Value) -> Self {
        PlanSource::Value(value)
    }
}

impl From<&str> for PlanSource {
    fn from(text: &str) -> Self {
        PlanSource::Text(text.to_string())
    }
}

impl From<String> for PlanSource {
    fn from(text: String) -> Self {
        PlanSource::Text(text)
    }
}

impl From<PathBuf> for PlanSource {
    fn from(path: PathBuf) -> Self {
        PlanSource::Path(path)
    }
}

impl From<&Path> for PlanSource {
    fn from(path: &Path) -> Self {
        PlanSource::Path(path.to_path_buf())
    }
}

// ---------------------------------------------------------------------------
// PlanExport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PlanExport {
    config: Config,
    var: String,
    file_var: String,
}

impl PlanExport {
    pub fn new(source: impl Into<PlanSource>) -> Result<Self> {
        let config = source.into().resolve()?;
        Ok(Self {
            config,
            var: PLANS_ENV.to_string(),
            file_var: PLANS_FILE_ENV.to_string(),
        })
    }

    /// Use a different variable for the inline JSON export.
    pub fn with_var(mut self, var: impl Into<String>) -> Self {
        self.var = var.into();
        self
    }

    /// Use a different variable for the file export.
    pub fn with_file_var(mut self, var: impl Into<String>) -> Self {
        self.file_var = var.into();
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn var(&self) -> &str {
        &self.var
    }

    /// Variable name and compact JSON value, for handing to a child process
    /// without touching this process's environment.
    pub fn env_pair(&self) -> Result<(String, String)> {
        self.warn_incomplete();
        Ok((self.var.clone(), self.config.dump_json()?))
    }

    /// Set the inline variable until the returned guard is dropped.
    pub fn activate(&self) -> Result<EnvGuard> {
        let (var, json) = self.env_pair()?;
        debug!(%var, bytes = json.len(), "exporting plans");
        Ok(EnvGuard::set(var, json))
    }

    /// Write the config to `path` and point the file variable at it until the
    /// returned guard is dropped. The file itself is left in place.
    pub fn activate_file(&self, path: &Path, format: Format) -> Result<EnvGuard> {
        self.warn_incomplete();
        self.config.write(path, format)?;
        debug!(var = %self.file_var, path = %path.display(), "exporting plans file");
        Ok(EnvGuard::set(self.file_var.clone(), path))
    }

    /// Run `f` with the plans exported.
    pub fn scoped<T>(&self, f: impl FnOnce() -> T) -> Result<T> {
        let _guard = self.activate()?;
        Ok(f())
    }

    fn warn_incomplete(&self) {
        for name in self.config.incomplete_plans() {
            warn!(plan = name, "plan has no terminal action; the engine will reject it");
        }
    }
}

// ---------------------------------------------------------------------------
// EnvGuard
// ---------------------------------------------------------------------------

/// Restores an environment variable to its prior state on drop.
#[must_use = "the variable is restored as soon as the guard is dropped"]
#[derive(Debug)]
pub struct EnvGuard {
    var: String,
    prior: Option<OsString>,
}

impl EnvGuard {
    pub fn set(var: impl Into<String>, value: impl AsRef<OsStr>) -> Self {
        let var = var.into();
        let prior = std::env::var_os(&var);
        std::env::set_var(&var, value);
        Self { var, prior }
    }

    pub fn var(&self) -> &str {
        &self.var
    }

    pub fn prior(&self) -> Option<&OsStr> {
        self.prior.as_deref()
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match &self.prior {
            Some(value) => std::env::set_var(&self.var, value),
            None => std::env::remove_var(&self.var),
        }
    }
}
