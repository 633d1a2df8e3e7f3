pub mod convert;
pub mod edit;
pub mod export;
pub mod show;
pub mod validate;

use anyhow::Context;
use multio_plans::{Collection, Config, Document, Format, Issue, Validate};
use std::path::Path;

/// A plan file read either as a single config or as a collection of them.
pub enum Loaded {
    Config(Config),
    Collection(Collection),
}

impl Loaded {
    pub fn read(path: &Path, collection: bool) -> anyhow::Result<Self> {
        let loaded = if collection {
            Collection::from_file(path).map(Loaded::Collection)
        } else {
            Config::from_file(path).map(Loaded::Config)
        };
        loaded.with_context(|| format!("failed to load {}", path.display()))
    }

    pub fn validate(&self) -> Vec<Issue> {
        match self {
            Loaded::Config(c) => c.validate(),
            Loaded::Collection(c) => c.validate(),
        }
    }

    /// Configs with their collection key, if any.
    pub fn configs(&self) -> Vec<(Option<&str>, &Config)> {
        match self {
            Loaded::Config(c) => vec![(None, c)],
            Loaded::Collection(col) => col.iter().map(|(k, c)| (Some(k), c)).collect(),
        }
    }

    pub fn ensure_sinks(&mut self) -> anyhow::Result<()> {
        match self {
            Loaded::Config(c) => c.ensure_sinks(),
            Loaded::Collection(col) => {
                let keys: Vec<String> = col.keys().map(str::to_string).collect();
                for key in keys {
                    col.get_mut(&key)?.ensure_sinks();
                }
            }
        }
        Ok(())
    }

    pub fn dump(&self, format: Format) -> anyhow::Result<String> {
        let out = match self {
            Loaded::Config(c) => c.dump(format)?,
            Loaded::Collection(c) => c.dump(format)?,
        };
        Ok(out)
    }

    pub fn write(&self, path: &Path, format: Format) -> anyhow::Result<()> {
        match self {
            Loaded::Config(c) => c.write(path, format)?,
            Loaded::Collection(c) => c.write(path, format)?,
        }
        Ok(())
    }
}
