use crate::error::Result;
use crate::validate::{ensure_loadable, field, Issue, Validate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Sink
// ---------------------------------------------------------------------------

/// Leaf destination of a `sink` action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Sink {
    #[serde(rename = "fdb5", alias = "fdb")]
    Fdb(FdbSink),
    #[serde(rename = "file")]
    File(FileSink),
    #[serde(rename = "socket")]
    Socket(SocketSink),
    #[serde(rename = "debug-sink", alias = "debug")]
    Debug(DebugSink),
    #[serde(rename = "trigger")]
    Trigger(TriggerSink),
}

impl Sink {
    pub const TYPES: &'static [&'static str] = &["fdb5", "file", "socket", "debug-sink", "trigger"];

    pub fn type_name(&self) -> &'static str {
        match self {
            Sink::Fdb(_) => "fdb5",
            Sink::File(_) => "file",
            Sink::Socket(_) => "socket",
            Sink::Debug(_) => "debug-sink",
            Sink::Trigger(_) => "trigger",
        }
    }

    /// Build a sink from an untyped map such as `{"type": "fdb5"}`.
    pub fn from_value(value: Value) -> Result<Self> {
        let sink: Sink = serde_json::from_value(value)?;
        ensure_loadable(&sink)?;
        Ok(sink)
    }

    pub fn fdb() -> Self {
        Sink::Fdb(FdbSink::default())
    }

    pub fn file(path: impl Into<String>, append: bool) -> Self {
        Sink::File(FileSink {
            append,
            per_server: false,
            path: path.into(),
        })
    }

    pub fn debug() -> Self {
        Sink::Debug(DebugSink {})
    }

    pub fn trigger(
        file: impl Into<PathBuf>,
        key: impl Into<String>,
        host: impl Into<String>,
    ) -> Self {
        Sink::Trigger(TriggerSink {
            file: file.into(),
            key: key.into(),
            host: host.into(),
            fail_on_retry: false,
            port: default_trigger_port(),
            retries: default_trigger_retries(),
            timeout: default_trigger_timeout(),
        })
    }
}

impl Validate for Sink {
    fn check(&self, at: &str, issues: &mut Vec<Issue>) {
        match self {
            Sink::File(s) => {
                if s.path.trim().is_empty() {
                    issues.push(Issue::error(field(at, "path"), "file sink path must not be empty"));
                }
            }
            Sink::Trigger(s) => {
                if s.host.trim().is_empty() {
                    issues.push(Issue::error(field(at, "host"), "trigger host must not be empty"));
                }
                if s.key.trim().is_empty() {
                    issues.push(Issue::error(field(at, "key"), "trigger key must not be empty"));
                }
                if s.port == 0 {
                    issues.push(Issue::error(field(at, "port"), "trigger port must be > 0"));
                }
            }
            Sink::Fdb(_) | Sink::Socket(_) | Sink::Debug(_) => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Variants
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FdbSink {
    /// Path to the FDB configuration; the engine falls back to its own
    /// discovery when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileSink {
    pub append: bool,
    #[serde(rename = "per-server", alias = "per_server", default)]
    pub per_server: bool,
    pub path: String,
}

// Socket output is accepted by the schema but carries no settings yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SocketSink {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DebugSink {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TriggerSink {
    /// Path to the trigger file.
    pub file: PathBuf,
    pub key: String,
    pub host: String,
    #[serde(rename = "failOnRetry", default)]
    pub fail_on_retry: bool,
    #[serde(default = "default_trigger_port")]
    pub port: u16,
    #[serde(default = "default_trigger_retries")]
    pub retries: u32,
    /// Seconds.
    #[serde(default = "default_trigger_timeout")]
    pub timeout: u32,
}

fn default_trigger_port() -> u16 {
    10000
}

fn default_trigger_retries() -> u32 {
    5
}

fn default_trigger_timeout() -> u32 {
    60
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
