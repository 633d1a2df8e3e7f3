use crate::error::Result;
use crate::sinks::Sink;
use crate::validate::{ensure_loadable, field, indexed, Issue, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// One step of a plan. The `type` key selects the variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Action {
    Select(Select),
    Statistics(Statistics),
    Transport(Transport),
    Aggregation(Aggregation),
    Interpolate(Interpolate),
    Print(Print),
    Mask(Mask),
    Encode(Encode),
    Sink(SinkAction),
    SingleFieldSink(SingleFieldSink),
}

impl Action {
    pub const TYPES: &'static [&'static str] = &[
        "select",
        "statistics",
        "transport",
        "aggregation",
        "interpolate",
        "print",
        "mask",
        "encode",
        "sink",
        "single-field-sink",
    ];

    pub fn type_name(&self) -> &'static str {
        match self {
            Action::Select(_) => "select",
            Action::Statistics(_) => "statistics",
            Action::Transport(_) => "transport",
            Action::Aggregation(_) => "aggregation",
            Action::Interpolate(_) => "interpolate",
            Action::Print(_) => "print",
            Action::Mask(_) => "mask",
            Action::Encode(_) => "encode",
            Action::Sink(_) => "sink",
            Action::SingleFieldSink(_) => "single-field-sink",
        }
    }

    /// Terminal actions hand data out of the plan; a plan needs at least one.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Action::Sink(_) | Action::Transport(_) | Action::SingleFieldSink(_)
        )
    }

    /// Build an action from an untyped map such as `{"type": "print"}`,
    /// applying the same field checks as a document load.
    pub fn from_value(value: Value) -> Result<Self> {
        let action: Action = serde_json::from_value(value)?;
        ensure_loadable(&action)?;
        Ok(action)
    }

    pub fn select(filters: Vec<Map<String, Value>>) -> Self {
        Action::Select(Select { filters })
    }

    pub fn transport(target: impl Into<String>) -> Self {
        Action::Transport(Transport {
            target: target.into(),
        })
    }

    pub fn print() -> Self {
        Action::Print(Print::default())
    }

    pub fn sink(sinks: Vec<Sink>) -> Self {
        Action::Sink(SinkAction { sinks })
    }
}

macro_rules! impl_from_variant {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for Action {
                fn from(value: $ty) -> Self {
                    Action::$variant(value)
                }
            }
        )*
    };
}

impl_from_variant!(
    Select(Select),
    Statistics(Statistics),
    Transport(Transport),
    Aggregation(Aggregation),
    Interpolate(Interpolate),
    Print(Print),
    Mask(Mask),
    Encode(Encode),
    Sink(SinkAction),
    SingleFieldSink(SingleFieldSink),
);

impl Validate for Action {
    fn check(&self, at: &str, issues: &mut Vec<Issue>) {
        match self {
            Action::Select(a) => {
                if a.filters.is_empty() {
                    issues.push(Issue::warning(
                        field(at, "match"),
                        "select has no match filters and will discard every field",
                    ));
                }
            }
            Action::Statistics(a) => {
                if a.operations.is_empty() {
                    issues.push(Issue::error(
                        field(at, "operations"),
                        "statistics requires at least one operation",
                    ));
                }
                if !is_valid_frequency(&a.output_frequency) {
                    issues.push(Issue::error(
                        field(at, "output-frequency"),
                        format!(
                            "invalid output frequency '{}': expected <count><unit> with unit h, d, w or m",
                            a.output_frequency
                        ),
                    ));
                }
            }
            Action::Transport(a) => {
                if a.target.trim().is_empty() {
                    issues.push(Issue::error(
                        field(at, "target"),
                        "transport target must not be empty",
                    ));
                }
            }
            Action::Interpolate(a) => {
                if a.grid.trim().is_empty() {
                    issues.push(Issue::error(
                        field(at, "grid"),
                        "interpolate grid must not be empty",
                    ));
                }
            }
            Action::Encode(a) => {
                if a.format == EncodeFormat::Grib && a.template.is_none() {
                    issues.push(Issue::error(
                        field(at, "template"),
                        "template is required for grib format",
                    ));
                }
            }
            Action::Sink(a) => {
                if a.sinks.is_empty() {
                    issues.push(Issue::warning(at, "sink action has no sinks"));
                }
                check_sinks(&a.sinks, at, issues);
            }
            Action::SingleFieldSink(a) => check_sinks(&a.sinks, at, issues),
            Action::Aggregation(_) | Action::Print(_) | Action::Mask(_) => {}
        }
    }
}

fn check_sinks(sinks: &[Sink], at: &str, issues: &mut Vec<Issue>) {
    for (i, sink) in sinks.iter().enumerate() {
        sink.check(&indexed(at, "sinks", i), issues);
    }
}

static FREQUENCY_RE: OnceLock<Regex> = OnceLock::new();

fn frequency_re() -> &'static Regex {
    FREQUENCY_RE.get_or_init(|| Regex::new(r"^[1-9][0-9]*[hdwm]$").unwrap())
}

/// Output frequencies look like `5h`, `10d`, `1w` or `1m` (months).
pub fn is_valid_frequency(s: &str) -> bool {
    frequency_re().is_match(s)
}

// ---------------------------------------------------------------------------
// Select
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Select {
    /// A field passes when it matches any of these key→value maps.
    #[serde(rename = "match")]
    pub filters: Vec<Map<String, Value>>,
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatisticsOperation {
    Average,
    Minimum,
    Maximum,
    Accumulate,
    Instant,
}

impl StatisticsOperation {
    pub fn all() -> &'static [StatisticsOperation] {
        &[
            StatisticsOperation::Average,
            StatisticsOperation::Minimum,
            StatisticsOperation::Maximum,
            StatisticsOperation::Accumulate,
            StatisticsOperation::Instant,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatisticsOperation::Average => "average",
            StatisticsOperation::Minimum => "minimum",
            StatisticsOperation::Maximum => "maximum",
            StatisticsOperation::Accumulate => "accumulate",
            StatisticsOperation::Instant => "instant",
        }
    }
}

impl fmt::Display for StatisticsOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Statistics {
    pub operations: Vec<StatisticsOperation>,
    #[serde(rename = "output-frequency", alias = "output_frequency")]
    pub output_frequency: String,
}

// ---------------------------------------------------------------------------
// Transport / Aggregation / Interpolate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Transport {
    pub target: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Aggregation {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Interpolate {
    /// Source grid; the engine reads it from field metadata when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    pub grid: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub options: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Print
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrintStream {
    Cout,
    #[default]
    Info,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Print {
    #[serde(default)]
    pub stream: PrintStream,
    #[serde(default)]
    pub prefix: String,
    #[serde(rename = "only-fields", alias = "only_fields", default)]
    pub only_fields: bool,
}

// ---------------------------------------------------------------------------
// Mask
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Mask {
    #[serde(rename = "apply-bitmap", alias = "apply_bitmap", default = "default_apply_bitmap")]
    pub apply_bitmap: bool,
    #[serde(
        rename = "missing-value",
        alias = "missing_value",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub missing_value: Option<f64>,
    #[serde(rename = "offset-value", alias = "offset_value", default = "default_offset_value")]
    pub offset_value: f64,
}

fn default_apply_bitmap() -> bool {
    true
}

// Kelvin offset of 0 °C.
fn default_offset_value() -> f64 {
    273.15
}

impl Default for Mask {
    fn default() -> Self {
        Self {
            apply_bitmap: default_apply_bitmap(),
            missing_value: None,
            offset_value: default_offset_value(),
        }
    }
}

// ---------------------------------------------------------------------------
// Encode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodeFormat {
    Grib,
    Raw,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Encode {
    pub format: EncodeFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<PathBuf>,
    #[serde(
        rename = "grid-type",
        alias = "grid_type",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub grid_type: Option<String>,
    #[serde(
        rename = "atlas-named-grid",
        alias = "atlas_named_grid",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub atlas_named_grid: Option<String>,
}

impl Encode {
    pub fn grib(template: impl Into<PathBuf>) -> Self {
        Self {
            format: EncodeFormat::Grib,
            template: Some(template.into()),
            grid_type: None,
            atlas_named_grid: None,
        }
    }

    pub fn raw() -> Self {
        Self {
            format: EncodeFormat::Raw,
            template: None,
            grid_type: None,
            atlas_named_grid: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Sink / SingleFieldSink
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SinkAction {
    #[serde(default)]
    pub sinks: Vec<Sink>,
}

impl SinkAction {
    pub fn add_sink(&mut self, sink: Sink) {
        self.sinks.push(sink);
    }

    pub fn extend_sinks(&mut self, sinks: impl IntoIterator<Item = Sink>) {
        self.sinks.extend(sinks);
    }
}

/// Writes every field to its own output instead of a shared stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SingleFieldSink {
    #[serde(
        rename = "root-path",
        alias = "root_path",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub root_path: Option<String>,
    #[serde(default)]
    pub sinks: Vec<Sink>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
