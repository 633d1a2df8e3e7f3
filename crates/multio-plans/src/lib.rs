//! Typed plans and configs for the multio output pipeline.
//!
//! A [`Plan`] is an ordered list of [`Action`]s ending in one or more
//! [`Sink`]s; a [`Config`] groups plans for a client or server engine; a
//! [`Collection`] names several configs. All of them load from and dump to
//! YAML or JSON through [`Document`], and [`PlanExport`] hands a config to the
//! engine through its environment.

pub mod actions;
pub mod configs;
pub mod document;
pub mod error;
pub mod export;
pub mod io;
pub mod plans;
pub mod sinks;
pub mod status;
pub mod validate;

pub use actions::Action;
pub use configs::{Collection, Config};
pub use document::{Document, Format};
pub use error::{PlanError, Result};
pub use export::{EnvGuard, PlanExport, PlanSource};
pub use plans::Plan;
pub use sinks::Sink;
pub use status::ResultCode;
pub use validate::{Issue, IssueLevel, Validate};
