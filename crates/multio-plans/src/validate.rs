use crate::error::{PlanError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Issue / IssueLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueLevel {
    Warning,
    Error,
}

/// A single finding against a plan document, located by a dotted path such
/// as `plans[0].actions[2].template`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub level: IssueLevel,
    pub location: String,
    pub message: String,
}

impl Issue {
    pub fn error(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Error,
            location: location.into(),
            message: message.into(),
        }
    }

    pub fn warning(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Warning,
            location: location.into(),
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == IssueLevel::Error
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.location.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.location, self.message)
        }
    }
}

// ---------------------------------------------------------------------------
// Validate
// ---------------------------------------------------------------------------

pub trait Validate {
    /// Field-level checks. Any error reported here makes the object
    /// unloadable.
    fn check(&self, at: &str, issues: &mut Vec<Issue>);

    /// Checks that only apply to a finished document, such as a plan
    /// lacking a terminal action. Objects under construction may fail these.
    fn check_complete(&self, _at: &str, _issues: &mut Vec<Issue>) {}

    /// Full report: field checks followed by completeness checks.
    fn validate(&self) -> Vec<Issue> {
        let mut issues = Vec::new();
        self.check("", &mut issues);
        self.check_complete("", &mut issues);
        issues
    }
}

pub(crate) fn field(at: &str, name: &str) -> String {
    if at.is_empty() {
        name.to_string()
    } else {
        format!("{at}.{name}")
    }
}

pub(crate) fn indexed(at: &str, name: &str, i: usize) -> String {
    field(at, &format!("{name}[{i}]"))
}

/// Fail with every error-level field issue of `value`.
pub(crate) fn ensure_loadable<T: Validate + ?Sized>(value: &T) -> Result<()> {
    let mut issues = Vec::new();
    value.check("", &mut issues);
    let errors: Vec<String> = issues
        .iter()
        .filter(|i| i.is_error())
        .map(|i| i.to_string())
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(PlanError::Invalid(errors))
    }
}
