use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("invalid plan, could not parse {0}")]
    UnparsableSource(String),

    #[error("validation failed:\n  - {}", .0.join("\n  - "))]
    Invalid(Vec<String>),

    #[error("plan not found: {0}")]
    PlanNotFound(String),

    #[error("config not found: {0}")]
    ConfigNotFound(String),

    #[error("unknown format '{0}': expected yaml or json")]
    UnknownFormat(String),

    #[error("unknown result code: {0}")]
    UnknownResultCode(i32),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PlanError>;
