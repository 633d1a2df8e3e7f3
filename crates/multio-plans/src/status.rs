use crate::error::PlanError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Return codes of the engine's C interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum ResultCode {
    Success = 0,
    EckitException = 1,
    GeneralException = 2,
    UnknownException = 3,
}

impl ResultCode {
    pub fn all() -> &'static [ResultCode] {
        &[
            ResultCode::Success,
            ResultCode::EckitException,
            ResultCode::GeneralException,
            ResultCode::UnknownException,
        ]
    }

    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        self == ResultCode::Success
    }

    /// The constant's name in the C header.
    pub fn as_str(self) -> &'static str {
        match self {
            ResultCode::Success => "MULTIO_SUCCESS",
            ResultCode::EckitException => "MULTIO_ERROR_ECKIT_EXCEPTION",
            ResultCode::GeneralException => "MULTIO_ERROR_GENERAL_EXCEPTION",
            ResultCode::UnknownException => "MULTIO_ERROR_UNKNOWN_EXCEPTION",
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<i32> for ResultCode {
    type Error = PlanError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        ResultCode::all()
            .iter()
            .copied()
            .find(|c| c.code() == code)
            .ok_or(PlanError::UnknownResultCode(code))
    }
}
