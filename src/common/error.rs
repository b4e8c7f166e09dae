use thiserror::Error;

use crate::common::config::ConfigError;
use crate::model::WindowId;
use crate::model::group::GroupError;

#[derive(Debug, Error)]
pub enum WmError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Group(#[from] GroupError),
    #[error("window {0} is already registered")]
    DuplicateHandle(WindowId),
    #[error("unknown window handle {0}")]
    UnknownHandle(WindowId),
    #[error("resize rejected: {0}")]
    GeometryConstraintViolation(String),
    #[error("external action `{action}` failed: {reason}")]
    ExternalActionFailure { action: String, reason: String },
}

impl WmError {
    /// Errors that come from stale input or the outside world and are
    /// handled by dropping the operation.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            WmError::UnknownHandle(_)
                | WmError::Group(_)
                | WmError::GeometryConstraintViolation(_)
                | WmError::ExternalActionFailure { .. }
        )
    }
}

pub type Result<T, E = WmError> = std::result::Result<T, E>;
