use thiserror::Error;

/// Errors raised while configuring or deriving a learning-rate schedule.
///
/// Both variants are fatal: a schedule that failed to build cannot be stepped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleError {
    #[error("invalid schedule configuration: {0}")]
    InvalidConfiguration(String),
    #[error("numerical failure: {0}")]
    NumericalFailure(String),
}

impl ScheduleError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ScheduleError::InvalidConfiguration(message.into())
    }

    pub fn numerical(message: impl Into<String>) -> Self {
        ScheduleError::NumericalFailure(message.into())
    }
}
