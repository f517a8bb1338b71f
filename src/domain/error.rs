//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent business logic violations.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomainError {
    #[error("no commands to run")]
    EmptyBatch,

    #[error("cannot determine command mode from '{token}': expected a command starting with 'en', 'sh' or 'co'")]
    UnrecognizedCommand { token: String },

    #[error("no switches to process")]
    EmptySwitchList,

    #[error("invalid switch target: '{0}'")]
    InvalidSwitchTarget(String),
}
