//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("{0}")]
    Usage(String),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        Self::Infra(InfraError::Application(e))
    }
}

impl From<DomainError> for CliError {
    fn from(e: DomainError) -> Self {
        Self::from(ApplicationError::Domain(e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) | CliError::Usage(_) => crate::exitcode::USAGE,
            CliError::Infra(e) => match e {
                InfraError::Create { .. } => crate::exitcode::CANTCREAT,
                InfraError::Application(app) => match app {
                    ApplicationError::Domain(_) => crate::exitcode::DATAERR,
                    ApplicationError::Config { .. } => crate::exitcode::CONFIG,
                    ApplicationError::Input { .. } => crate::exitcode::NOINPUT,
                    ApplicationError::OperationFailed { .. } => crate::exitcode::SOFTWARE,
                },
            },
        }
    }
}
