//! Infrastructure-level errors (wraps application errors)

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::application::ApplicationError;

/// Infrastructure errors wrap application errors and add file-creation failures
/// outside the output sinks.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("{0}")]
    Application(#[from] ApplicationError),

    #[error("cannot create {}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl InfraError {
    pub fn create(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Create {
            path: path.into(),
            source,
        }
    }
}
