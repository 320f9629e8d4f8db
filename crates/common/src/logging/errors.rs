use thiserror::Error;
use tracing_subscriber::{filter::ParseError, util::TryInitError};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log directive: {0}")]
    InvalidDirective(#[from] ParseError),

    #[error("global subscriber already installed: {0}")]
    AlreadyInitialized(#[from] TryInitError),
}
