//! Logging subsystem built on `tracing-subscriber`.

mod errors;
mod manager;
mod types;


pub use errors::LoggingError;
pub use manager::{build_env_filter, try_init};
pub use types::LoggerConfig;
