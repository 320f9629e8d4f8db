//! Logging initialization.

use tracing::*;
use tracing_subscriber::{
    EnvFilter, Layer, filter::Directive, fmt::layer, layer::SubscriberExt,
    util::SubscriberInitExt,
};

use super::{errors::LoggingError, types::LoggerConfig};

/// Builds the filter from the config, letting `RUST_LOG` override the base directive.
pub fn build_env_filter(config: &LoggerConfig) -> Result<EnvFilter, LoggingError> {
    let base: Directive = config.default_directive.parse()?;
    let mut filt = EnvFilter::builder()
        .with_default_directive(base)
        .from_env_lossy();

    for directive in &config.extra_directives {
        filt = filt.add_directive(directive.parse()?);
    }

    Ok(filt)
}

/// Installs the global subscriber described by `config`.
///
/// # Errors
///
/// Fails on an unparsable directive, or if a global subscriber is already installed.
pub fn try_init(config: &LoggerConfig) -> Result<(), LoggingError> {
    let filt = build_env_filter(config)?;

    let stdout_sub = match (config.json_format, config.test_writer) {
        (true, true) => layer().json().with_test_writer().with_filter(filt).boxed(),
        (true, false) => layer().json().with_filter(filt).boxed(),
        (false, true) => layer()
            .compact()
            .with_test_writer()
            .with_filter(filt)
            .boxed(),
        (false, false) => layer().compact().with_filter(filt).boxed(),
    };

    tracing_subscriber::registry().with(stdout_sub).try_init()?;

    info!(
        directive = %config.default_directive,
        json = config.json_format,
        "logging initialized"
    );
    Ok(())
}
