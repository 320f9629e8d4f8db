//! Configuration types for the logging subsystem.

use serde::{Deserialize, Serialize};

/// Default directive when neither the config nor `RUST_LOG` names one.
const DEFAULT_DIRECTIVE: &str = "info";

fn default_directive() -> String {
    DEFAULT_DIRECTIVE.to_owned()
}

/// Logger configuration, usually embedded as a `[logging]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Base filter directive, e.g. `info` or `tunnel_utxo_logic=trace`.
    #[serde(default = "default_directive")]
    pub default_directive: String,

    /// Extra per-target directives layered on top of the base one.
    #[serde(default)]
    pub extra_directives: Vec<String>,

    /// Use JSON format instead of compact.
    #[serde(default)]
    pub json_format: bool,

    /// Route output through the test harness capture.
    #[serde(default)]
    pub test_writer: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DIRECTIVE)
    }
}

impl LoggerConfig {
    pub fn new(default_directive: impl Into<String>) -> Self {
        Self {
            default_directive: default_directive.into(),
            extra_directives: Vec::new(),
            json_format: false,
            test_writer: false,
        }
    }

    pub fn with_json_format(mut self, json_format: bool) -> Self {
        self.json_format = json_format;
        self
    }

    pub fn with_test_writer(mut self, test_writer: bool) -> Self {
        self.test_writer = test_writer;
        self
    }

    pub fn add_directive(mut self, directive: impl Into<String>) -> Self {
        self.extra_directives.push(directive.into());
        self
    }
}
