//! Logging setup
//!
//! Structured logging through `tracing`. Library code only emits events;
//! the binary installs the subscriber once via [`init`].

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;
use crate::errors::{AgentError, Result};

/// Build the filter: `RUST_LOG` wins over the configured level
fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level)
        .map_err(|e| AgentError::Config(format!("Invalid log level '{}': {}", config.level, e)))
}

/// Install the global subscriber
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(config)?;
    let builder = fmt().with_env_filter(filter).with_target(true);

    let installed = if config.format == "json" {
        builder.json().with_current_span(false).try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| AgentError::Config(format!("Failed to initialise logging: {}", e)))
}
