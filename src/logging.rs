//! Logging setup
//!
//! Logs go to stderr so stdout carries only the menu and reports.
//!
//! Usage:
//!   workforce --debug                  # Debug logging
//!   RUST_LOG=workforce=info workforce  # Fine-grained log control (overrides --debug)

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Logging options taken from the command line
#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    /// Log at debug level unless `RUST_LOG` is set
    pub debug: bool,
}

/// Install the global subscriber
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = if config.debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(config.debug)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}
