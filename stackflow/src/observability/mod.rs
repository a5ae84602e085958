//! Tracing subscriber setup.
//!
//! Libraries should not install subscribers; binaries embedding stackflow call
//! [`init_tracing`] once at startup and pair it with a
//! [`crate::events::LoggingEventSink`].

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;
use crate::errors::{Result, StackflowError};

/// Builds the filter: `RUST_LOG` when set, otherwise the configured level.
#[must_use]
pub fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}

/// Installs the global tracing subscriber.
///
/// # Errors
///
/// Returns a configuration error if a global subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let registry = tracing_subscriber::registry().with(build_filter(config));

    let installed = if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true).with_level(true))
            .try_init()
    };

    installed.map_err(|e| StackflowError::Config(format!("tracing already initialised: {e}")))
}
