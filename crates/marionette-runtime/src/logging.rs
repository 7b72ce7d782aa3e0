//! Logging setup
//!
//! The library only emits `tracing` events. Binaries and demos call
//! [`init_logging`] once to install a subscriber.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use marionette_core::{MarionetteError, MarionetteResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Directive used when `RUST_LOG` is unset, e.g. `info` or
    /// `marionette_runtime=debug`
    pub default_directive: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            default_directive: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl LogConfig {
    pub fn verbose() -> Self {
        LogConfig {
            default_directive: "debug".to_string(),
            ..Default::default()
        }
    }

    fn filter(&self) -> MarionetteResult<EnvFilter> {
        let directive = self
            .default_directive
            .parse()
            .map_err(|e| MarionetteError::InvalidConfig(format!("log directive: {}", e)))?;

        Ok(EnvFilter::builder()
            .with_default_directive(directive)
            .from_env_lossy())
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &LogConfig) -> MarionetteResult<()> {
    let filter = config.filter()?;
    let registry = tracing_subscriber::registry().with(filter);

    let result = match config.format {
        LogFormat::Pretty => registry.with(fmt::layer()).try_init(),
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
    };
    result.map_err(|e| MarionetteError::InvalidConfig(format!("logging: {}", e)))
}
