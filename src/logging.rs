//! Logging System
//!
//! Structured logging using the `tracing` crate. The level comes from the
//! `SWIPE_CULL_LOG` environment variable when set, otherwise from the
//! settings file; output goes to stderr as text or JSON.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{LoggingConfig, LOG_ENV};
use crate::error::ConfigError;

/// Build the event filter: environment first, then configuration
pub fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter, ConfigError> {
    if let Ok(directive) = std::env::var(LOG_ENV) {
        if !directive.trim().is_empty() {
            return EnvFilter::try_new(&directive)
                .map_err(|e| ConfigError::LogFilter(format!("{LOG_ENV}={directive}: {e}")));
        }
    }
    EnvFilter::try_new(&config.level)
        .map_err(|e| ConfigError::LogFilter(format!("{}: {e}", config.level)))
}

/// Initialize the logging system.
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), ConfigError> {
    let filter = build_env_filter(config)?;
    let builder = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    let installed = match config.format.as_str() {
        "json" => builder.json().try_init(),
        _ => builder.try_init(),
    };
    installed.map_err(|e| ConfigError::LogInit(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_level_is_used() {
        let config = LoggingConfig {
            level: "swipe_cull=debug,warn".to_string(),
            format: "text".to_string(),
        };
        // The environment may override; either way the directive parses
        assert!(build_env_filter(&config).is_ok());
    }

    #[test]
    fn test_bad_directive_is_rejected() {
        let config = LoggingConfig {
            level: "swipe_cull=loud".to_string(),
            format: "text".to_string(),
        };
        if std::env::var(LOG_ENV).is_err() {
            assert!(matches!(build_env_filter(&config), Err(ConfigError::LogFilter(_))));
        }
    }
}
