use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;

/// Initialize tracing from the logging config. The `log` records emitted
/// by dependencies (reqwest and friends) are bridged into tracing by the
/// subscriber.
pub fn init_logging(logging_config: &LoggingConfig) {
    // Parse level string -> LevelFilter
    let level_filter = match logging_config.level.trim().to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => {
            panic!(
                "Invalid logging.level '{}'. Valid values: trace, debug, info, warn, error",
                logging_config.level
            );
        }
    };

    // This can be used to allow env-based overrides, plus the default:
    let filter_layer = EnvFilter::default().add_directive(level_filter.into());

    match logging_config.format.to_lowercase().as_str() {
        "json" => {
            // Structured JSON output
            tracing_subscriber::registry()
                .with(filter_layer)
                .with(fmt::layer().json())
                .init();
        }
        "console" => {
            // Human-readable console output with ANSI colors
            tracing_subscriber::registry()
                .with(filter_layer)
                .with(fmt::layer().pretty())
                .init();
        }
        _ => {
            // Fallback to console if unknown
            tracing_subscriber::registry()
                .with(filter_layer)
                .with(fmt::layer().pretty())
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoggingConfig;

    /// One console init must succeed and accept subsequent events. Only
    /// this test installs the global default.
    #[test]
    fn test_init_console_logging() {
        init_logging(&LoggingConfig {
            level: "debug".to_string(),
            format: "console".to_string(),
        });
        tracing::debug!("logger initialized");
    }

    /// An unknown level is rejected before anything global is touched.
    #[test]
    #[should_panic(expected = "Invalid logging.level")]
    fn test_invalid_level_panics() {
        init_logging(&LoggingConfig {
            level: "verbose".to_string(),
            format: "console".to_string(),
        });
    }
}
