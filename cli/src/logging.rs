//! Tracing / logging initialisation.

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log settings for the binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default level when `RUST_LOG` is unset: "trace" | "debug" | "info" | "warn" | "error"
    #[serde(default = "default_level")]
    pub level: String,
    /// Emit JSON structured logs (true) or human-readable text (false)
    #[serde(default)]
    pub json: bool,
}

fn default_level() -> String {
    "warn".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

impl LogConfig {
    pub fn from_flags(verbose: bool, json: bool) -> Self {
        Self {
            level: if verbose { "debug".into() } else { default_level() },
            json,
        }
    }
}

/// Initialise tracing. Logs go to stderr so stdout stays clean for output.
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(config: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    if config.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_raises_level() {
        assert_eq!(LogConfig::from_flags(true, false).level, "debug");
        assert_eq!(LogConfig::from_flags(false, true).level, "warn");
    }

    #[test]
    fn config_defaults_from_json() {
        let cfg: LogConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.level, "warn");
        assert!(!cfg.json);
    }
}
