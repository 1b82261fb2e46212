//! # Structured Logging
//!
//! Boots the `tracing` subscriber for the relayer binary. Format is chosen
//! on the command line (pretty for humans, JSON lines for aggregation);
//! filtering follows `RUST_LOG` with an `info` default.
//!
//! Log output goes to stderr so stdout stays clean for the demo's JSON
//! summary.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Compact human-readable output for local runs.
    Pretty,
    /// JSON lines for log aggregation.
    Json,
}

impl LogFormat {
    /// Parse a format string. Accepts "json" or "pretty" (case-insensitive);
    /// anything else falls back to `Pretty`.
    pub fn from_str_lossy(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Install the global subscriber. Call once, first thing in `main()`.
///
/// `RUST_LOG` overrides the built-in `info` default with the usual
/// `EnvFilter` directives, e.g.
/// `RUST_LOG=gasforward_relayer=debug,gasforward_contracts=info`.
pub fn init_logging(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().compact().with_target(true))
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_target(true))
                .init();
        }
    }

    tracing::debug!(?format, "logging initialized");
}
