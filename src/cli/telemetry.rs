//! Tracing subscriber initialization.

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber.
///
/// Without `-v` flags the `RUST_LOG` filter is honored, defaulting to
/// `info`; `-v` selects `debug` and anything more selects `trace`. Setting
/// `PORDEGO_LOG_FORMAT=json` switches to JSON output.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init(verbosity: u8) -> Result<()> {
    let filter = match verbosity {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    let registry = tracing_subscriber::registry().with(filter);
    if std::env::var("PORDEGO_LOG_FORMAT").is_ok_and(|format| format == "json") {
        registry
            .with(fmt::layer().json())
            .try_init()
            .context("failed to install tracing subscriber")
    } else {
        registry
            .with(fmt::layer())
            .try_init()
            .context("failed to install tracing subscriber")
    }
}
