/// Tracing subscriber setup
///
/// Filter priority, highest first:
/// 1. `TEMPLATE_DECK_LOG` (per-target directives, e.g. `template_deck=debug,warn`)
/// 2. `RUST_LOG`
/// 3. `log_level` from the config file

use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "TEMPLATE_DECK_LOG";

/// Install the global subscriber. Call once, first thing in `main`.
pub fn init(config_level: &str) {
    let filter = build_env_filter(config_level);

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

fn build_env_filter(config_level: &str) -> EnvFilter {
    if let Ok(directives) = std::env::var(LOG_ENV) {
        if let Ok(filter) = EnvFilter::try_new(&directives) {
            return filter;
        }
    }

    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    EnvFilter::try_new(config_level).unwrap_or_else(|_| EnvFilter::new("info"))
}
