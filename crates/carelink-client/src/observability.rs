//! Log output for the client.
//!
//! The filter starts from [`LoggingConfig::level`]; a `CARELINK_LOG` directive
//! (e.g. `carelink_client=debug,reqwest=warn`) replaces it. The filter sits
//! behind a reload layer so the level can be changed after startup.

use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

use crate::config::LoggingConfig;

/// Environment variable holding a filter directive that wins over config.
pub const LOG_ENV: &str = "CARELINK_LOG";

static FILTER_HANDLE: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();

fn filter_for(logging: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(logging.level.to_ascii_lowercase()))
}

/// Install the global subscriber. Log lines go to stderr so command output on
/// stdout stays machine-readable. Later calls are no-ops.
pub fn init_tracing(logging: &LoggingConfig) {
    let (filter, handle) = reload::Layer::new(filter_for(logging));
    if FILTER_HANDLE.set(handle).is_err() {
        return;
    }

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

/// Replace the active filter with `directive`.
///
/// Returns `false` if the directive does not parse or [`init_tracing`] has
/// not run.
pub fn apply_logging_level(directive: &str) -> bool {
    let Ok(filter) = EnvFilter::try_new(directive) else {
        return false;
    };
    let Some(handle) = FILTER_HANDLE.get() else {
        return false;
    };
    handle.reload(filter).is_ok()
}
