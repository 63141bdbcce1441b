//! Tracing subscriber initialization.
//!
//! JSON lines by default, filtered by `RUST_LOG` (falling back to `info`).
//! `GALLEY_LOG_FORMAT=pretty` switches to human-readable output for local runs.

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl LogFormat {
    /// Read `GALLEY_LOG_FORMAT`; anything but `pretty` means JSON.
    pub fn from_env() -> Self {
        match std::env::var("GALLEY_LOG_FORMAT") {
            Ok(v) if v.eq_ignore_ascii_case("pretty") => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

/// Initialize tracing for the process using the environment.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    init_with(LogFormat::from_env());
}

pub fn init_with(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false);

    let installed = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
    if installed.is_ok() {
        tracing::debug!(?format, "tracing initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_harmless() {
        init_with(LogFormat::Json);
        init_with(LogFormat::Pretty);
        tracing::info!(item_id = "abc", "still logging");
    }
}
