//! Logging initialization

/// Filter used when `RUST_LOG` is unset or invalid
pub const DEFAULT_LOG_FILTER: &str = "palaver_core=debug,info";

/// Installs a `tracing` fmt subscriber writing to stderr.
///
/// The filter comes from `RUST_LOG`, falling back to [`DEFAULT_LOG_FILTER`]. Calling
/// this more than once, or after another subscriber was installed, does nothing.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .try_init();
}
