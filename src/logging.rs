//! Logging setup for the provider process.
//!
//! All logs are written to **stderr**; stdout is reserved for the handshake
//! line the host parses when it spawns the provider.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: controls log levels (e.g., `info`, `ionoscloud_provider=debug`)

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the default logging subscriber.
///
/// Writes to stderr, respects `RUST_LOG`, and defaults to `info` when
/// `RUST_LOG` is not set.
///
/// # Panics
///
/// Panics if a global subscriber has already been set; use [`try_init`] when
/// initialization may run more than once.
pub fn init() {
    init_with_default("info");
}

/// Initialize logging with a custom default level used when `RUST_LOG`
/// is not set.
pub fn init_with_default(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer())
        .init();
}

/// Try to initialize logging, returning `false` if a subscriber was
/// already set.
pub fn try_init() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer())
        .try_init()
        .is_ok()
}

fn stderr_layer<S>() -> impl tracing_subscriber::Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
}

#[cfg(test)]
mod tests {
    // The global subscriber can only be set once per process, so
    // initialization itself is not unit-tested here.

    use tracing_subscriber::EnvFilter;

    #[test]
    fn test_env_filter_parsing() {
        assert!(EnvFilter::try_new("info").is_ok());
        assert!(EnvFilter::try_new("debug").is_ok());
        assert!(EnvFilter::try_new("ionoscloud_provider=debug").is_ok());
        assert!(EnvFilter::try_new("warn,ionoscloud_provider=debug").is_ok());
    }
}
