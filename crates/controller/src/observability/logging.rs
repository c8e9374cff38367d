//! # Logging
//!
//! Tracing subscriber setup shared by the binaries.

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "smvctl=info,secret_version_controller=info";

/// Initialize the global tracing subscriber
///
/// `RUST_LOG` takes precedence over `default_filter`. Logs go to stderr so
/// command output on stdout stays machine-readable.
/// Calling this twice is harmless; the second subscriber is ignored.
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
    {
        eprintln!("Tracing subscriber already initialized: {e}");
    }
}
