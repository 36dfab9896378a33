//! Tracing subscriber setup.
//!
//! The core crates only emit `tracing` events; applications embedding them
//! call [`init_tracing`] once at start-up.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info,agora=debug";

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` wins over `default_filter`. Calling this more than once is a
/// no-op; the first subscriber stays installed.
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let installed = tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!("tracing initialized");
    }
}
