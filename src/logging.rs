//! Structured logging setup
//!
//! The library only emits `tracing` events. Binaries call [`init_tracing`]
//! once at startup; everything goes to stderr so stdout stays free for
//! results (and for the MCP transport).

use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError, EnvFilter,
};

/// Filter used with `--verbose` when `RUST_LOG` is unset
const VERBOSE_FILTER: &str = "repotxt=debug,info";
/// Filter used otherwise when `RUST_LOG` is unset
const QUIET_FILTER: &str = "warn";

/// Build the level filter. `RUST_LOG` wins over `verbose`.
pub fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(if verbose { VERBOSE_FILTER } else { QUIET_FILTER }))
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Install a compact stderr subscriber.
///
/// Fails if a global subscriber is already set.
pub fn init_tracing(verbose: bool) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose)
                .with_thread_ids(false)
                .with_line_number(false)
                .with_file(false)
                .compact(),
        )
        .try_init()
}
