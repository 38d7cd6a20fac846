#![forbid(unsafe_code)]

//! Structured logging facade.
//!
//! With the `tracing` feature enabled this module re-exports the `tracing`
//! macros so downstream crates share one logging dependency. Without it, the
//! placement engine emits nothing and pulls in no logging crates.
//!
//! The `tracing-json` feature adds [`init_json_logging`], which installs a
//! JSON formatter filtered by `RUST_LOG` (falling back to `fluidwrap=info`).

#[cfg(feature = "tracing")]
pub use tracing::{
    debug, debug_span, error, error_span, info, info_span, trace, trace_span, warn, warn_span,
};

/// Target used by the layout engine for its events.
pub const LAYOUT_TARGET: &str = "fluidwrap.layout";

/// Target used for drag-session events.
pub const DRAG_TARGET: &str = "fluidwrap.drag";

/// Default directive applied when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "fluidwrap=info";

/// Install a global JSON subscriber.
///
/// Returns `false` if a global subscriber was already installed.
#[cfg(feature = "tracing-json")]
pub fn init_json_logging() -> bool {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
