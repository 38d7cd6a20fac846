#![forbid(unsafe_code)]

//! Core: geometry and logging shared by the fluidwrap crates.
//!
//! # Role in fluidwrap
//! `fluidwrap-core` is the leaf crate. It owns the two coordinate spaces the
//! placement engine translates between (host pixels and grid cells) and the
//! optional structured-logging facade.
//!
//! # How it fits in the system
//! `fluidwrap-layout` builds the bit matrix, packer and drag session on top
//! of these types. Hosts only need this crate directly when they construct
//! sizes and pointer positions themselves.

pub mod geometry;
pub mod logging;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{
    debug, debug_span, error, error_span, info, info_span, trace, trace_span, warn, warn_span,
};
