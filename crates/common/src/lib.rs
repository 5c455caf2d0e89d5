//! Reusable utils for binaries built on the sidechain DB, such as initializing the tracing
//! framework.

pub mod logging;

// Re-export tracing crate for convenience.
pub use tracing;
