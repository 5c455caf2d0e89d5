//! The sidechain DB (SCDB): consensus tracking of sidechain withdrawal bundles.
//!
//! Every sidechain proposes withdrawal bundles (WT^s) that have to collect enough workscore within
//! a fixed verification period before they can be paid out. Full nodes track the score and the
//! remaining window of every candidate bundle. Blocks only commit to a hash of that state, so
//! nodes buffer the updates gossiped by peers and replay them until they reproduce the committed
//! hash.
//!
//! The crate is organized bottom-up:
//!
//! - [`state`]: the per-bundle records and the state they live in.
//! - [`ledger`]: workscore updates and pass/fail queries.
//! - [`tracker`]: countdowns, expiry and period boundaries.
//! - [`hasher`]: the commitment to a state.
//! - [`reconciler`]: candidate search over buffered update packages.
//! - [`machine`] and [`handle`]: the canonical state machine and its thread-safe wrapper.

pub mod errors;
pub mod events;
pub mod handle;
pub mod hasher;
pub mod ledger;
pub mod machine;
pub mod reconciler;
pub mod state;
pub mod tracker;

pub use handle::{BlockOutcome, Scdb};

#[cfg(test)]
mod tests;
