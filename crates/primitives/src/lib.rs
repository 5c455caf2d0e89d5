//! This crate contains general types, traits and pure functions that need to be shared across
//! the sidechain DB crates.
//!
//! It holds the wire-level shapes (bundle hashes, update messages and packages) and the parsers
//! for the output scripts that feed the sidechain DB: deposits, commitments and bundle proposals.
//! Apart from the params, it does not depend on any other crate in this workspace.

pub mod errors;
pub mod hashes;
pub mod scripts;
pub mod subscription;
pub mod types;
pub mod update;

#[cfg(test)]
mod test_utils;
