//! This crate contains the consensus-critical parameters that dictate the behavior of the sidechain
//! DB in a way that ensures that all nodes compute the same withdrawal-bundle state and therefore
//! the same commitment for every block.

pub mod default;
pub mod errors;
pub mod prelude;
pub mod scdb;
pub mod sidechain;
pub mod types;
