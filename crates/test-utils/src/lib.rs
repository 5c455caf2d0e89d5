//! This crate provides fixtures and generators for testing the sidechain DB crates.
//!
//! These are mostly random values of foreign types, where implementing `Arbitrary` is not
//! feasible due to the orphan rule, and small params that make verification periods short enough
//! to walk through in a test.

pub mod arbitrary_generator;
pub mod bitcoin;
pub mod params;
pub mod tx;

pub use self::{
    bitcoin::{generate_scdb_hash, generate_wt_prime},
    params::test_params,
};
