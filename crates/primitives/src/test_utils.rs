//! Test utilities for the primitives.
//!
//! These are not taken from the `test-utils` crate so that the primitives crate stays free of any
//! dependency on the rest of the workspace.

use bitcoin::{
    hashes::Hash,
    key::rand::{rngs::OsRng, Rng},
    PubkeyHash,
};

use crate::hashes::WtPrimeHash;

fn random_bytes<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    OsRng.fill(&mut bytes[..]);

    bytes
}

/// Generates a random withdrawal bundle hash.
pub(crate) fn generate_wt_prime() -> WtPrimeHash {
    WtPrimeHash::from_byte_array(random_bytes())
}

/// Generates a random deposit destination.
pub(crate) fn generate_destination() -> PubkeyHash {
    PubkeyHash::from_byte_array(random_bytes())
}
