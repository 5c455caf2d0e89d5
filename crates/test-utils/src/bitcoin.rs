//! Random bitcoin-level values.

use bitcoin::{
    hashes::Hash,
    key::rand::{rngs::OsRng, Rng},
};
use scdb_primitives::hashes::{ScdbHash, WtPrimeHash};

/// Generates a random withdrawal bundle hash.
pub fn generate_wt_prime() -> WtPrimeHash {
    let mut hash = [0u8; 32];
    OsRng.fill(&mut hash);

    WtPrimeHash::from_byte_array(hash)
}

/// Generates a random sidechain DB commitment.
pub fn generate_scdb_hash() -> ScdbHash {
    let mut hash = [0u8; 32];
    OsRng.fill(&mut hash);

    ScdbHash::from_byte_array(hash)
}
