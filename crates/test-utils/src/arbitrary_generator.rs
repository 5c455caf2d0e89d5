//! Proptest strategies for sidechain DB values.

use proptest::prelude::*;
use scdb_primitives::{
    hashes::WtPrimeHash,
    types::{BlockHeight, SidechainIdx},
    update::{UpdateMessage, UpdatePackage},
};

/// Generates a message for one of `sidechains` that scores one of `bundles`.
///
/// Scores range beyond the valid domain on both sides.
pub fn arb_update_message(
    sidechains: Vec<SidechainIdx>,
    bundles: Vec<WtPrimeHash>,
) -> impl Strategy<Value = UpdateMessage> {
    (
        prop::sample::select(sidechains),
        prop::sample::select(bundles),
        -50i32..500,
    )
        .prop_map(|(sidechain, wt_prime, score)| UpdateMessage::new(sidechain, wt_prime, score))
}

/// Generates a package of 1 to 8 messages at `height` drawn from a fixed pool of bundles.
pub fn arb_update_package(
    height: BlockHeight,
    sidechains: Vec<SidechainIdx>,
    bundles: Vec<WtPrimeHash>,
) -> impl Strategy<Value = UpdatePackage> {
    prop::collection::vec(arb_update_message(sidechains, bundles), 1..=8)
        .prop_map(move |updates| UpdatePackage::new(height, updates))
}
