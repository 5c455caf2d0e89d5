//! Scenario tests that drive the sidechain DB through whole verification windows.

use std::sync::Arc;

use scdb_primitives::{
    hashes::{ScdbHash, WtPrimeHash},
    types::{BlockHeight, SidechainIdx},
    update::{UpdateMessage, UpdatePackage},
};
use scdb_test_utils::test_params;

use crate::{errors::ScdbResult, events::ScdbEvent, machine::ScdbSM, Scdb};


// ===== Test Constants =====
/// The first height processed in tests, chosen away from any period boundary of the test params.
pub(super) const START_HEIGHT: BlockHeight = 101;
/// The verification period of sidechain 0.
pub(super) const PERIOD: u16 = 10;
/// The pass threshold of sidechain 0.
pub(super) const MIN_WORKSCORE: u16 = 5;

// ===== Helpers =====

/// Creates a state machine over the test params.
pub(super) fn create_sm() -> ScdbSM {
    ScdbSM::new(Arc::new(test_params()))
}

/// Creates a sidechain DB handle over the test params.
pub(super) fn create_scdb() -> Scdb {
    Scdb::new(test_params()).expect("test params must be valid")
}

/// Builds a package from `(sidechain, wt^, score)` triples.
pub(super) fn package(
    height: BlockHeight,
    updates: &[(SidechainIdx, WtPrimeHash, i32)],
) -> UpdatePackage {
    UpdatePackage::new(
        height,
        updates
            .iter()
            .map(|(sidechain, wt_prime, score)| UpdateMessage::new(*sidechain, *wt_prime, *score))
            .collect(),
    )
}

/// The commitment of a block that carries no score changes.
pub(super) fn no_update_commitment(sm: &ScdbSM) -> ScdbHash {
    sm.predict(&UpdatePackage::new(0, Vec::new())).hash
}

/// Mines the next block on `sm`, committing to `updates` the way an honest miner would.
pub(super) fn mine(
    sm: &mut ScdbSM,
    height: BlockHeight,
    updates: &[(SidechainIdx, WtPrimeHash, i32)],
) -> ScdbResult<ScdbEvent> {
    let package = package(height, updates);
    let commitment = sm.predict(&package).hash;

    sm.reconcile(height, commitment, &[package])
}

/// Mines `count` blocks without score changes after `tip`, returning the new tip.
pub(super) fn mine_empty(sm: &mut ScdbSM, tip: BlockHeight, count: u64) -> BlockHeight {
    for height in tip + 1..=tip + count {
        let commitment = no_update_commitment(sm);
        sm.reconcile(height, commitment, &[])
            .expect("no-update block must reconcile");
    }

    tip + count
}
