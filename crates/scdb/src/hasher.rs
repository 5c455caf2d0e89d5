//! The commitment to a sidechain DB state.
//!
//! Each record is serialized as
//!
//! ```text
//! sidechain (1) | wt^ hash (32) | workscore (2, LE) | blocks left (2, LE)
//! ```
//!
//! and double-SHA256'd into a leaf. Leaves are taken by ascending sidechain and then insertion
//! order and folded into a Bitcoin-style merkle root, where an odd node is paired with itself.
//! Because that duplication lets `[a, b, c]` and `[a, b, c, c]` share a root, the root is hashed
//! once more together with the number of leaves. The empty state commits to all zeros.

use bitcoin::hashes::{sha256d, Hash, HashEngine};
use scdb_primitives::hashes::ScdbHash;

use crate::state::{SidechainDbState, WtPrimeState};

/// The size of a serialized record.
const LEAF_PREIMAGE_LEN: usize = 1 + 32 + 2 + 2;

/// Computes the commitment to `state`.
pub fn scdb_hash(state: &SidechainDbState) -> ScdbHash {
    let leaves: Vec<sha256d::Hash> = state.iter().map(leaf_hash).collect();
    let leaf_count = leaves.len() as u64;

    match merkle_root(leaves) {
        Some(root) => bind_leaf_count(root, leaf_count),
        None => ScdbHash::all_zeros(),
    }
}

fn bind_leaf_count(root: sha256d::Hash, leaf_count: u64) -> ScdbHash {
    let mut engine = sha256d::Hash::engine();
    engine.input(root.as_byte_array());
    engine.input(&leaf_count.to_le_bytes());

    ScdbHash::from_raw_hash(sha256d::Hash::from_engine(engine))
}

/// Hashes a single record.
pub fn leaf_hash(record: &WtPrimeState) -> sha256d::Hash {
    let mut preimage = [0u8; LEAF_PREIMAGE_LEN];
    preimage[0] = record.sidechain();
    preimage[1..33].copy_from_slice(record.wt_prime().as_byte_array());
    preimage[33..35].copy_from_slice(&record.workscore().to_le_bytes());
    preimage[35..37].copy_from_slice(&record.blocks_left().to_le_bytes());

    sha256d::Hash::hash(&preimage)
}

fn merkle_root(mut level: Vec<sha256d::Hash>) -> Option<sha256d::Hash> {
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| {
                let left = pair[0];
                let right = pair.get(1).copied().unwrap_or(left);

                let mut engine = sha256d::Hash::engine();
                engine.input(left.as_byte_array());
                engine.input(right.as_byte_array());

                sha256d::Hash::from_engine(engine)
            })
            .collect();
    }

    level.pop()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;
    use scdb_test_utils::{generate_wt_prime, test_params};

    use super::*;

    #[test]
    fn empty_state_commits_to_zero() {
        assert_eq!(scdb_hash(&SidechainDbState::new()), ScdbHash::all_zeros());
    }

    #[test]
    fn identical_states_hash_identically() {
        let params = test_params();
        let wts: Vec<_> = (0..5).map(|_| generate_wt_prime()).collect();

        let build = || {
            let mut state = SidechainDbState::new();
            for (i, wt) in wts.iter().enumerate() {
                let sidechain = params.sidechain((i % 3) as u8).unwrap();
                state.apply_score(sidechain, *wt, i as i32);
            }
            state.tick();
            state
        };

        assert_eq!(scdb_hash(&build()), scdb_hash(&build()));
    }

    #[test]
    fn every_field_changes_the_hash() {
        let params = test_params();
        let sidechain = params.sidechain(0).unwrap();
        let wt = generate_wt_prime();

        let mut base = SidechainDbState::new();
        base.apply_score(sidechain, wt, 2);

        let mut scored = base.clone();
        scored.apply_score(sidechain, wt, 3);

        let mut ticked = base.clone();
        ticked.tick();

        let mut grown = base.clone();
        grown.apply_score(sidechain, generate_wt_prime(), 2);

        let mut moved = SidechainDbState::new();
        moved.apply_score(params.sidechain(2).unwrap(), wt, 2);

        let empty = SidechainDbState::new();
        let hashes: HashSet<_> = [&base, &scored, &ticked, &grown, &moved, &empty]
            .into_iter()
            .map(scdb_hash)
            .collect();
        assert_eq!(hashes.len(), 6);
    }

    #[test]
    fn duplicated_odd_leaf_does_not_collide() {
        let params = test_params();
        let wt = [generate_wt_prime(), generate_wt_prime(), generate_wt_prime()];

        let mut three = SidechainDbState::new();
        for (sidechain, wt) in [(0, wt[0]), (0, wt[1]), (1, wt[2])] {
            three.apply_score(params.sidechain(sidechain).unwrap(), wt, 1);
        }

        let leaves: Vec<_> = three.iter().map(leaf_hash).collect();
        let mut padded = leaves.clone();
        padded.push(leaves[2]);

        let root = merkle_root(leaves).unwrap();
        assert_eq!(Some(root), merkle_root(padded));

        assert_eq!(scdb_hash(&three), bind_leaf_count(root, 3));
        assert_ne!(scdb_hash(&three), bind_leaf_count(root, 4));
    }

    #[test]
    fn leaf_layout() {
        let params = test_params();
        let wt = generate_wt_prime();
        let mut state = SidechainDbState::new();
        state.apply_score(params.sidechain(1).unwrap(), wt, 0x0102);
        let record = state.get(1, &wt).unwrap();

        let mut preimage = vec![1u8];
        preimage.extend_from_slice(wt.as_byte_array());
        preimage.extend_from_slice(&record.workscore().to_le_bytes());
        preimage.extend_from_slice(&record.blocks_left().to_le_bytes());

        assert_eq!(leaf_hash(record), sha256d::Hash::hash(&preimage));
    }

    proptest! {
        #[test]
        fn hash_depends_only_on_content(scores in prop::collection::vec(0i32..20, 1..12)) {
            let params = test_params();
            let sidechain = params.sidechain(1).unwrap();
            let wts: Vec<_> = scores.iter().map(|_| generate_wt_prime()).collect();

            let mut a = SidechainDbState::new();
            let mut b = SidechainDbState::new();
            for (wt, score) in wts.iter().zip(&scores) {
                a.apply_score(sidechain, *wt, *score);
                b.apply_score(sidechain, *wt, *score);
            }

            prop_assert_eq!(scdb_hash(&a), scdb_hash(&b));

            b.tick();
            prop_assert_ne!(scdb_hash(&a), scdb_hash(&b));
        }
    }
}
