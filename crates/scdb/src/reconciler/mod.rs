//! Reconciliation of buffered update packages against block commitments.
//!
//! Blocks only carry the hash of the next sidechain DB state. To learn that state, a node replays
//! the buffered packages for the block's height on top of its canonical state and keeps the first
//! candidate whose hash matches. Every candidate is built the same way:
//!
//! 1. merge the selected packages' messages in arrival order, the last score per bundle wins;
//! 2. apply the scores by ascending `(sidechain, wt^)`;
//! 3. advance every countdown by one block;
//! 4. drop the bundles whose window ended without passing.

pub mod buffer;
pub mod candidates;

use scdb_params::prelude::ScdbParams;
use scdb_primitives::{
    hashes::ScdbHash,
    types::BlockHeight,
    update::{reduce, UpdatePackage},
};
use tracing::{debug, trace};

use crate::{
    hasher::scdb_hash,
    state::{CandidateSource, CandidateState, SidechainDbState},
};

/// The result of a search that found no matching candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unmatched {
    /// The number of candidates that were built and hashed.
    pub candidates_tried: usize,
}

/// Builds the candidate state that `source` describes on top of `base`.
///
/// Messages for unregistered sidechains are skipped.
pub fn build_candidate(
    base: &SidechainDbState,
    height: BlockHeight,
    packages: &[UpdatePackage],
    source: CandidateSource,
    params: &ScdbParams,
) -> CandidateState {
    let selected: &[usize] = match &source {
        CandidateSource::NoUpdate => &[],
        CandidateSource::Package(idx) => std::slice::from_ref(idx),
        CandidateSource::Combination(indices) => indices,
    };

    let updates = reduce(
        selected
            .iter()
            .filter_map(|idx| packages.get(*idx))
            .flat_map(|package| package.updates.iter()),
    );

    let mut state = base.clone();
    for ((sidechain, wt_prime), score) in updates {
        let Some(sidechain) = params.sidechain(sidechain) else {
            trace!(%sidechain, %wt_prime, "skipping update for unregistered sidechain");
            continue;
        };

        state.apply_score(sidechain, wt_prime, score);
    }

    state.tick();
    let expired = state.expire_zeroed(&params.sidechains);
    let hash = scdb_hash(&state);

    CandidateState {
        height,
        state,
        hash,
        source,
        expired,
    }
}

/// Finds the first candidate for `height` whose commitment is `expected`.
pub fn search(
    base: &SidechainDbState,
    height: BlockHeight,
    expected: &ScdbHash,
    packages: &[UpdatePackage],
    params: &ScdbParams,
) -> Result<CandidateState, Unmatched> {
    let mut candidates_tried = 0;

    for source in candidates::candidate_sources(packages.len(), params.max_combination_size) {
        let candidate = build_candidate(base, height, packages, source, params);
        candidates_tried += 1;

        if candidate.hash == *expected {
            debug!(
                %height,
                source = %candidate.source,
                %candidates_tried,
                "found matching candidate"
            );
            return Ok(candidate);
        }

        trace!(
            %height,
            source = %candidate.source,
            hash = %candidate.hash,
            "candidate does not match"
        );
    }

    Err(Unmatched { candidates_tried })
}
