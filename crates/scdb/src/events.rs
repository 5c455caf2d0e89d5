//! Notifications about changes to the canonical sidechain DB state.
//!
//! Events are informational only. Nothing in consensus depends on whether anyone listens.

use std::fmt;

use scdb_primitives::{
    hashes::{ScdbHash, WtPrimeHash},
    scripts::commitments::BundleProposal,
    types::{BlockHeight, SidechainIdx},
};
use serde::Serialize;

use crate::state::CandidateSource;

/// Something that happened to the canonical state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScdbEvent {
    /// A height was reconciled and its state is now canonical.
    Reconciled {
        /// The reconciled height.
        height: BlockHeight,
        /// The commitment of the new state.
        hash: ScdbHash,
        /// The packages the new state was built from.
        source: CandidateSource,
        /// The bundles that expired in the transition.
        expired: Vec<(SidechainIdx, WtPrimeHash)>,
    },

    /// No candidate reproduced a block's commitment.
    Stalled {
        /// The height that could not be reconciled.
        height: BlockHeight,
        /// The commitment carried by the block.
        expected: ScdbHash,
        /// The number of candidates that were tried.
        candidates_tried: usize,
        /// How many times this height has failed so far.
        attempt: u32,
    },

    /// The verification period of some sidechains ended.
    PeriodBoundary {
        /// The height of the boundary block.
        height: BlockHeight,
        /// The sidechains whose records were dropped.
        cleared: Vec<SidechainIdx>,
        /// The proposals that start the next period.
        seeded: Vec<BundleProposal>,
    },

    /// The state was wiped.
    Reset,
}

impl fmt::Display for ScdbEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScdbEvent::Reconciled {
                height,
                source,
                expired,
                ..
            } => write!(
                f,
                "Reconciled height {height} from {source} ({} expired)",
                expired.len()
            ),
            ScdbEvent::Stalled {
                height, attempt, ..
            } => write!(f, "Stalled at height {height} (attempt {attempt})"),
            ScdbEvent::PeriodBoundary {
                height,
                cleared,
                seeded,
            } => write!(
                f,
                "PeriodBoundary at height {height} ({} cleared, {} seeded)",
                cleared.len(),
                seeded.len()
            ),
            ScdbEvent::Reset => write!(f, "Reset"),
        }
    }
}
