//! Errors raised while maintaining the sidechain DB.

use scdb_params::prelude::ParamsError;
use scdb_primitives::{
    errors::CommitmentError,
    hashes::{ScdbHash, WtPrimeHash},
    types::{BlockHeight, SidechainIdx},
};
use thiserror::Error;

use crate::events::ScdbEvent;

/// A state that must never be committed.
///
/// These can only arise from a bug in candidate construction, never from peer input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// The same bundle is tracked twice for one sidechain.
    #[error("duplicate record for wt^ {wt_prime} on sidechain {sidechain}")]
    DuplicateRecord {
        /// The sidechain holding the duplicate.
        sidechain: SidechainIdx,
        /// The duplicated bundle.
        wt_prime: WtPrimeHash,
    },

    /// A workscore exceeds the sidechain's verification period.
    #[error("workscore {workscore} of wt^ {wt_prime} exceeds period {period} of sidechain {sidechain}")]
    WorkscoreOutOfDomain {
        /// The sidechain of the record.
        sidechain: SidechainIdx,
        /// The offending bundle.
        wt_prime: WtPrimeHash,
        /// The stored workscore.
        workscore: u16,
        /// The sidechain's verification period.
        period: u16,
    },

    /// A countdown exceeds the sidechain's verification period.
    #[error("blocks left {blocks_left} of wt^ {wt_prime} exceeds period {period} of sidechain {sidechain}")]
    BlocksLeftOutOfDomain {
        /// The sidechain of the record.
        sidechain: SidechainIdx,
        /// The offending bundle.
        wt_prime: WtPrimeHash,
        /// The stored countdown.
        blocks_left: u16,
        /// The sidechain's verification period.
        period: u16,
    },

    /// Records exist for a sidechain that is not in the params.
    #[error("records for unregistered sidechain {0}")]
    UnregisteredSidechain(SidechainIdx),
}

/// Errors that can occur while maintaining the sidechain DB.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScdbError {
    /// The params are not usable.
    #[error("invalid params: {0}")]
    Params(#[from] ParamsError),

    /// No buffered candidate reproduces the block's commitment.
    ///
    /// The canonical state stays at the previous height. Retrying after more packages arrive
    /// starts the search over.
    #[error(
        "stalled at height {height}: none of {candidates_tried} candidates reproduces {expected} (attempt {attempt})"
    )]
    Stall {
        /// The height that could not be reconciled.
        height: BlockHeight,
        /// The commitment carried by the block.
        expected: ScdbHash,
        /// The number of candidate states that were hashed.
        candidates_tried: usize,
        /// How many times reconciling this height has failed so far.
        attempt: u32,
    },

    /// Heights must be reconciled one after another.
    #[error("expected height {expected}, got {got}")]
    OutOfOrder {
        /// The only height that can be processed next.
        expected: BlockHeight,
        /// The height that was requested.
        got: BlockHeight,
    },

    /// The block's coinbase commitments are unusable.
    #[error("bad coinbase: {0}")]
    Commitment(#[from] CommitmentError),

    /// A candidate broke a state invariant and was not committed.
    #[error("invariant violated: {0}")]
    InvariantViolation(#[from] InvariantViolation),
}

impl ScdbError {
    /// Whether the error means the node's state can no longer be trusted.
    ///
    /// Stalls and ordering errors are recoverable by retrying with more data; a broken invariant is
    /// not.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, ScdbError::InvariantViolation(_))
    }

    /// The event that reports this error to subscribers, if it is a stall.
    pub fn stall_event(&self) -> Option<ScdbEvent> {
        match *self {
            ScdbError::Stall {
                height,
                expected,
                candidates_tried,
                attempt,
            } => Some(ScdbEvent::Stalled {
                height,
                expected,
                candidates_tried,
                attempt,
            }),
            _ => None,
        }
    }
}

/// The result type for sidechain DB operations.
pub type ScdbResult<T> = Result<T, ScdbError>;
