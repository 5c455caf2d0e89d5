//! Errors raised while reading sidechain DB data out of coinbase outputs.

use thiserror::Error;

use crate::hashes::ScdbHash;

/// Errors that can occur while extracting the sidechain DB commitment from a block's coinbase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitmentError {
    /// The coinbase carries more than one distinct commitment, so the block does not say which
    /// state it commits to.
    #[error("conflicting sidechain DB commitments {first} and {second} in coinbase")]
    Conflicting {
        /// The first commitment found.
        first: ScdbHash,

        /// The first commitment found that differs from `first`.
        second: ScdbHash,
    },
}

/// The result type for commitment extraction.
pub type CommitmentResult<T> = Result<T, CommitmentError>;
