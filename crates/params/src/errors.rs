//! Errors for the sidechain DB parameters.

use thiserror::Error;

use crate::types::SidechainIdx;

/// Error while creating or validating a tag.
#[derive(Debug, Clone, Error)]
pub enum TagError {
    /// Tag size is invalid - must be exactly 4 bytes.
    #[error("tag size must be exactly 4 bytes, got {0} bytes")]
    InvalidSize(usize),

    /// Failed to convert byte vector to fixed-size array.
    #[error("failed to convert Vec<u8> to [u8; 4]")]
    ConversionFailed,
}

/// Error while validating the consensus parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamsError {
    /// A sidechain was configured with an empty verification period.
    #[error("sidechain {0} has a verification period of zero blocks")]
    EmptyVerificationPeriod(SidechainIdx),

    /// The pass threshold of a sidechain is not reachable within its verification period.
    #[error("sidechain {idx} requires workscore {min_workscore} but its period is only {period}")]
    UnreachableThreshold {
        /// The index of the misconfigured sidechain.
        idx: SidechainIdx,
        /// The configured pass threshold.
        min_workscore: u16,
        /// The configured verification period.
        period: u16,
    },

    /// A sidechain was configured with a pass threshold of zero, which every bundle meets.
    #[error("sidechain {0} has a pass threshold of zero")]
    ZeroThreshold(SidechainIdx),

    /// The same sidechain index was registered twice.
    #[error("sidechain {0} is registered more than once")]
    DuplicateSidechain(SidechainIdx),

    /// The seeded workscore is above the pass threshold of some sidechain.
    #[error("initial workscore {initial} would immediately pass sidechain {idx}")]
    InitialWorkscoreTooHigh {
        /// The index of the affected sidechain.
        idx: SidechainIdx,
        /// The configured initial workscore.
        initial: u16,
    },

    /// The reconciler limits do not allow any buffered package to be tried.
    #[error("reconciler limits must be non-zero")]
    InvalidReconcilerLimits,

    /// The parameters could not be parsed.
    #[error("failed to parse params: {0}")]
    Parse(String),
}

/// The result type for parameter validation.
pub type ParamsResult<T> = Result<T, ParamsError>;
