//! Default values for the sidechain DB consensus parameters.

use crate::types::TAG_SIZE;

/// Default number of blocks during which competing withdrawal bundles accumulate workscore.
pub const VERIFICATION_PERIOD: u16 = 300;

/// Default workscore that a withdrawal bundle must reach within the verification period to pass.
pub const MIN_WORKSCORE: u16 = 100;

/// Default workscore assigned to a withdrawal bundle that is proposed via a coinbase commitment.
pub const INITIAL_WORKSCORE: u16 = 0;

/// Default flag bytes that mark an output script as a sidechain deposit.
pub const DEPOSIT_FLAG: [u8; TAG_SIZE] = [0x0e, 0x0d, 0x0d, 0x0e];

/// Default tag of the coinbase output that commits to the sidechain DB hash.
pub const COMMITMENT_TAG: [u8; TAG_SIZE] = *b"SCDB";

/// Default tag of the coinbase output that proposes a new withdrawal bundle.
pub const BUNDLE_COMMIT_TAG: [u8; TAG_SIZE] = *b"WTPR";

/// Default maximum number of buffered update packages at a single height that are merged together
/// while searching for a candidate that matches a block's commitment.
pub const MAX_COMBINATION_SIZE: usize = 3;

/// Default maximum number of distinct update packages buffered for a single height.
pub const MAX_PACKAGES_PER_HEIGHT: usize = 16;

/// Default number of heights ahead of the last processed block for which update packages are
/// buffered.
pub const MAX_BUFFERED_HEIGHTS: u64 = 16;

/// Default sidechains that are registered at genesis as `(index, name)` pairs.
pub const SIDECHAINS: [(u8, &str); 3] = [(0, "test"), (1, "hivemind"), (2, "wimble")];
