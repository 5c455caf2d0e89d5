pub use scdb_params::types::SidechainIdx;

/// Height of a block in the main chain.
pub type BlockHeight = u64;

/// The accumulated approval counter of a withdrawal bundle.
///
/// Bounded by the verification period of the bundle's sidechain.
pub type Workscore = u16;

/// The number of blocks remaining in a withdrawal bundle's verification window.
pub type BlocksLeft = u16;

/// The size in bytes of a sidechain deposit's destination identity (a `HASH160` of a public key).
pub const DESTINATION_SIZE: usize = 20;
