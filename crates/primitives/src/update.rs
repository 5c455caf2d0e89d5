//! Update messages and packages that peers broadcast to propose the next sidechain DB state.
//!
//! Blocks only commit to the hash of the sidechain DB, never to the score changes themselves. The
//! changes travel separately as [`UpdatePackage`]s and are untrusted until a node finds a package
//! whose application reproduces a block's commitment.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::{
    hashes::WtPrimeHash,
    types::{BlockHeight, SidechainIdx},
};

/// A single proposed workscore for one withdrawal bundle.
///
/// The score is an absolute value, not a delta. It is kept as a signed, unbounded integer because
/// it arrives from the network and is only clamped into the valid domain when applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UpdateMessage {
    /// The sidechain that owns the bundle.
    pub sidechain: SidechainIdx,

    /// The bundle being scored.
    pub wt_prime: WtPrimeHash,

    /// The proposed new total workscore.
    pub workscore: i32,
}

impl UpdateMessage {
    /// Creates a new update message.
    pub const fn new(sidechain: SidechainIdx, wt_prime: WtPrimeHash, workscore: i32) -> Self {
        Self {
            sidechain,
            wt_prime,
            workscore,
        }
    }

    /// The `(sidechain, bundle)` pair that identifies the record this message targets.
    pub const fn key(&self) -> (SidechainIdx, WtPrimeHash) {
        (self.sidechain, self.wt_prime)
    }
}

impl fmt::Display for UpdateMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sidechain {} wt^ {} -> {}",
            self.sidechain, self.wt_prime, self.workscore
        )
    }
}

/// All the score proposals observed for a single block height.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct UpdatePackage {
    /// The height of the block whose commitment this package is meant to reproduce.
    pub height: BlockHeight,

    /// The proposals in the order they were received.
    pub updates: Vec<UpdateMessage>,
}

impl UpdatePackage {
    /// Creates a new package for `height`.
    pub const fn new(height: BlockHeight, updates: Vec<UpdateMessage>) -> Self {
        Self { height, updates }
    }

    /// Returns true if the package proposes no score changes at all.
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Reduces the package to one score per bundle.
    ///
    /// For duplicated bundles the last message in list order wins. The result is keyed by
    /// `(sidechain, bundle)` so that iterating it yields a canonical application order that does
    /// not depend on how the messages were ordered on the wire.
    pub fn reduced(&self) -> BTreeMap<(SidechainIdx, WtPrimeHash), i32> {
        reduce(self.updates.iter())
    }
}

/// Merges the messages of several packages in order, with later messages overriding earlier ones
/// for the same bundle.
pub fn reduce<'a>(
    updates: impl IntoIterator<Item = &'a UpdateMessage>,
) -> BTreeMap<(SidechainIdx, WtPrimeHash), i32> {
    updates
        .into_iter()
        .map(|msg| (msg.key(), msg.workscore))
        .collect()
}
