//! The sidechain DB state: one record per tracked withdrawal bundle.

use std::{collections::BTreeMap, fmt, sync::Arc};

use scdb_params::prelude::SidechainTable;
use scdb_primitives::{
    hashes::{ScdbHash, WtPrimeHash},
    types::{BlockHeight, BlocksLeft, SidechainIdx, Workscore},
};
use serde::{ser::SerializeMap, Serialize, Serializer};

use crate::errors::InvariantViolation;

/// The tracking record of a single withdrawal bundle (WT^).
///
/// The bundle and its sidechain never change. The workscore is only written by the ledger and the
/// countdown only by the tracker, so neither is settable from outside the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct WtPrimeState {
    sidechain: SidechainIdx,
    wt_prime: WtPrimeHash,
    workscore: Workscore,
    blocks_left: BlocksLeft,
}

impl WtPrimeState {
    pub(crate) const fn new(
        sidechain: SidechainIdx,
        wt_prime: WtPrimeHash,
        workscore: Workscore,
        blocks_left: BlocksLeft,
    ) -> Self {
        Self {
            sidechain,
            wt_prime,
            workscore,
            blocks_left,
        }
    }

    /// The sidechain the bundle withdraws from.
    pub const fn sidechain(&self) -> SidechainIdx {
        self.sidechain
    }

    /// The bundle hash.
    pub const fn wt_prime(&self) -> WtPrimeHash {
        self.wt_prime
    }

    /// The accumulated workscore.
    pub const fn workscore(&self) -> Workscore {
        self.workscore
    }

    /// The number of blocks left in the bundle's verification window.
    pub const fn blocks_left(&self) -> BlocksLeft {
        self.blocks_left
    }

    pub(crate) fn set_workscore(&mut self, workscore: Workscore) {
        self.workscore = workscore;
    }

    pub(crate) fn set_blocks_left(&mut self, blocks_left: BlocksLeft) {
        self.blocks_left = blocks_left;
    }
}

impl fmt::Display for WtPrimeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "wt^ {} (sidechain {}, workscore {}, {} blocks left)",
            self.wt_prime, self.sidechain, self.workscore, self.blocks_left
        )
    }
}

/// All the tracked bundles, grouped by sidechain.
///
/// Each sidechain's records are kept in insertion order, which is the order they are hashed in.
/// The per-sidechain vectors are shared between clones and only copied when written to. Cloning a
/// state is cheap, but every candidate advances the countdowns, which copies each sidechain that
/// still has a record counting down. Only sidechains whose records have all run out (passed
/// bundles waiting for their period boundary) stay shared.
///
/// Sidechains without records have no entry, which keeps equality structural: two states with the
/// same records compare equal no matter how they got there.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SidechainDbState {
    sidechains: BTreeMap<SidechainIdx, Arc<Vec<WtPrimeState>>>,
}

impl SidechainDbState {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the records of `sidechain` in insertion order.
    pub fn records(&self, sidechain: SidechainIdx) -> &[WtPrimeState] {
        self.sidechains
            .get(&sidechain)
            .map(|records| records.as_slice())
            .unwrap_or_default()
    }

    /// Returns the record of a bundle, if it is tracked.
    pub fn get(&self, sidechain: SidechainIdx, wt_prime: &WtPrimeHash) -> Option<&WtPrimeState> {
        self.records(sidechain)
            .iter()
            .find(|record| record.wt_prime == *wt_prime)
    }

    /// Iterates over all records, by ascending sidechain and then insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &WtPrimeState> {
        self.sidechains.values().flat_map(|records| records.iter())
    }

    /// The sidechains that currently have records.
    pub fn sidechains(&self) -> impl Iterator<Item = SidechainIdx> + '_ {
        self.sidechains.keys().copied()
    }

    /// The total number of records.
    pub fn len(&self) -> usize {
        self.sidechains.values().map(|records| records.len()).sum()
    }

    /// Whether no bundle is tracked at all.
    pub fn is_empty(&self) -> bool {
        self.sidechains.is_empty()
    }

    /// Returns a mutable record, creating it with `init` if the bundle is not tracked yet.
    pub(crate) fn record_mut_or_insert_with(
        &mut self,
        sidechain: SidechainIdx,
        wt_prime: WtPrimeHash,
        init: impl FnOnce() -> WtPrimeState,
    ) -> &mut WtPrimeState {
        let records = Arc::make_mut(self.sidechains.entry(sidechain).or_default());

        match records.iter().position(|record| record.wt_prime == wt_prime) {
            Some(pos) => &mut records[pos],
            None => {
                records.push(init());
                let last = records.len() - 1;
                &mut records[last]
            }
        }
    }

    /// Applies `f` to every record matching `filter`.
    ///
    /// Sidechains without a matching record are not copied.
    pub(crate) fn for_each_mut_where(
        &mut self,
        filter: impl Fn(&WtPrimeState) -> bool,
        mut f: impl FnMut(&mut WtPrimeState),
    ) {
        for records in self.sidechains.values_mut() {
            if !records.iter().any(&filter) {
                continue;
            }

            Arc::make_mut(records)
                .iter_mut()
                .filter(|record| filter(record))
                .for_each(&mut f);
        }
    }

    /// Removes the records for which `keep` returns false and returns them.
    pub(crate) fn extract_if(
        &mut self,
        mut keep: impl FnMut(&WtPrimeState) -> bool,
    ) -> Vec<WtPrimeState> {
        let mut removed = Vec::new();

        for records in self.sidechains.values_mut() {
            if records.iter().all(&mut keep) {
                continue;
            }

            Arc::make_mut(records).retain(|record| {
                let kept = keep(record);
                if !kept {
                    removed.push(*record);
                }
                kept
            });
        }

        self.sidechains.retain(|_, records| !records.is_empty());

        removed
    }

    /// Drops every record of `sidechain` and returns how many there were.
    pub(crate) fn clear_sidechain(&mut self, sidechain: SidechainIdx) -> usize {
        self.sidechains
            .remove(&sidechain)
            .map(|records| records.len())
            .unwrap_or_default()
    }

    /// Checks the invariants that every committed state must hold.
    pub fn check_invariants(&self, sidechains: &SidechainTable) -> Result<(), InvariantViolation> {
        for (idx, records) in &self.sidechains {
            let params = sidechains
                .get(*idx)
                .ok_or(InvariantViolation::UnregisteredSidechain(*idx))?;
            let period = params.verification_period;

            for (pos, record) in records.iter().enumerate() {
                if records[..pos]
                    .iter()
                    .any(|other| other.wt_prime == record.wt_prime)
                {
                    return Err(InvariantViolation::DuplicateRecord {
                        sidechain: *idx,
                        wt_prime: record.wt_prime,
                    });
                }

                if record.workscore > period {
                    return Err(InvariantViolation::WorkscoreOutOfDomain {
                        sidechain: *idx,
                        wt_prime: record.wt_prime,
                        workscore: record.workscore,
                        period,
                    });
                }

                if record.blocks_left > period {
                    return Err(InvariantViolation::BlocksLeftOutOfDomain {
                        sidechain: *idx,
                        wt_prime: record.wt_prime,
                        blocks_left: record.blocks_left,
                        period,
                    });
                }
            }
        }

        Ok(())
    }
}

impl Serialize for SidechainDbState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.sidechains.len()))?;
        for (idx, records) in &self.sidechains {
            map.serialize_entry(idx, records.as_slice())?;
        }

        map.end()
    }
}

/// Which buffered packages a candidate state was built from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    /// No score changes; only the countdowns advance.
    NoUpdate,

    /// A single package, by arrival index.
    Package(usize),

    /// Several packages merged in arrival order.
    Combination(Vec<usize>),
}

impl fmt::Display for CandidateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidateSource::NoUpdate => write!(f, "no-update"),
            CandidateSource::Package(idx) => write!(f, "package #{idx}"),
            CandidateSource::Combination(indices) => {
                let indices = indices
                    .iter()
                    .map(|idx| format!("#{idx}"))
                    .collect::<Vec<_>>()
                    .join("+");
                write!(f, "packages {indices}")
            }
        }
    }
}

/// A possible next state of the sidechain DB, along with its commitment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateState {
    /// The height this candidate would be canonical at.
    pub height: BlockHeight,

    /// The state after the updates, the countdown and expiry.
    pub state: SidechainDbState,

    /// The commitment to `state`.
    pub hash: ScdbHash,

    /// What the candidate was built from.
    pub source: CandidateSource,

    /// The bundles that expired in this transition.
    pub expired: Vec<WtPrimeState>,
}

#[cfg(test)]
mod tests {
    use scdb_params::prelude::{SidechainParams, SidechainTable};
    use scdb_test_utils::generate_wt_prime;

    use super::*;

    fn table() -> SidechainTable {
        SidechainTable::new([SidechainParams::new(0, "test").with_period(10, 5)])
            .expect("table must be valid")
    }

    #[test]
    fn clones_share_untouched_sidechains() {
        let mut state = SidechainDbState::new();
        let wt = generate_wt_prime();
        state.record_mut_or_insert_with(0, wt, || WtPrimeState::new(0, wt, 1, 10));
        state.record_mut_or_insert_with(1, wt, || WtPrimeState::new(1, wt, 1, 10));

        let mut copy = state.clone();
        copy.record_mut_or_insert_with(1, wt, || unreachable!())
            .set_workscore(2);

        assert!(Arc::ptr_eq(&state.sidechains[&0], &copy.sidechains[&0]));
        assert!(!Arc::ptr_eq(&state.sidechains[&1], &copy.sidechains[&1]));
        assert_eq!(state.get(1, &wt).unwrap().workscore(), 1);
        assert_eq!(copy.get(1, &wt).unwrap().workscore(), 2);
    }

    #[test]
    fn tick_only_copies_sidechains_still_counting_down() {
        let mut state = SidechainDbState::new();
        let wt = generate_wt_prime();
        state.record_mut_or_insert_with(0, wt, || WtPrimeState::new(0, wt, 5, 0));
        state.record_mut_or_insert_with(1, wt, || WtPrimeState::new(1, wt, 1, 4));

        let mut candidate = state.clone();
        candidate.tick();

        assert!(Arc::ptr_eq(&state.sidechains[&0], &candidate.sidechains[&0]));
        assert!(!Arc::ptr_eq(&state.sidechains[&1], &candidate.sidechains[&1]));
        assert_eq!(candidate.get(0, &wt).unwrap().blocks_left(), 0);
        assert_eq!(candidate.get(1, &wt).unwrap().blocks_left(), 3);
        assert_eq!(state.get(1, &wt).unwrap().blocks_left(), 4);
    }

    #[test]
    fn emptied_sidechains_are_dropped() {
        let mut state = SidechainDbState::new();
        let wt = generate_wt_prime();
        state.record_mut_or_insert_with(0, wt, || WtPrimeState::new(0, wt, 1, 0));

        let removed = state.extract_if(|record| record.blocks_left() > 0);

        assert_eq!(removed.len(), 1);
        assert!(state.is_empty());
        assert_eq!(state, SidechainDbState::new());
    }

    #[test]
    fn invariants_are_checked() {
        let wt = generate_wt_prime();

        let mut state = SidechainDbState::new();
        state.record_mut_or_insert_with(0, wt, || WtPrimeState::new(0, wt, 10, 10));
        assert_eq!(state.check_invariants(&table()), Ok(()));

        state.record_mut_or_insert_with(0, wt, || unreachable!())
            .set_workscore(11);
        assert!(matches!(
            state.check_invariants(&table()),
            Err(InvariantViolation::WorkscoreOutOfDomain { workscore: 11, .. })
        ));

        let mut state = SidechainDbState::new();
        state.record_mut_or_insert_with(0, wt, || WtPrimeState::new(0, wt, 0, 11));
        assert!(matches!(
            state.check_invariants(&table()),
            Err(InvariantViolation::BlocksLeftOutOfDomain { blocks_left: 11, .. })
        ));

        let mut state = SidechainDbState::new();
        state.record_mut_or_insert_with(3, wt, || WtPrimeState::new(3, wt, 0, 1));
        assert_eq!(
            state.check_invariants(&table()),
            Err(InvariantViolation::UnregisteredSidechain(3))
        );

        let mut state = SidechainDbState::new();
        let records = Arc::make_mut(state.sidechains.entry(0).or_default());
        records.push(WtPrimeState::new(0, wt, 0, 1));
        records.push(WtPrimeState::new(0, wt, 0, 1));
        assert!(matches!(
            state.check_invariants(&table()),
            Err(InvariantViolation::DuplicateRecord { sidechain: 0, .. })
        ));
    }

    #[test]
    fn candidate_source_display() {
        assert_eq!(CandidateSource::NoUpdate.to_string(), "no-update");
        assert_eq!(CandidateSource::Package(2).to_string(), "package #2");
        assert_eq!(
            CandidateSource::Combination(vec![0, 3]).to_string(),
            "packages #0+#3"
        );
    }
}
