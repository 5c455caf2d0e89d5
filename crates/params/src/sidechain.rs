//! Params related to the registered sidechains.
//!
//! Every sidechain carries its own verification period and pass threshold. These are looked up by
//! [`SidechainIdx`] from a [`SidechainTable`] wherever a per-sidechain decision is made.

use std::collections::{btree_map, BTreeMap};

use serde::{Deserialize, Serialize};

use crate::{
    default::{MIN_WORKSCORE, SIDECHAINS, VERIFICATION_PERIOD},
    errors::{ParamsError, ParamsResult},
    types::SidechainIdx,
};

/// The consensus parameters of a single registered sidechain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidechainParams {
    /// The index of the sidechain.
    pub idx: SidechainIdx,

    /// A human-readable name, only used for logging.
    pub name: String,

    /// The number of blocks during which withdrawal bundles of this sidechain accumulate
    /// workscore.
    ///
    /// This is also the upper bound of both the workscore and the countdown of a bundle.
    #[serde(default = "default_verification_period")]
    pub verification_period: u16,

    /// The workscore a bundle must reach within the verification period to pass.
    #[serde(default = "default_min_workscore")]
    pub min_workscore: u16,
}

const fn default_verification_period() -> u16 {
    VERIFICATION_PERIOD
}

const fn default_min_workscore() -> u16 {
    MIN_WORKSCORE
}

impl SidechainParams {
    /// Creates the params of a sidechain with the default period and threshold.
    pub fn new(idx: SidechainIdx, name: impl Into<String>) -> Self {
        Self {
            idx,
            name: name.into(),
            verification_period: VERIFICATION_PERIOD,
            min_workscore: MIN_WORKSCORE,
        }
    }

    /// Overrides the verification period and the pass threshold.
    ///
    /// Useful for a builder pattern with dotchaining.
    pub const fn with_period(mut self, verification_period: u16, min_workscore: u16) -> Self {
        self.verification_period = verification_period;
        self.min_workscore = min_workscore;
        self
    }

    /// Checks that the threshold is reachable within the period.
    pub fn validate(&self) -> ParamsResult<()> {
        if self.verification_period == 0 {
            return Err(ParamsError::EmptyVerificationPeriod(self.idx));
        }

        if self.min_workscore == 0 {
            return Err(ParamsError::ZeroThreshold(self.idx));
        }

        if self.min_workscore > self.verification_period {
            return Err(ParamsError::UnreachableThreshold {
                idx: self.idx,
                min_workscore: self.min_workscore,
                period: self.verification_period,
            });
        }

        Ok(())
    }

    /// Returns true if a verification period of this sidechain ends at `height`.
    ///
    /// Periods are aligned to multiples of the period length; genesis never closes a period.
    pub const fn period_elapses_at(&self, height: u64) -> bool {
        height > 0 && height % self.verification_period as u64 == 0
    }
}

/// The table of all registered sidechains, ordered by index.
///
/// Serialized as a list of [`SidechainParams`] so that it reads naturally as `[[sidechains]]`
/// entries in a TOML file. Deserialization validates every entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<SidechainParams>", into = "Vec<SidechainParams>")]
pub struct SidechainTable(BTreeMap<SidechainIdx, SidechainParams>);

impl SidechainTable {
    /// Builds a validated table from a list of sidechain params.
    pub fn new(sidechains: impl IntoIterator<Item = SidechainParams>) -> ParamsResult<Self> {
        let mut table = BTreeMap::new();

        for sidechain in sidechains {
            sidechain.validate()?;

            let idx = sidechain.idx;
            if table.insert(idx, sidechain).is_some() {
                return Err(ParamsError::DuplicateSidechain(idx));
            }
        }

        Ok(Self(table))
    }

    /// Returns the params of the sidechain at `idx`, if it is registered.
    pub fn get(&self, idx: SidechainIdx) -> Option<&SidechainParams> {
        self.0.get(&idx)
    }

    /// Returns true if a sidechain is registered at `idx`.
    pub fn contains(&self, idx: SidechainIdx) -> bool {
        self.0.contains_key(&idx)
    }

    /// Iterates over the registered sidechains in ascending index order.
    pub fn iter(&self) -> btree_map::Values<'_, SidechainIdx, SidechainParams> {
        self.0.values()
    }

    /// Returns the number of registered sidechains.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no sidechain is registered.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for SidechainTable {
    fn default() -> Self {
        Self(
            SIDECHAINS
                .iter()
                .map(|(idx, name)| (*idx, SidechainParams::new(*idx, *name)))
                .collect(),
        )
    }
}

impl TryFrom<Vec<SidechainParams>> for SidechainTable {
    type Error = ParamsError;

    fn try_from(sidechains: Vec<SidechainParams>) -> Result<Self, Self::Error> {
        Self::new(sidechains)
    }
}

impl From<SidechainTable> for Vec<SidechainParams> {
    fn from(table: SidechainTable) -> Self {
        table.0.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_is_valid() {
        let table = SidechainTable::default();
        assert_eq!(table.len(), 3);
        assert!(table.iter().all(|sc| sc.validate().is_ok()));

        let indices: Vec<_> = table.iter().map(|sc| sc.idx).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn rejects_duplicates_and_bad_thresholds() {
        let dup = SidechainTable::new([
            SidechainParams::new(4, "a"),
            SidechainParams::new(4, "b"),
        ]);
        assert_eq!(dup, Err(ParamsError::DuplicateSidechain(4)));

        let unreachable = SidechainTable::new([SidechainParams::new(1, "x").with_period(10, 11)]);
        assert_eq!(
            unreachable,
            Err(ParamsError::UnreachableThreshold {
                idx: 1,
                min_workscore: 11,
                period: 10
            })
        );

        let empty = SidechainTable::new([SidechainParams::new(2, "y").with_period(0, 0)]);
        assert_eq!(empty, Err(ParamsError::EmptyVerificationPeriod(2)));

        let zero = SidechainTable::new([SidechainParams::new(3, "z").with_period(10, 0)]);
        assert_eq!(zero, Err(ParamsError::ZeroThreshold(3)));
    }

    #[test]
    fn period_boundaries() {
        let sc = SidechainParams::new(0, "test").with_period(10, 5);
        assert!(!sc.period_elapses_at(0));
        assert!(!sc.period_elapses_at(9));
        assert!(sc.period_elapses_at(10));
        assert!(!sc.period_elapses_at(11));
        assert!(sc.period_elapses_at(300));
    }
}
