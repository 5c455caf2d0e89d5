//! The top-level consensus parameters of the sidechain DB.

use serde::{Deserialize, Serialize};

use crate::{
    default::{
        BUNDLE_COMMIT_TAG, COMMITMENT_TAG, DEPOSIT_FLAG, INITIAL_WORKSCORE, MAX_COMBINATION_SIZE,
        MAX_BUFFERED_HEIGHTS, MAX_PACKAGES_PER_HEIGHT,
    },
    errors::{ParamsError, ParamsResult},
    sidechain::{SidechainParams, SidechainTable},
    types::{SidechainIdx, Tag},
};

/// The parameters that every node must agree upon to compute the same sidechain DB state.
///
/// Apart from the reconciler limits, all of these are consensus-critical: a node with a different
/// sidechain table or different tags will compute different commitments and stall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScdbParams {
    /// The flag bytes that mark an output script as a sidechain deposit.
    pub deposit_flag: Tag,

    /// The tag of the coinbase output that commits to the sidechain DB hash.
    pub commitment_tag: Tag,

    /// The tag of the coinbase output that proposes a withdrawal bundle.
    pub bundle_commit_tag: Tag,

    /// The workscore of a bundle seeded from a coinbase proposal.
    pub initial_workscore: u16,

    /// The maximum number of buffered packages merged into a single candidate.
    ///
    /// Not consensus-critical, it only bounds how hard a node tries before declaring a stall.
    pub max_combination_size: usize,

    /// The maximum number of distinct packages buffered per height.
    ///
    /// Not consensus-critical. Once a height is full, the oldest package makes room for the new
    /// one.
    pub max_packages_per_height: usize,

    /// How many heights ahead of the last processed block packages are buffered for.
    ///
    /// Not consensus-critical. Bounds the buffer together with `max_packages_per_height`.
    #[serde(default = "default_max_buffered_heights")]
    pub max_buffered_heights: u64,

    /// The registered sidechains.
    pub sidechains: SidechainTable,
}

const fn default_max_buffered_heights() -> u64 {
    MAX_BUFFERED_HEIGHTS
}

impl Default for ScdbParams {
    fn default() -> Self {
        Self {
            deposit_flag: Tag::new(DEPOSIT_FLAG),
            commitment_tag: Tag::new(COMMITMENT_TAG),
            bundle_commit_tag: Tag::new(BUNDLE_COMMIT_TAG),
            initial_workscore: INITIAL_WORKSCORE,
            max_combination_size: MAX_COMBINATION_SIZE,
            max_packages_per_height: MAX_PACKAGES_PER_HEIGHT,
            max_buffered_heights: MAX_BUFFERED_HEIGHTS,
            sidechains: SidechainTable::default(),
        }
    }
}

impl ScdbParams {
    /// Creates default params with a custom sidechain table.
    pub fn with_sidechains(sidechains: SidechainTable) -> Self {
        Self {
            sidechains,
            ..Default::default()
        }
    }

    /// Returns the params of the sidechain at `idx`, if it is registered.
    pub fn sidechain(&self, idx: SidechainIdx) -> Option<&SidechainParams> {
        self.sidechains.get(idx)
    }

    /// Validates the cross-field constraints that the sidechain table alone cannot check.
    pub fn validate(&self) -> ParamsResult<()> {
        for sidechain in self.sidechains.iter() {
            sidechain.validate()?;

            if self.initial_workscore >= sidechain.min_workscore {
                return Err(ParamsError::InitialWorkscoreTooHigh {
                    idx: sidechain.idx,
                    initial: self.initial_workscore,
                });
            }
        }

        if self.max_combination_size == 0
            || self.max_packages_per_height == 0
            || self.max_buffered_heights == 0
        {
            return Err(ParamsError::InvalidReconcilerLimits);
        }

        Ok(())
    }

    /// Parses and validates params from a TOML document.
    pub fn from_toml_str(s: &str) -> ParamsResult<Self> {
        let params: Self = toml::from_str(s).map_err(|e| ParamsError::Parse(e.to_string()))?;
        params.validate()?;

        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scdb_params_serde() {
        let params = ScdbParams::default();
        let serialized = toml::to_string(&params).unwrap();

        let deserialized = ScdbParams::from_toml_str(&serialized).unwrap();

        assert_eq!(params, deserialized);

        let params_toml = r#"
            deposit_flag = "0e0d0d0e"
            commitment_tag = "53434442"
            bundle_commit_tag = "57545052"
            initial_workscore = 0
            max_combination_size = 2
            max_packages_per_height = 8

            [[sidechains]]
            idx = 0
            name = "test"

            [[sidechains]]
            idx = 7
            name = "fast"
            verification_period = 10
            min_workscore = 5
        "#;
        let parsed = ScdbParams::from_toml_str(params_toml)
            .expect("must be able to deserialize ScdbParams from a toml");

        assert_eq!(parsed.sidechains.len(), 2);
        assert_eq!(parsed.sidechain(0).unwrap().verification_period, 300);
        assert_eq!(parsed.sidechain(7).unwrap().min_workscore, 5);
        assert_eq!(parsed.deposit_flag, ScdbParams::default().deposit_flag);
        assert_eq!(parsed.max_buffered_heights, MAX_BUFFERED_HEIGHTS);
    }

    #[test]
    fn test_invalid_params_are_rejected() {
        let bad_table = r#"
            deposit_flag = "0e0d0d0e"
            commitment_tag = "53434442"
            bundle_commit_tag = "57545052"
            initial_workscore = 0
            max_combination_size = 2
            max_packages_per_height = 8

            [[sidechains]]
            idx = 1
            name = "broken"
            verification_period = 10
            min_workscore = 20
        "#;
        assert!(ScdbParams::from_toml_str(bad_table).is_err());

        let params = ScdbParams {
            initial_workscore: 100,
            ..Default::default()
        };
        assert_eq!(
            params.validate(),
            Err(ParamsError::InitialWorkscoreTooHigh {
                idx: 0,
                initial: 100
            })
        );

        let params = ScdbParams {
            max_combination_size: 0,
            ..Default::default()
        };
        assert_eq!(params.validate(), Err(ParamsError::InvalidReconcilerLimits));

        let params = ScdbParams {
            max_buffered_heights: 0,
            ..Default::default()
        };
        assert_eq!(params.validate(), Err(ParamsError::InvalidReconcilerLimits));
    }
}
