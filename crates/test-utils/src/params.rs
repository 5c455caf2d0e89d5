//! Params with short verification periods.

use scdb_params::prelude::{ScdbParams, SidechainParams, SidechainTable};

/// The verification period of sidechain 0 in [`test_params`].
pub const SHORT_PERIOD: u16 = 10;

/// Params with three sidechains whose periods are 10, 20 and 30 blocks and whose thresholds are
/// half of that.
///
/// Up to three packages are combined per candidate and eight are buffered per height.
pub fn test_params() -> ScdbParams {
    let sidechains = SidechainTable::new([
        SidechainParams::new(0, "test").with_period(SHORT_PERIOD, SHORT_PERIOD / 2),
        SidechainParams::new(1, "hivemind").with_period(2 * SHORT_PERIOD, SHORT_PERIOD),
        SidechainParams::new(2, "wimble").with_period(3 * SHORT_PERIOD, 3 * SHORT_PERIOD / 2),
    ])
    .expect("test sidechains must be valid");

    ScdbParams {
        max_combination_size: 3,
        max_packages_per_height: 8,
        ..ScdbParams::with_sidechains(sidechains)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_are_valid() {
        let params = test_params();

        assert_eq!(params.validate(), Ok(()));
        assert_eq!(params.sidechain(2).unwrap().min_workscore, 15);
    }
}
