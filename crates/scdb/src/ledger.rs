//! Workscore bookkeeping.
//!
//! Scores arrive as absolute values, never as deltas, so applying the same update twice is
//! harmless. Whatever a peer proposes is clamped into `[0, verification period]`.

use scdb_params::prelude::SidechainParams;
use scdb_primitives::{hashes::WtPrimeHash, types::Workscore};
use tracing::trace;

use crate::state::{SidechainDbState, WtPrimeState};

/// Clamps a proposed score into the valid workscore domain of a sidechain.
pub fn clamp_workscore(score: i32, verification_period: u16) -> Workscore {
    score.clamp(0, verification_period as i32) as Workscore
}

impl SidechainDbState {
    /// Sets the workscore of a bundle, starting to track it if it is new.
    ///
    /// A new bundle gets a full verification window. Returns the workscore that was stored.
    pub fn apply_score(
        &mut self,
        sidechain: &SidechainParams,
        wt_prime: WtPrimeHash,
        new_score: i32,
    ) -> Workscore {
        let period = sidechain.verification_period;
        let workscore = clamp_workscore(new_score, period);

        let record = self.record_mut_or_insert_with(sidechain.idx, wt_prime, || {
            trace!(sidechain = sidechain.idx, %wt_prime, "tracking new wt^");
            WtPrimeState::new(sidechain.idx, wt_prime, workscore, period)
        });
        record.set_workscore(workscore);

        workscore
    }

    /// Whether a bundle is tracked and has reached its sidechain's workscore threshold.
    pub fn passes(&self, sidechain: &SidechainParams, wt_prime: &WtPrimeHash) -> bool {
        self.get(sidechain.idx, wt_prime)
            .is_some_and(|record| record.workscore() >= sidechain.min_workscore)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use scdb_test_utils::generate_wt_prime;

    use super::*;

    fn sidechain() -> SidechainParams {
        SidechainParams::new(0, "test").with_period(10, 5)
    }

    #[test]
    fn new_bundle_gets_full_window() {
        let mut state = SidechainDbState::new();
        let wt = generate_wt_prime();

        assert_eq!(state.apply_score(&sidechain(), wt, 3), 3);

        let record = state.get(0, &wt).expect("record must exist");
        assert_eq!(record.workscore(), 3);
        assert_eq!(record.blocks_left(), 10);
    }

    #[test]
    fn scores_are_absolute() {
        let mut state = SidechainDbState::new();
        let wt = generate_wt_prime();

        state.apply_score(&sidechain(), wt, 4);
        state.apply_score(&sidechain(), wt, 4);
        assert_eq!(state.get(0, &wt).unwrap().workscore(), 4);

        state.apply_score(&sidechain(), wt, 1);
        assert_eq!(state.get(0, &wt).unwrap().workscore(), 1);
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn passes_only_at_threshold() {
        let mut state = SidechainDbState::new();
        let wt = generate_wt_prime();

        assert!(!state.passes(&sidechain(), &wt));

        state.apply_score(&sidechain(), wt, 4);
        assert!(!state.passes(&sidechain(), &wt));

        state.apply_score(&sidechain(), wt, 5);
        assert!(state.passes(&sidechain(), &wt));

        let other = SidechainParams::new(1, "other").with_period(10, 5);
        assert!(!state.passes(&other, &wt));
    }

    proptest! {
        #[test]
        fn score_is_always_in_domain(score in any::<i32>(), period in 1u16..=u16::MAX) {
            let clamped = clamp_workscore(score, period);

            prop_assert!(clamped <= period);
            if (0..=period as i32).contains(&score) {
                prop_assert_eq!(clamped as i32, score);
            }
        }
    }
}
