//! Verification windows: countdowns, expiry and period boundaries.

use scdb_params::prelude::{ScdbParams, SidechainTable};
use scdb_primitives::{
    scripts::commitments::BundleProposal,
    types::{BlockHeight, SidechainIdx},
};
use tracing::{debug, warn};

use crate::state::{SidechainDbState, WtPrimeState};

/// What happened at a period boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundaryOutcome {
    /// The sidechains whose period elapsed and whose records were dropped.
    pub cleared: Vec<SidechainIdx>,

    /// The proposals that now start the new period.
    pub seeded: Vec<BundleProposal>,
}

impl BoundaryOutcome {
    /// Whether no sidechain reached a boundary.
    pub fn is_empty(&self) -> bool {
        self.cleared.is_empty() && self.seeded.is_empty()
    }
}

impl SidechainDbState {
    /// Moves every record one block closer to the end of its window.
    ///
    /// Records that have run out stay at zero, and sidechains holding only such records are left
    /// shared with the state this one was cloned from.
    pub fn tick(&mut self) {
        self.for_each_mut_where(
            |record| record.blocks_left() > 0,
            |record| record.set_blocks_left(record.blocks_left() - 1),
        );
    }

    /// Drops the records whose window is over without having reached the threshold.
    ///
    /// Passing records stay until their sidechain's period boundary. Records of unknown
    /// sidechains never pass.
    pub fn expire_zeroed(&mut self, sidechains: &SidechainTable) -> Vec<WtPrimeState> {
        self.extract_if(|record| {
            record.blocks_left() > 0
                || sidechains
                    .get(record.sidechain())
                    .is_some_and(|params| record.workscore() >= params.min_workscore)
        })
    }

    /// Drops the records of every sidechain whose period elapses at `height`.
    ///
    /// Returns the sidechains that reached a boundary, whether or not they had records.
    pub fn clear_elapsed(
        &mut self,
        height: BlockHeight,
        sidechains: &SidechainTable,
    ) -> Vec<SidechainIdx> {
        sidechains
            .iter()
            .filter(|params| params.period_elapses_at(height))
            .map(|params| {
                let dropped = self.clear_sidechain(params.idx);
                debug!(sidechain = params.idx, %height, %dropped, "verification period elapsed");
                params.idx
            })
            .collect()
    }

    /// Starts tracking the proposed bundles of the sidechains listed in `open`.
    ///
    /// Seeded bundles start with the configured initial workscore and a full window. Proposals for
    /// other sidechains and bundles that are already tracked are ignored.
    pub fn seed_proposals(
        &mut self,
        proposals: &[BundleProposal],
        open: &[SidechainIdx],
        params: &ScdbParams,
    ) -> Vec<BundleProposal> {
        let mut seeded = Vec::new();

        for proposal in proposals {
            let Some(sidechain) = params.sidechain(proposal.sidechain) else {
                warn!(
                    sidechain = proposal.sidechain,
                    wt_prime = %proposal.wt_prime,
                    "ignoring proposal for unregistered sidechain"
                );
                continue;
            };

            if !open.contains(&proposal.sidechain)
                || self.get(sidechain.idx, &proposal.wt_prime).is_some()
            {
                continue;
            }

            let initial = params.initial_workscore.min(sidechain.verification_period);
            self.record_mut_or_insert_with(sidechain.idx, proposal.wt_prime, || {
                WtPrimeState::new(
                    sidechain.idx,
                    proposal.wt_prime,
                    initial,
                    sidechain.verification_period,
                )
            });
            seeded.push(*proposal);
        }

        seeded
    }

    /// Handles a block that may end the verification period of some sidechains.
    ///
    /// The elapsed sidechains are cleared first, then their new period is seeded from the bundle
    /// proposals in the block.
    pub fn period_boundary(
        &mut self,
        height: BlockHeight,
        proposals: &[BundleProposal],
        params: &ScdbParams,
    ) -> BoundaryOutcome {
        let cleared = self.clear_elapsed(height, &params.sidechains);
        if cleared.is_empty() {
            return BoundaryOutcome::default();
        }

        let seeded = self.seed_proposals(proposals, &cleared, params);

        BoundaryOutcome { cleared, seeded }
    }
}

#[cfg(test)]
mod tests {
    use scdb_params::prelude::SidechainParams;
    use scdb_test_utils::{generate_wt_prime, test_params};

    use super::*;

    #[test]
    fn tick_decrements_every_record_and_saturates() {
        let params = test_params();
        let mut state = SidechainDbState::new();
        let a = generate_wt_prime();
        let b = generate_wt_prime();
        state.apply_score(params.sidechain(0).unwrap(), a, 1);
        state.apply_score(params.sidechain(1).unwrap(), b, 1);

        state.tick();
        assert_eq!(state.get(0, &a).unwrap().blocks_left(), 9);
        assert_eq!(state.get(1, &b).unwrap().blocks_left(), 19);

        for _ in 0..30 {
            state.tick();
        }
        assert_eq!(state.get(0, &a).unwrap().blocks_left(), 0);
        assert_eq!(state.get(1, &b).unwrap().blocks_left(), 0);
    }

    #[test]
    fn expiry_spares_passing_records() {
        let params = test_params();
        let sidechain = params.sidechain(0).unwrap();
        let mut state = SidechainDbState::new();
        let winner = generate_wt_prime();
        let loser = generate_wt_prime();
        state.apply_score(sidechain, winner, sidechain.min_workscore as i32);
        state.apply_score(sidechain, loser, 1);

        for _ in 0..sidechain.verification_period {
            state.tick();
        }
        let expired = state.expire_zeroed(&params.sidechains);

        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].wt_prime(), loser);
        assert!(state.get(0, &winner).is_some());
        assert!(state.get(0, &loser).is_none());
    }

    #[test]
    fn boundary_clears_only_elapsed_sidechains() {
        let params = test_params();
        let mut state = SidechainDbState::new();
        state.apply_score(params.sidechain(0).unwrap(), generate_wt_prime(), 3);
        state.apply_score(params.sidechain(1).unwrap(), generate_wt_prime(), 3);

        // sidechain 0 has a period of 10, sidechain 1 of 20
        let outcome = state.period_boundary(10, &[], &params);

        assert_eq!(outcome.cleared, vec![0]);
        assert!(state.records(0).is_empty());
        assert_eq!(state.records(1).len(), 1);

        assert!(state.period_boundary(0, &[], &params).is_empty());
        assert!(state.period_boundary(15, &[], &params).is_empty());
    }

    #[test]
    fn boundary_seeds_next_period() {
        let params = test_params();
        let mut state = SidechainDbState::new();
        let proposal = BundleProposal {
            sidechain: 0,
            wt_prime: generate_wt_prime(),
        };
        let not_open = BundleProposal {
            sidechain: 1,
            wt_prime: generate_wt_prime(),
        };
        let unknown = BundleProposal {
            sidechain: 9,
            wt_prime: generate_wt_prime(),
        };

        let proposals = [proposal, proposal, not_open, unknown];
        let outcome = state.period_boundary(10, &proposals, &params);

        assert_eq!(outcome.seeded, vec![proposal]);
        let record = state.get(0, &proposal.wt_prime).unwrap();
        assert_eq!(record.workscore(), params.initial_workscore);
        assert_eq!(record.blocks_left(), 10);
        assert!(state.records(1).is_empty());
    }

    #[test]
    fn unknown_sidechain_records_never_pass() {
        let params = test_params();
        let stray = SidechainParams::new(7, "stray").with_period(1, 1);
        let mut state = SidechainDbState::new();
        state.apply_score(&stray, generate_wt_prime(), 1);
        state.tick();

        assert_eq!(state.expire_zeroed(&params.sidechains).len(), 1);
    }
}
