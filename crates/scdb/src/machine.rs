//! The sidechain DB state machine.
//!
//! [`ScdbSM`] owns the canonical state and the last reconciled height. It is not synchronized
//! itself; [`crate::Scdb`] wraps it for concurrent use. Reconciling is split into a read-only
//! [`ScdbSM::search`] and a mutating [`ScdbSM::commit`] so that candidates can be built without
//! blocking readers.

use std::{collections::BTreeMap, sync::Arc};

use scdb_params::prelude::{ScdbParams, SidechainIdx};
use scdb_primitives::{
    hashes::{ScdbHash, WtPrimeHash},
    scripts::commitments::BundleProposal,
    types::BlockHeight,
    update::UpdatePackage,
};
use tracing::{debug, info, warn};

use crate::{
    errors::{ScdbError, ScdbResult},
    events::ScdbEvent,
    hasher::scdb_hash,
    reconciler::{self, Unmatched},
    state::{CandidateSource, CandidateState, SidechainDbState},
};

/// The canonical sidechain DB and its position in the chain.
#[derive(Debug, Clone)]
pub struct ScdbSM {
    params: Arc<ScdbParams>,
    state: SidechainDbState,
    hash: ScdbHash,

    /// The last reconciled height, `None` until the first block after creation or a reset.
    tip: Option<BlockHeight>,

    /// Failed reconciliation attempts per height.
    stalls: BTreeMap<BlockHeight, u32>,

    /// The height of the last applied period boundary.
    last_boundary: Option<BlockHeight>,
}

impl ScdbSM {
    /// Creates an empty state machine that will accept any height as its first block.
    pub fn new(params: Arc<ScdbParams>) -> Self {
        let state = SidechainDbState::new();
        let hash = scdb_hash(&state);

        Self {
            params,
            state,
            hash,
            tip: None,
            stalls: BTreeMap::new(),
            last_boundary: None,
        }
    }

    /// The consensus params.
    pub fn params(&self) -> &ScdbParams {
        &self.params
    }

    /// The canonical state.
    pub const fn state(&self) -> &SidechainDbState {
        &self.state
    }

    /// The commitment to the canonical state.
    pub const fn scdb_hash(&self) -> ScdbHash {
        self.hash
    }

    /// The last reconciled height.
    pub const fn tip(&self) -> Option<BlockHeight> {
        self.tip
    }

    /// The height that must be processed next, if one is required.
    pub fn next_height(&self) -> Option<BlockHeight> {
        self.tip.map(|tip| tip.saturating_add(1))
    }

    /// Whether a bundle has reached its sidechain's workscore threshold.
    pub fn passes(&self, sidechain: SidechainIdx, wt_prime: &WtPrimeHash) -> bool {
        self.params
            .sidechain(sidechain)
            .is_some_and(|params| self.state.passes(params, wt_prime))
    }

    /// Rejects any height other than the next one.
    pub fn check_height(&self, height: BlockHeight) -> ScdbResult<()> {
        match self.next_height() {
            Some(expected) if expected != height => Err(ScdbError::OutOfOrder {
                expected,
                got: height,
            }),
            _ => Ok(()),
        }
    }

    /// Looks for the buffered candidate that reproduces `expected` at `height`.
    pub fn search(
        &self,
        height: BlockHeight,
        expected: &ScdbHash,
        packages: &[UpdatePackage],
    ) -> ScdbResult<Result<CandidateState, Unmatched>> {
        self.check_height(height)?;

        Ok(reconciler::search(
            &self.state,
            height,
            expected,
            packages,
            &self.params,
        ))
    }

    /// Builds the state that `package` would produce at the next height.
    ///
    /// This is what a block template has to commit to when it includes `package`.
    pub fn predict(&self, package: &UpdatePackage) -> CandidateState {
        let height = self.next_height().unwrap_or(package.height);

        reconciler::build_candidate(
            &self.state,
            height,
            std::slice::from_ref(package),
            CandidateSource::Package(0),
            &self.params,
        )
    }

    /// Makes `candidate` the canonical state.
    ///
    /// The candidate's invariants are checked first; a violation leaves the state untouched.
    pub fn commit(&mut self, candidate: CandidateState) -> ScdbResult<ScdbEvent> {
        self.check_height(candidate.height)?;

        if let Err(violation) = candidate.state.check_invariants(&self.params.sidechains) {
            warn!(height = %candidate.height, %violation, "refusing to commit candidate");
            return Err(violation.into());
        }

        let CandidateState {
            height,
            state,
            hash,
            source,
            expired,
        } = candidate;

        for record in &expired {
            debug!(%height, %record, "wt^ expired");
        }
        info!(%height, %hash, %source, records = state.len(), "reconciled sidechain DB");

        self.state = state;
        self.hash = hash;
        self.tip = Some(height);
        self.stalls = self.stalls.split_off(&height.saturating_add(1));

        Ok(ScdbEvent::Reconciled {
            height,
            hash,
            source,
            expired: expired
                .iter()
                .map(|record| (record.sidechain(), record.wt_prime()))
                .collect(),
        })
    }

    /// Records a failed reconciliation and returns the stall error.
    pub fn record_stall(
        &mut self,
        height: BlockHeight,
        expected: ScdbHash,
        unmatched: Unmatched,
    ) -> ScdbError {
        let attempt = self.stalls.entry(height).or_default();
        *attempt += 1;

        warn!(
            %height,
            %expected,
            candidates_tried = unmatched.candidates_tried,
            attempt = *attempt,
            "reconciliation stalled"
        );

        ScdbError::Stall {
            height,
            expected,
            candidates_tried: unmatched.candidates_tried,
            attempt: *attempt,
        }
    }

    /// Reconciles `height` against its commitment using the buffered `packages`.
    pub fn reconcile(
        &mut self,
        height: BlockHeight,
        expected: ScdbHash,
        packages: &[UpdatePackage],
    ) -> ScdbResult<ScdbEvent> {
        match self.search(height, &expected, packages)? {
            Ok(candidate) => self.commit(candidate),
            Err(unmatched) => Err(self.record_stall(height, expected, unmatched)),
        }
    }

    /// Advances past a block that carries no sidechain DB commitment.
    ///
    /// The state is left as it is; countdowns only move with reconciled updates.
    pub fn skip(&mut self, height: BlockHeight) -> ScdbResult<()> {
        self.check_height(height)?;

        debug!(%height, "block carries no sidechain DB commitment");
        self.tip = Some(height);

        Ok(())
    }

    /// Ends the verification period of the sidechains whose boundary is `height`.
    ///
    /// Must be called for the block that was just processed. Returns an event if any sidechain
    /// reached a boundary. A boundary is applied at most once per height; repeating it is a no-op.
    pub fn period_boundary(
        &mut self,
        height: BlockHeight,
        proposals: &[BundleProposal],
    ) -> ScdbResult<Option<ScdbEvent>> {
        if let Some(tip) = self.tip {
            if tip != height {
                return Err(ScdbError::OutOfOrder {
                    expected: tip,
                    got: height,
                });
            }
        }

        if self.last_boundary == Some(height) {
            debug!(%height, "period boundary already applied");
            return Ok(None);
        }

        let mut state = self.state.clone();
        let outcome = state.period_boundary(height, proposals, &self.params);
        if outcome.is_empty() {
            return Ok(None);
        }

        state.check_invariants(&self.params.sidechains)?;

        info!(
            %height,
            cleared = ?outcome.cleared,
            seeded = outcome.seeded.len(),
            "verification period boundary"
        );

        self.hash = scdb_hash(&state);
        self.state = state;
        self.last_boundary = Some(height);

        Ok(Some(ScdbEvent::PeriodBoundary {
            height,
            cleared: outcome.cleared,
            seeded: outcome.seeded,
        }))
    }

    /// Wipes all records and forgets the chain position.
    pub fn reset(&mut self) -> ScdbEvent {
        info!(tip = ?self.tip, records = self.state.len(), "resetting sidechain DB");

        self.state = SidechainDbState::new();
        self.hash = scdb_hash(&self.state);
        self.tip = None;
        self.stalls.clear();
        self.last_boundary = None;

        ScdbEvent::Reset
    }
}
