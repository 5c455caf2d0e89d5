//! Thread-safe access to the sidechain DB.

use std::sync::Arc;

use bitcoin::TxOut;
use parking_lot::{Mutex, RwLock, RwLockUpgradableReadGuard, RwLockWriteGuard};
use scdb_params::prelude::{ScdbParams, SidechainIdx};
use scdb_primitives::{
    hashes::{ScdbHash, WtPrimeHash},
    scripts::commitments::{find_bundle_proposals, find_scdb_commitment},
    subscription::{Broadcaster, Subscription},
    types::BlockHeight,
    update::UpdatePackage,
};
use tracing::{debug, warn};

use crate::{
    errors::ScdbResult,
    events::ScdbEvent,
    machine::ScdbSM,
    reconciler::buffer::{BufferOutcome, UpdateBuffer},
    state::SidechainDbState,
};

/// What connecting a block did to the sidechain DB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockOutcome {
    /// The commitment carried by the block, if any.
    pub commitment: Option<ScdbHash>,

    /// The events the block caused, in order.
    pub events: Vec<ScdbEvent>,
}

/// A shareable sidechain DB.
///
/// A single writer reconciles while any number of readers query the canonical state. Building
/// candidates only needs an upgradable read lock, so readers are blocked just for the swap at the
/// end. Update packages are buffered under their own lock and never touch the canonical state.
///
/// Locks are always taken in the order machine, buffer, subscribers.
#[derive(Debug)]
pub struct Scdb {
    machine: RwLock<ScdbSM>,
    buffer: Mutex<UpdateBuffer>,
    subscribers: Mutex<Broadcaster<ScdbEvent>>,
}

impl Scdb {
    /// Creates an empty sidechain DB after validating `params`.
    pub fn new(params: ScdbParams) -> ScdbResult<Self> {
        params.validate()?;
        let buffer = UpdateBuffer::new(params.max_packages_per_height, params.max_buffered_heights);

        Ok(Self {
            machine: RwLock::new(ScdbSM::new(Arc::new(params))),
            buffer: Mutex::new(buffer),
            subscribers: Mutex::new(Broadcaster::default()),
        })
    }

    /// Buffers an update package until the block at its height arrives.
    ///
    /// Packages more than `max_buffered_heights` ahead of the tip are refused.
    pub fn add_update_package(&self, package: UpdatePackage) -> BufferOutcome {
        let machine = self.machine.read();

        if let Some(tip) = machine.tip() {
            if package.height <= tip {
                debug!(height = %package.height, "dropping update package for reconciled height");
                return BufferOutcome::Stale;
            }

            if package.height - tip > machine.params().max_buffered_heights {
                debug!(height = %package.height, %tip, "dropping update package too far ahead");
                return BufferOutcome::TooFar;
            }
        }

        let unknown = package
            .updates
            .iter()
            .filter(|msg| machine.params().sidechain(msg.sidechain).is_none())
            .count();
        if unknown > 0 {
            warn!(
                height = %package.height,
                %unknown,
                "update package targets unregistered sidechains"
            );
        }

        let height = package.height;
        let outcome = self.buffer.lock().add(package);
        match outcome {
            BufferOutcome::Replaced => {
                warn!(%height, "update buffer full at height, dropped the oldest package")
            }
            _ => debug!(%height, ?outcome, "received update package"),
        }

        outcome
    }

    /// Reconciles the block at `height` that commits to `commitment`.
    ///
    /// On success the reconciled state becomes canonical and its hash is returned. On a stall the
    /// canonical state is unchanged and the packages stay buffered for a later retry.
    pub fn reconcile(&self, height: BlockHeight, commitment: ScdbHash) -> ScdbResult<ScdbHash> {
        let machine = self.machine.upgradable_read();
        let (machine, events) = self.reconcile_locked(machine, height, commitment)?;
        let hash = machine.scdb_hash();
        drop(machine);

        self.publish(events);

        Ok(hash)
    }

    /// Processes a connected block given its coinbase outputs.
    ///
    /// The sidechain DB commitment is reconciled if present, then the period boundary of `height`
    /// is applied, seeding the next period from the block's bundle proposals.
    pub fn connect_block(
        &self,
        height: BlockHeight,
        coinbase_outputs: &[TxOut],
    ) -> ScdbResult<BlockOutcome> {
        let machine = self.machine.upgradable_read();
        let commitment = find_scdb_commitment(coinbase_outputs, &machine.params().commitment_tag)?;

        let (mut machine, mut events) = match commitment {
            Some(commitment) => self.reconcile_locked(machine, height, commitment)?,
            None => {
                let mut machine = RwLockUpgradableReadGuard::upgrade(machine);
                machine.skip(height)?;
                self.buffer.lock().prune_through(height);
                (machine, Vec::new())
            }
        };

        let proposals =
            find_bundle_proposals(coinbase_outputs, &machine.params().bundle_commit_tag);
        events.extend(machine.period_boundary(height, &proposals)?);
        drop(machine);

        self.publish(events.clone());

        Ok(BlockOutcome { commitment, events })
    }

    /// Whether a bundle has reached its sidechain's workscore threshold.
    pub fn passes(&self, sidechain: SidechainIdx, wt_prime: &WtPrimeHash) -> bool {
        self.machine.read().passes(sidechain, wt_prime)
    }

    /// A snapshot of the canonical state.
    pub fn state(&self) -> SidechainDbState {
        self.machine.read().state().clone()
    }

    /// The commitment to the canonical state.
    pub fn scdb_hash(&self) -> ScdbHash {
        self.machine.read().scdb_hash()
    }

    /// The commitment a block at the next height must carry to include `package`.
    pub fn predict_commitment(&self, package: &UpdatePackage) -> ScdbHash {
        self.machine.read().predict(package).hash
    }

    /// The last reconciled height.
    pub fn tip(&self) -> Option<BlockHeight> {
        self.machine.read().tip()
    }

    /// The last processed height together with the commitment to the state at that height,
    /// read under a single lock.
    pub fn head(&self) -> (Option<BlockHeight>, ScdbHash) {
        let machine = self.machine.read();

        (machine.tip(), machine.scdb_hash())
    }

    /// The consensus params.
    pub fn params(&self) -> ScdbParams {
        self.machine.read().params().clone()
    }

    /// The number of buffered update packages.
    pub fn buffered_packages(&self) -> usize {
        self.buffer.lock().len()
    }

    /// Wipes the state and every buffered package.
    pub fn reset(&self) {
        let mut machine = self.machine.write();
        let event = machine.reset();
        self.buffer.lock().clear();
        drop(machine);

        self.publish([event]);
    }

    /// Subscribes to the events of this sidechain DB.
    pub fn subscribe(&self) -> Subscription<ScdbEvent> {
        self.subscribers.lock().subscribe()
    }

    /// Searches the buffered packages and commits the match, upgrading to a write lock only for
    /// the commit.
    ///
    /// Returns the write guard so that callers can keep processing the same block atomically.
    fn reconcile_locked<'a>(
        &self,
        machine: RwLockUpgradableReadGuard<'a, ScdbSM>,
        height: BlockHeight,
        commitment: ScdbHash,
    ) -> ScdbResult<(RwLockWriteGuard<'a, ScdbSM>, Vec<ScdbEvent>)> {
        let packages = self.buffer.lock().packages_at(height).to_vec();
        let found = machine.search(height, &commitment, &packages)?;

        let mut machine = RwLockUpgradableReadGuard::upgrade(machine);
        match found {
            Ok(candidate) => {
                let event = machine.commit(candidate)?;
                self.buffer.lock().prune_through(height);

                Ok((machine, vec![event]))
            }
            Err(unmatched) => {
                let err = machine.record_stall(height, commitment, unmatched);
                drop(machine);

                self.publish(err.stall_event());

                Err(err)
            }
        }
    }

    fn publish(&self, events: impl IntoIterator<Item = ScdbEvent>) {
        let mut subscribers = self.subscribers.lock();
        for event in events {
            subscribers.publish(event);
        }
    }
}
