//! Buffer of update packages waiting for their block.

use std::collections::BTreeMap;

use scdb_primitives::{types::BlockHeight, update::UpdatePackage};

/// What happened to a package handed to the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferOutcome {
    /// The package was stored.
    Buffered,

    /// The package was stored after dropping the oldest package of its full height.
    Replaced,

    /// An identical package is already buffered for the same height.
    Duplicate,

    /// The height has already been reconciled.
    Stale,

    /// The height is too far ahead of the last processed block.
    TooFar,
}

/// Update packages keyed by the height they propose a state for, in arrival order.
///
/// At most `max_per_height` packages are kept per height and at most `max_heights` heights are
/// kept at all, so the buffer stays bounded whatever peers send.
#[derive(Debug, Clone)]
pub struct UpdateBuffer {
    packages: BTreeMap<BlockHeight, Vec<UpdatePackage>>,
    max_per_height: usize,
    max_heights: u64,
}

impl UpdateBuffer {
    /// Creates an empty buffer.
    pub const fn new(max_per_height: usize, max_heights: u64) -> Self {
        Self {
            packages: BTreeMap::new(),
            max_per_height,
            max_heights,
        }
    }

    /// Stores a package unless it is a duplicate.
    ///
    /// A full height drops its oldest package, so a rebroadcast always gets in. When all height
    /// slots are taken, a package for a lower height evicts the highest one; a package for a
    /// higher height is refused.
    pub fn add(&mut self, package: UpdatePackage) -> BufferOutcome {
        let height = package.height;

        if !self.packages.contains_key(&height) && self.packages.len() as u64 >= self.max_heights
        {
            match self.packages.last_key_value() {
                Some((&highest, _)) if highest > height => {
                    self.packages.remove(&highest);
                }
                _ => return BufferOutcome::TooFar,
            }
        }

        let buffered = self.packages.entry(height).or_default();

        if buffered.contains(&package) {
            return BufferOutcome::Duplicate;
        }

        let outcome = if buffered.len() >= self.max_per_height {
            buffered.remove(0);
            BufferOutcome::Replaced
        } else {
            BufferOutcome::Buffered
        };
        buffered.push(package);

        outcome
    }

    /// The packages buffered for `height`, in arrival order.
    pub fn packages_at(&self, height: BlockHeight) -> &[UpdatePackage] {
        self.packages
            .get(&height)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Drops every package for `height` and below.
    pub fn prune_through(&mut self, height: BlockHeight) {
        self.packages = self.packages.split_off(&(height.saturating_add(1)));
        if height == BlockHeight::MAX {
            self.packages.clear();
        }
    }

    /// Drops every package.
    pub fn clear(&mut self) {
        self.packages.clear();
    }

    /// The total number of buffered packages.
    pub fn len(&self) -> usize {
        self.packages.values().map(Vec::len).sum()
    }

    /// Whether nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use scdb_primitives::update::UpdateMessage;
    use scdb_test_utils::generate_wt_prime;

    use super::*;

    fn package(height: BlockHeight, score: i32) -> UpdatePackage {
        UpdatePackage::new(height, vec![UpdateMessage::new(0, generate_wt_prime(), score)])
    }

    #[test]
    fn packages_are_kept_in_arrival_order() {
        let mut buffer = UpdateBuffer::new(4, 4);
        let first = package(3, 1);
        let second = package(3, 2);

        assert_eq!(buffer.add(first.clone()), BufferOutcome::Buffered);
        assert_eq!(buffer.add(second.clone()), BufferOutcome::Buffered);
        assert_eq!(buffer.add(package(4, 1)), BufferOutcome::Buffered);

        assert_eq!(buffer.packages_at(3), &[first, second]);
        assert!(buffer.packages_at(5).is_empty());
    }

    #[test]
    fn duplicates_are_refused() {
        let mut buffer = UpdateBuffer::new(2, 4);
        let first = package(1, 1);

        assert_eq!(buffer.add(first.clone()), BufferOutcome::Buffered);
        assert_eq!(buffer.add(first), BufferOutcome::Duplicate);
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn full_height_drops_its_oldest_package() {
        let mut buffer = UpdateBuffer::new(2, 4);
        let second = package(1, 2);
        let third = package(1, 3);

        buffer.add(package(1, 1));
        buffer.add(second.clone());

        assert_eq!(buffer.add(third.clone()), BufferOutcome::Replaced);
        assert_eq!(buffer.packages_at(1), &[second, third]);
        assert_eq!(buffer.add(package(1, 1)), BufferOutcome::Replaced);
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn heights_are_bounded() {
        let mut buffer = UpdateBuffer::new(2, 2);

        assert_eq!(buffer.add(package(5, 1)), BufferOutcome::Buffered);
        assert_eq!(buffer.add(package(9, 1)), BufferOutcome::Buffered);
        assert_eq!(buffer.add(package(12, 1)), BufferOutcome::TooFar);

        // a nearer height pushes out the furthest one
        assert_eq!(buffer.add(package(7, 1)), BufferOutcome::Buffered);
        assert!(buffer.packages_at(9).is_empty());

        // known heights still take packages
        assert_eq!(buffer.add(package(5, 2)), BufferOutcome::Buffered);
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn pruning_drops_reconciled_heights() {
        let mut buffer = UpdateBuffer::new(2, 4);
        for height in 1..=4 {
            buffer.add(package(height, 1));
        }

        buffer.prune_through(2);

        assert!(buffer.packages_at(1).is_empty());
        assert!(buffer.packages_at(2).is_empty());
        assert_eq!(buffer.len(), 2);

        buffer.clear();
        assert!(buffer.is_empty());
    }
}
