//! Enumeration of the candidate package selections for a height.

use crate::state::CandidateSource;

/// Lists the candidates to try for `package_count` buffered packages, in search order.
///
/// The no-update candidate comes first, then every package alone in arrival order, then every
/// combination of 2 up to `max_combination_size` packages in lexicographic order of arrival
/// indices.
pub fn candidate_sources(
    package_count: usize,
    max_combination_size: usize,
) -> impl Iterator<Item = CandidateSource> {
    let singles = (0..package_count).map(CandidateSource::Package);
    let combinations = (2..=max_combination_size.min(package_count))
        .flat_map(move |size| Combinations::new(package_count, size))
        .map(CandidateSource::Combination);

    std::iter::once(CandidateSource::NoUpdate)
        .chain(singles)
        .chain(combinations)
}

/// The `size`-element subsets of `0..n` as ascending index lists, in lexicographic order.
#[derive(Debug, Clone)]
struct Combinations {
    n: usize,
    next: Option<Vec<usize>>,
}

impl Combinations {
    fn new(n: usize, size: usize) -> Self {
        let next = (size > 0 && size <= n).then(|| (0..size).collect());

        Self { n, next }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        let size = current.len();

        // find the rightmost index that can still move right
        let mut successor = current.clone();
        let pivot = (0..size).rev().find(|&i| successor[i] < self.n - size + i);

        if let Some(pivot) = pivot {
            successor[pivot] += 1;
            for i in pivot + 1..size {
                successor[i] = successor[i - 1] + 1;
            }
            self.next = Some(successor);
        }

        Some(current)
    }
}
