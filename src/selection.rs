//! Parent selection.

use std::cmp::Ordering;

use rand::Rng;

use crate::{crowding::CrowdingDistance, sorting::Rank};

/// Binary tournament on `(rank, crowding distance)`.
///
/// Two members are drawn uniformly with replacement. The lower rank wins;
/// on equal ranks the larger crowding distance wins; a full tie goes to the
/// first one drawn.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct BinaryTournament;

impl BinaryTournament {
  /// Selects `count` parent indices.
  ///
  /// # Panics
  ///
  /// Panics if `ranks` is empty or its length differs from `crowding`'s.
  pub fn select<R: Rng>(
    &self,
    ranks: &[Rank],
    crowding: &[CrowdingDistance],
    count: usize,
    rng: &mut R,
  ) -> Vec<usize> {
    assert!(!ranks.is_empty(), "cannot select from an empty population");
    assert_eq!(ranks.len(), crowding.len());
    (0..count)
      .map(|_| {
        let a = rng.gen_range(0..ranks.len());
        let b = rng.gen_range(0..ranks.len());
        match Self::compare(a, b, ranks, crowding) {
          Ordering::Greater => b,
          _ => a,
        }
      })
      .collect()
  }

  /// `Less` when `a` beats `b`.
  fn compare(
    a: usize,
    b: usize,
    ranks: &[Rank],
    crowding: &[CrowdingDistance],
  ) -> Ordering {
    ranks[a]
      .cmp(&ranks[b])
      .then_with(|| crowding[b].total_cmp(&crowding[a]))
  }
}
