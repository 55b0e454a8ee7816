//! Fast non-dominated sorting.

use std::cmp::Ordering;

/// Index of an item in the sorted slice.
type ItemIndex = usize;
/// Number of items dominating an item.
type DominanceCounter = usize;
/// Indices of items dominated by an item.
type DominanceList = Vec<ItemIndex>;

/// Pareto rank. Front 0 is the globally non-dominated set.
pub type Rank = usize;

/// Indices of the items of one front, in ascending index order.
pub type Front = Vec<ItemIndex>;

/// Partition of a slice into successive non-dominated fronts.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Ranking {
  ranks: Vec<Rank>,
  fronts: Vec<Front>,
}

impl Ranking {
  /// Rank of the item at `index`.
  pub fn rank(&self, index: usize) -> Rank {
    self.ranks[index]
  }

  /// Ranks of all items in item order.
  pub fn ranks(&self) -> &[Rank] {
    &self.ranks
  }

  /// Fronts from best to worst.
  pub fn fronts(&self) -> &[Front] {
    &self.fronts
  }

  /// Front 0. Empty only when nothing was sorted.
  pub fn first_front(&self) -> &[ItemIndex] {
    self.fronts.first().map(Vec::as_slice).unwrap_or_default()
  }
}

/// Sorts `items` into fronts by iterative peeling. `dominance` returns
/// `Less` when its first argument dominates the second, `Greater` for the
/// opposite and `Equal` when neither dominates.
pub fn non_dominated_sort<T, F>(items: &[T], dominance: F) -> Ranking
where
  F: Fn(&T, &T) -> Ordering,
{
  let mut dominance_lists: Vec<DominanceList> = vec![Vec::new(); items.len()];
  let mut dominance_counters: Vec<DominanceCounter> = vec![0; items.len()];

  // each unordered pair is compared once
  for p_idx in 0..items.len() {
    for q_idx in p_idx + 1..items.len() {
      match dominance(&items[p_idx], &items[q_idx]) {
        Ordering::Less => {
          dominance_lists[p_idx].push(q_idx);
          dominance_counters[q_idx] += 1;
        }
        Ordering::Greater => {
          dominance_lists[q_idx].push(p_idx);
          dominance_counters[p_idx] += 1;
        }
        Ordering::Equal => {}
      }
    }
  }

  let mut ranks = vec![0; items.len()];
  let mut fronts = Vec::new();
  let mut current: Front = (0..items.len())
    .filter(|&idx| dominance_counters[idx] == 0)
    .collect();
  while !current.is_empty() {
    let mut next = Vec::new();
    for &p_idx in &current {
      ranks[p_idx] = fronts.len();
      for &q_idx in &dominance_lists[p_idx] {
        dominance_counters[q_idx] -= 1;
        if dominance_counters[q_idx] == 0 {
          next.push(q_idx);
        }
      }
    }
    next.sort_unstable();
    fronts.push(std::mem::replace(&mut current, next));
  }

  debug_assert_eq!(
    fronts.iter().map(Vec::len).sum::<usize>(),
    items.len(),
    "every item must land in exactly one front"
  );
  Ranking { ranks, fronts }
}
