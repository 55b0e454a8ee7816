//! Type aliases for objective scores and Pareto dominance over them.

use std::cmp::Ordering;

/// An alias for a single objective score. Lower is better.
pub type Score = f64;

/// An alias for an array of `N` values of `Score` type.
pub type Scores<const N: usize> = [Score; N];

/// Number of objectives of a beam design: cost, depth and carbon.
pub const OBJECTIVE_NUM: usize = 3;

/// Describes pareto dominance for arrays of `Score`s.
pub trait ParetoDominance {
  /// Returns `Less` if `self` dominates `other`, `Greater` if `other`
  /// dominates `self`, otherwise `Equal`. `self` dominates `other` if no
  /// `self` value is greater than the respective `other` value and at least
  /// one is smaller. Incomparable values (NaN) make the pair non-dominated.
  fn dominance(&self, other: &Self) -> Ordering;

  /// Returns `true` if `self` dominates `other`.
  fn dominates(&self, other: &Self) -> bool {
    self.dominance(other) == Ordering::Less
  }
}

impl ParetoDominance for [Score] {
  fn dominance(&self, other: &Self) -> Ordering {
    let mut ord = Ordering::Equal;
    for (a, b) in self.iter().zip(other) {
      let Some(next_ord) = a.partial_cmp(b) else {
        return Ordering::Equal;
      };
      match (ord, next_ord) {
        (Ordering::Equal, next_ord) => ord = next_ord,
        (Ordering::Greater, Ordering::Less)
        | (Ordering::Less, Ordering::Greater) => return Ordering::Equal,
        _ => {}
      }
    }
    ord
  }
}
