//! Pareto front extraction.

use std::{cmp::Ordering, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{
  candidate::Candidate,
  evaluation::Evaluation,
  objectives::Objectives,
  score::{Scores, OBJECTIVE_NUM},
};

/// One design of a returned front.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct FrontMember {
  pub candidate: Candidate,
  pub evaluation: Evaluation,
}

impl FrontMember {
  pub fn new(candidate: Candidate, evaluation: &Evaluation) -> Self {
    Self {
      candidate,
      evaluation: evaluation.clone(),
    }
  }

  pub fn objectives(&self) -> &Objectives {
    &self.evaluation.objectives
  }

  pub fn scores(&self) -> Scores<OBJECTIVE_NUM> {
    self.evaluation.scores()
  }

  pub fn is_feasible(&self) -> bool {
    self.evaluation.feasible
  }
}

/// A deduplicated, cost-ordered set of mutually non-dominated designs.
///
/// A front is built once from a ranked population and never modified.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParetoFront {
  members: Vec<FrontMember>,
}

impl ParetoFront {
  /// Builds a front out of mutually non-dominated `members`.
  ///
  /// Two members whose objectives agree within `epsilon` (relative to their
  /// magnitude, at least 1) on every axis are redundant and only the cheaper
  /// one is kept. The result is ordered by ascending cost, ties broken by
  /// the remaining objectives and then by candidate.
  pub fn extract<'a, I>(members: I, epsilon: f64) -> Self
  where
    I: IntoIterator<Item = (Candidate, &'a Arc<Evaluation>)>,
  {
    let mut sorted: Vec<_> = members.into_iter().collect();
    sorted.sort_by(|(a, ea), (b, eb)| {
      compare_scores(&ea.scores(), &eb.scores()).then_with(|| a.cmp(b))
    });

    let mut kept: Vec<FrontMember> = Vec::with_capacity(sorted.len());
    for (candidate, evaluation) in sorted {
      let scores = evaluation.scores();
      if kept
        .iter()
        .any(|member| near(&member.scores(), &scores, epsilon))
      {
        continue;
      }
      kept.push(FrontMember::new(candidate, evaluation));
    }
    Self { members: kept }
  }

  pub fn members(&self) -> &[FrontMember] {
    &self.members
  }

  pub fn iter(&self) -> std::slice::Iter<'_, FrontMember> {
    self.members.iter()
  }

  pub fn len(&self) -> usize {
    self.members.len()
  }

  pub fn is_empty(&self) -> bool {
    self.members.is_empty()
  }

  /// The cheapest member.
  pub fn cheapest(&self) -> Option<&FrontMember> {
    self.members.first()
  }

  pub fn into_members(self) -> Vec<FrontMember> {
    self.members
  }
}

impl IntoIterator for ParetoFront {
  type Item = FrontMember;
  type IntoIter = std::vec::IntoIter<FrontMember>;

  fn into_iter(self) -> Self::IntoIter {
    self.members.into_iter()
  }
}

impl<'a> IntoIterator for &'a ParetoFront {
  type Item = &'a FrontMember;
  type IntoIter = std::slice::Iter<'a, FrontMember>;

  fn into_iter(self) -> Self::IntoIter {
    self.members.iter()
  }
}

/// Lexicographic order of objective vectors, cost first.
pub(crate) fn compare_scores(
  a: &Scores<OBJECTIVE_NUM>,
  b: &Scores<OBJECTIVE_NUM>,
) -> Ordering {
  a.iter()
    .zip(b)
    .map(|(x, y)| x.total_cmp(y))
    .find(|ord| ord.is_ne())
    .unwrap_or(Ordering::Equal)
}

fn near(
  a: &Scores<OBJECTIVE_NUM>,
  b: &Scores<OBJECTIVE_NUM>,
  epsilon: f64,
) -> bool {
  a.iter().zip(b).all(|(x, y)| {
    x == y || (x - y).abs() <= epsilon * x.abs().max(y.abs()).max(1.0)
  })
}
