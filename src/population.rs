//! Population of evaluated candidates.

use std::{collections::HashSet, sync::Arc};

use crate::{
  candidate::Candidate,
  codec::Genotype,
  evaluation::Evaluation,
  score::{Scores, OBJECTIVE_NUM},
  sorting::{non_dominated_sort, Ranking},
};

/// An evaluated candidate together with the genotype it decodes from.
#[derive(Clone, PartialEq, Debug)]
pub struct Member {
  pub genotype: Genotype,
  pub candidate: Candidate,
  pub evaluation: Arc<Evaluation>,
}

/// Ordered collection of members without duplicate candidates.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Population {
  members: Vec<Member>,
  candidates: HashSet<Candidate>,
}

impl Population {
  pub fn with_capacity(capacity: usize) -> Self {
    Self {
      members: Vec::with_capacity(capacity),
      candidates: HashSet::with_capacity(capacity),
    }
  }

  /// Appends `member` unless its candidate is already present. Returns
  /// whether it was added.
  pub fn insert(&mut self, member: Member) -> bool {
    if !self.candidates.insert(member.candidate) {
      return false;
    }
    self.members.push(member);
    true
  }

  pub fn contains(&self, candidate: &Candidate) -> bool {
    self.candidates.contains(candidate)
  }

  pub fn members(&self) -> &[Member] {
    &self.members
  }

  pub fn len(&self) -> usize {
    self.members.len()
  }

  pub fn is_empty(&self) -> bool {
    self.members.is_empty()
  }

  pub fn feasible_count(&self) -> usize {
    self.members.iter().filter(|m| m.evaluation.feasible).count()
  }

  /// Objective scores of all members in member order.
  pub fn scores(&self) -> Vec<Scores<OBJECTIVE_NUM>> {
    self.members.iter().map(|m| m.evaluation.scores()).collect()
  }

  /// Ranks members under constrained dominance.
  pub fn rank(&self) -> Ranking {
    non_dominated_sort(&self.members, |a, b| {
      a.evaluation.constrained_dominance(&b.evaluation)
    })
  }

  /// Keeps the members at `indices`, in that order.
  pub fn select(self, indices: &[usize]) -> Self {
    let mut slots: Vec<Option<Member>> =
      self.members.into_iter().map(Some).collect();
    let mut selected = Self::with_capacity(indices.len());
    for &idx in indices {
      if let Some(member) = slots.get_mut(idx).and_then(Option::take) {
        selected.insert(member);
      }
    }
    selected
  }
}

impl FromIterator<Member> for Population {
  fn from_iter<I: IntoIterator<Item = Member>>(iter: I) -> Self {
    let mut population = Self::default();
    for member in iter {
      population.insert(member);
    }
    population
  }
}

impl Extend<Member> for Population {
  fn extend<I: IntoIterator<Item = Member>>(&mut self, iter: I) {
    for member in iter {
      self.insert(member);
    }
  }
}
