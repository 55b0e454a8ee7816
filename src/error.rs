//! Error types raised by the engine.
//!
//! Oracle-side failures never show up here. The
//! [`OracleAdapter`](crate::oracle::OracleAdapter) turns them into
//! infeasible evaluations.

use crate::{codec::Gene, front::FrontMember, stats::RunLog};

/// A malformed [`ProblemDefinition`](crate::problem::ProblemDefinition) or
/// [`EngineConfig`](crate::config::EngineConfig). Raised before any
/// generation runs.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
  #[error("EmptyDomain: gene {gene} has no values")]
  EmptyDomain { gene: Gene },
  #[error("DuplicateDomainValue: gene {gene} lists {value} more than once")]
  DuplicateDomainValue { gene: Gene, value: u32 },
  #[error("NonPositiveDomainValue: gene {gene} lists a zero value")]
  NonPositiveDomainValue { gene: Gene },
  #[error("UnsupportedLayers: at most 2 bar layers, got {value}")]
  UnsupportedLayers { value: u32 },
  #[error("InvalidRange: min={min}, max={max}, step={step}")]
  InvalidRange { min: u32, max: u32, step: u32 },
  #[error("NonPositive: {field} must be positive, got {value}")]
  NonPositive { field: &'static str, value: f64 },
  #[error("Negative: {field} must not be negative, got {value}")]
  Negative { field: &'static str, value: f64 },
  #[error("BelowOne: {field} must be at least 1, got {value}")]
  BelowOne { field: &'static str, value: f64 },
  #[error("MissingRate: no {table} rate for concrete grade {grade}")]
  MissingRate { table: &'static str, grade: u32 },
  #[error("InvalidProbability: {field} must be within [0, 1], got {value}")]
  InvalidProbability { field: &'static str, value: f64 },
  #[error("InvalidPopulationSize: population size must be at least 1")]
  InvalidPopulationSize,
  #[error(
    "DomainTooLarge: {cardinality} candidates exceed the exhaustive limit of {limit}"
  )]
  DomainTooLarge { cardinality: u128, limit: u128 },
}

impl ValidationError {
  pub(crate) fn positive(field: &'static str, value: f64) -> Result<(), Self> {
    if value > 0.0 && value.is_finite() {
      Ok(())
    } else {
      Err(Self::NonPositive { field, value })
    }
  }

  pub(crate) fn non_negative(
    field: &'static str,
    value: f64,
  ) -> Result<(), Self> {
    if value >= 0.0 && value.is_finite() {
      Ok(())
    } else {
      Err(Self::Negative { field, value })
    }
  }

  pub(crate) fn probability(
    field: &'static str,
    value: f64,
  ) -> Result<(), Self> {
    if (0.0..=1.0).contains(&value) {
      Ok(())
    } else {
      Err(Self::InvalidProbability { field, value })
    }
  }
}

/// A genotype or candidate that falls outside the problem's gene domains.
/// This is a programming-contract violation, never a user error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
  #[error("GeneOutOfRange: gene {gene} index {index} exceeds domain of {len}")]
  GeneOutOfRange { gene: Gene, index: usize, len: usize },
  #[error("ValueNotInDomain: gene {gene} has no value {value}")]
  ValueNotInDomain { gene: Gene, value: u32 },
}

/// Diagnostics attached to [`EngineError::EmptyFeasibleSet`].
#[derive(Debug, Clone)]
pub struct EmptyFeasibleSet {
  /// Evaluated candidates with the smallest total violation, best first.
  pub least_infeasible: Vec<FrontMember>,
  /// Statistics of the run that found nothing feasible.
  pub log: RunLog,
}

/// Terminal errors of a search run.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
  #[error("ValidationError: {0}")]
  Validation(#[from] ValidationError),
  #[error("DomainError: {0}")]
  Domain(#[from] DomainError),
  #[error(
    "EmptyFeasibleSet: no feasible design among evaluated candidates ({} diagnostics attached)",
    .0.least_infeasible.len()
  )]
  EmptyFeasibleSet(Box<EmptyFeasibleSet>),
}
