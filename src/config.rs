//! Engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::error::ValidationError;

/// How candidate evaluations of one generation are executed. Whatever the
/// strategy, results are written back by candidate index, so runs are
/// identical regardless of scheduling.
#[derive(
  Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Execution {
  /// No parallelization involved.
  Sequential,
  /// One [rayon] task per candidate.
  #[default]
  ParallelEach,
  /// Candidates are split into equal batches, one per rayon thread.
  ParallelBatch,
}

/// Which search to run.
#[derive(
  Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
  /// Population-based NSGA-II search.
  #[default]
  Genetic,
  /// Evaluate the whole design space. Fails with
  /// [`ValidationError::DomainTooLarge`] above the exhaustive limit.
  Exhaustive,
  /// Exhaustive when the design space fits the exhaustive limit, genetic
  /// otherwise.
  Auto,
}

/// Tuning parameters of a search run.
///
/// # Examples
/// ```
/// use beam_pareto::config::EngineConfig;
///
/// let config = EngineConfig::builder()
///   .population_size(40)
///   .max_generations(60)
///   .seed(42)
///   .build();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize, TypedBuilder)]
#[serde(default)]
pub struct EngineConfig {
  /// Number of members kept in every generation.
  #[builder(default = 100)]
  pub population_size: usize,
  /// Number of generations after the initial one.
  #[builder(default = 50)]
  pub max_generations: usize,
  /// Probability that a pair of parents is recombined.
  #[builder(default = 0.9)]
  pub crossover_probability: f64,
  /// Per-gene probability of a reset mutation. Genes with a single value
  /// are unaffected, so small design spaces need a high rate to keep
  /// exploring.
  #[builder(default = 0.5)]
  pub mutation_probability: f64,
  /// Relative change of the front spread considered stable.
  #[builder(default = 1e-4)]
  pub convergence_epsilon: f64,
  /// Consecutive stable generations before stopping early. `0`, the
  /// default, disables the early stop and runs the whole budget.
  #[builder(default = 0)]
  pub convergence_window: usize,
  /// Largest design space evaluated exhaustively.
  #[builder(default = 10_000)]
  pub exhaustive_limit: u64,
  /// Seed of the run's random number generator.
  #[builder(default = 0)]
  pub seed: u64,
  /// Deadline of a single oracle call in milliseconds.
  #[builder(default, setter(strip_option))]
  pub oracle_timeout_ms: Option<u64>,
  /// Relative tolerance under which two front members count as duplicates.
  #[builder(default = 1e-9)]
  pub dedup_epsilon: f64,
  /// Number of least-infeasible candidates reported when nothing is
  /// feasible.
  #[builder(default = 5)]
  pub diagnostic_count: usize,
  #[builder(default)]
  pub execution: Execution,
  #[builder(default)]
  pub mode: SearchMode,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self::builder().build()
  }
}

impl EngineConfig {
  /// Checks parameter ranges.
  pub fn validate(&self) -> Result<(), ValidationError> {
    if self.population_size == 0 {
      return Err(ValidationError::InvalidPopulationSize);
    }
    ValidationError::probability(
      "crossover_probability",
      self.crossover_probability,
    )?;
    ValidationError::probability(
      "mutation_probability",
      self.mutation_probability,
    )?;
    ValidationError::non_negative(
      "convergence_epsilon",
      self.convergence_epsilon,
    )?;
    ValidationError::non_negative("dedup_epsilon", self.dedup_epsilon)?;
    if let Some(ms) = self.oracle_timeout_ms {
      ValidationError::positive("oracle_timeout_ms", ms as f64)?;
    }
    Ok(())
  }

  /// Oracle call deadline, if any.
  pub fn oracle_timeout(&self) -> Option<Duration> {
    self.oracle_timeout_ms.map(Duration::from_millis)
  }
}
