//! Brute-force enumeration of small design spaces.

use std::sync::Arc;

use tracing::{info, instrument};
use typed_builder::TypedBuilder;

use super::{
  evaluate_genotypes, extract_front, generation_stats, report, Optimizer,
  RunReport,
};
use crate::{
  codec::Codec,
  config::EngineConfig,
  error::{EngineError, ValidationError},
  evaluation::Evaluator,
  oracle::Oracle,
  population::Population,
  problem::ProblemDefinition,
  stats::{RunLog, StopReason},
};

/// Evaluates every candidate of the design space once and returns front 0.
///
/// No generations, no operators and no randomness are involved. Fails with
/// [`ValidationError::DomainTooLarge`] when the design space exceeds
/// `config.exhaustive_limit`.
#[derive(TypedBuilder)]
pub struct Exhaustive<O: Oracle + 'static> {
  #[builder(setter(transform = |problem: ProblemDefinition| Arc::new(problem)))]
  problem: Arc<ProblemDefinition>,
  #[builder(setter(transform = |oracle: O| Arc::new(oracle)))]
  oracle: Arc<O>,
  #[builder(default)]
  config: EngineConfig,
}

impl<O: Oracle + 'static> Optimizer for Exhaustive<O> {
  #[instrument(name = "exhaustive", skip_all)]
  fn optimize(self) -> Result<RunReport, EngineError> {
    self.config.validate()?;
    self.problem.validate()?;

    let codec = Codec::new(&self.problem);
    let cardinality = codec.cardinality();
    let limit = u128::from(self.config.exhaustive_limit);
    if cardinality > limit {
      return Err(ValidationError::DomainTooLarge { cardinality, limit }.into());
    }
    info!(cardinality, "enumerating design space");

    let mut evaluator =
      Evaluator::new(self.problem, self.oracle, &self.config);
    let genotypes = codec.genotypes().collect();
    let population: Population =
      evaluate_genotypes(&codec, &mut evaluator, genotypes)
        .into_iter()
        .collect();
    let ranking = population.rank();

    let mut log = RunLog::default();
    if let Some(stats) =
      generation_stats(0, &population, &ranking, evaluator.evaluated())
    {
      log.push(stats);
    }
    log.stop(StopReason::Exhausted, true);
    let front =
      extract_front(&population, &ranking, self.config.dedup_epsilon);
    report(
      &evaluator,
      front,
      log,
      StopReason::Exhausted,
      self.config.diagnostic_count,
    )
  }
}
