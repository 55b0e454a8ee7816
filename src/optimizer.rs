//! Search drivers and their common report.

pub mod exhaustive;
pub mod nsga;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::{
  candidate::Candidate,
  codec::{Codec, Genotype},
  config::{EngineConfig, SearchMode},
  error::{EmptyFeasibleSet, EngineError},
  evaluation::Evaluator,
  front::{FrontMember, ParetoFront},
  oracle::Oracle,
  population::{Member, Population},
  problem::ProblemDefinition,
  sorting::Ranking,
  stats::{GenerationStats, RunLog, StopReason},
};

use self::{exhaustive::Exhaustive, nsga::Nsga2};

/// Outcome of a finished search.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct RunReport {
  /// Final front, ordered by ascending cost.
  pub front: ParetoFront,
  pub log: RunLog,
  pub stop_reason: StopReason,
  /// `false` when the run was cancelled before a stop condition held.
  pub complete: bool,
}

/// Represents an abstract search driver.
pub trait Optimizer: Sized {
  /// Runs until a stop condition holds, then extracts the final front.
  fn optimize(self) -> Result<RunReport, EngineError>;
}

/// Runs the search selected by `config.mode`.
///
/// [`SearchMode::Auto`] enumerates the design space when its cardinality is
/// within `config.exhaustive_limit` and runs NSGA-II otherwise.
#[instrument(skip_all, fields(mode = ?config.mode, seed = config.seed))]
pub fn search<O: Oracle + 'static>(
  problem: ProblemDefinition,
  config: EngineConfig,
  oracle: O,
) -> Result<RunReport, EngineError> {
  config.validate()?;
  problem.validate()?;
  let exhaustive = match config.mode {
    SearchMode::Genetic => false,
    SearchMode::Exhaustive => true,
    SearchMode::Auto => {
      Codec::new(&problem).cardinality() <= u128::from(config.exhaustive_limit)
    }
  };
  info!(exhaustive, "starting search");
  if exhaustive {
    Exhaustive::builder()
      .problem(problem)
      .oracle(oracle)
      .config(config)
      .build()
      .optimize()
  } else {
    Nsga2::builder()
      .problem(problem)
      .oracle(oracle)
      .config(config)
      .build()
      .optimize()
  }
}

/// Decodes and evaluates genotypes in order. Genotypes outside the design
/// space are skipped.
pub(crate) fn evaluate_genotypes<O: Oracle + 'static>(
  codec: &Codec,
  evaluator: &mut Evaluator<O>,
  genotypes: Vec<Genotype>,
) -> Vec<Member> {
  let decoded: Vec<(Genotype, Candidate)> = genotypes
    .into_iter()
    .filter_map(|genotype| match codec.decode(&genotype) {
      Ok(candidate) => Some((genotype, candidate)),
      Err(err) => {
        warn!(%err, "skipping genotype outside the design space");
        None
      }
    })
    .collect();
  let candidates: Vec<Candidate> = decoded.iter().map(|(_, c)| *c).collect();
  let evaluations = evaluator.evaluate(&candidates);
  decoded
    .into_iter()
    .zip(evaluations)
    .map(|((genotype, candidate), evaluation)| Member {
      genotype,
      candidate,
      evaluation,
    })
    .collect()
}

/// Statistics of a ranked population.
pub(crate) fn generation_stats(
  generation: usize,
  population: &Population,
  ranking: &Ranking,
  evaluations: usize,
) -> Option<GenerationStats> {
  let scores = population.scores();
  let front: Vec<_> =
    ranking.first_front().iter().map(|&idx| scores[idx]).collect();
  GenerationStats::collect(
    generation,
    &front,
    &scores,
    population.feasible_count(),
    evaluations,
  )
}

/// Front 0 of a ranked population.
pub(crate) fn extract_front(
  population: &Population,
  ranking: &Ranking,
  epsilon: f64,
) -> ParetoFront {
  let members = population.members();
  ParetoFront::extract(
    ranking.first_front().iter().map(|&idx| {
      let member = &members[idx];
      (member.candidate, &member.evaluation)
    }),
    epsilon,
  )
}

/// Turns a stopped run into its report, or into
/// [`EngineError::EmptyFeasibleSet`] when nothing feasible was evaluated.
pub(crate) fn report<O: Oracle + 'static>(
  evaluator: &Evaluator<O>,
  front: ParetoFront,
  log: RunLog,
  stop_reason: StopReason,
  diagnostic_count: usize,
) -> Result<RunReport, EngineError> {
  if !evaluator.any_feasible() {
    let least_infeasible: Vec<_> = evaluator
      .least_infeasible(diagnostic_count)
      .into_iter()
      .map(|(candidate, evaluation)| FrontMember::new(candidate, &evaluation))
      .collect();
    warn!(
      evaluated = evaluator.evaluated(),
      "no feasible design was found"
    );
    return Err(EngineError::EmptyFeasibleSet(Box::new(EmptyFeasibleSet {
      least_infeasible,
      log,
    })));
  }
  debug_assert!(front.iter().all(FrontMember::is_feasible));
  info!(front = front.len(), %stop_reason, "front extracted");
  Ok(RunReport {
    front,
    log,
    stop_reason,
    complete: stop_reason != StopReason::Cancelled,
  })
}
