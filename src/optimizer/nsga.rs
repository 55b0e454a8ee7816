//! NSGA-II over the discrete design space.

use std::{collections::HashSet, sync::Arc};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use typed_builder::TypedBuilder;

use super::{evaluate_genotypes, extract_front, generation_stats, report};
use crate::{
  codec::{Codec, Genotype},
  config::EngineConfig,
  context::{CancellationToken, RunContext},
  crowding::{crowding_distances, distances_by_front, CrowdingDistance},
  error::EngineError,
  front::{compare_scores, ParetoFront},
  mutation::ResetMutation,
  optimizer::{Optimizer, RunReport},
  oracle::Oracle,
  population::Population,
  problem::ProblemDefinition,
  recombination::UniformCrossover,
  selection::BinaryTournament,
  sorting::Ranking,
  stats::{GenerationStats, RunLog, StopReason},
  termination::ConvergenceController,
};

/// Draws per population slot before the initial population is topped up by
/// enumeration.
const SAMPLING_ATTEMPTS: usize = 100;

/// Statistics and front of one completed generation.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct GenerationSnapshot {
  pub stats: GenerationStats,
  pub front: ParetoFront,
}

/// NSGA-II search engine.
///
/// The engine starts lazily: the problem and configuration are validated and
/// the initial population is evaluated on the first call to
/// [`generations`](Self::generations), [`finish`](Self::finish) or
/// [`optimize`](Optimizer::optimize).
///
/// # Examples
/// ```
/// use std::collections::BTreeMap;
///
/// use beam_pareto::prelude::*;
///
/// # let problem = ProblemDefinition::builder()
/// #   .span(5000)
/// #   .loading(Loading { moment: 120.0, shear: 80.0 })
/// #   .materials(Materials {
/// #     concrete_grades: vec![25, 40],
/// #     steel_grades: vec![500],
/// #   })
/// #   .geometry(
/// #     GeometryBounds::builder()
/// #       .width([230, 300])
/// #       .depth(DiscreteRange::new(350, 500, 50)?)
/// #       .bar_count([3, 4, 5])
/// #       .bar_diameter([16, 20])
/// #       .stirrup_diameter([8])
/// #       .stirrup_spacing([150])
/// #       .build(),
/// #   )
/// #   .cost_rates(
/// #     CostRates::builder()
/// #       .concrete_per_m3(BTreeMap::from([(25, 5500.0), (40, 7000.0)]))
/// #       .steel_per_kg(75.0)
/// #       .formwork_per_m2(450.0)
/// #       .labor_per_kg(12.0)
/// #       .build(),
/// #   )
/// #   .carbon_rates(
/// #     CarbonRates::builder()
/// #       .concrete_per_m3(BTreeMap::from([(25, 280.0), (40, 390.0)]))
/// #       .steel_per_kg(1.9)
/// #       .build(),
/// #   )
/// #   .build();
/// let oracle = ScreeningOracle::new(&problem);
/// let mut engine = Nsga2::builder()
///   .problem(problem)
///   .oracle(oracle)
///   .config(
///     EngineConfig::builder()
///       .population_size(20)
///       .max_generations(5)
///       .build(),
///   )
///   .build();
///
/// for snapshot in engine.generations()? {
///   let stats = &snapshot.stats;
///   println!("{}: {} designs", stats.generation, snapshot.front.len());
/// }
/// let report = engine.finish()?;
/// assert!(report.complete);
/// # Ok::<(), EngineError>(())
/// ```
#[derive(TypedBuilder)]
pub struct Nsga2<O: Oracle + 'static> {
  #[builder(setter(transform = |problem: ProblemDefinition| Arc::new(problem)))]
  problem: Arc<ProblemDefinition>,
  #[builder(setter(transform = |oracle: O| Arc::new(oracle)))]
  oracle: Arc<O>,
  #[builder(default)]
  config: EngineConfig,
  #[builder(default)]
  cancellation: CancellationToken,
  #[builder(setter(skip), default)]
  run: Option<Box<Run<O>>>,
}

impl<O: Oracle + 'static> Nsga2<O> {
  /// A token that cancels this engine between generations.
  pub fn cancellation_token(&self) -> CancellationToken {
    self.cancellation.clone()
  }

  /// Generation-by-generation view of the run. The first item is
  /// generation 0, the evaluated initial population.
  ///
  /// The run advances one generation per item. Dropping the iterator pauses
  /// the run; calling this again resumes it from the same state. The
  /// iterator ends when a stop condition holds or the run was cancelled.
  pub fn generations(&mut self) -> Result<Generations<'_, O>, EngineError> {
    let run = match self.run.take() {
      Some(run) => run,
      None => Box::new(Run::start(&self.problem, &self.oracle, &self.config)?),
    };
    Ok(Generations {
      run: self.run.insert(run),
      cancellation: &self.cancellation,
    })
  }

  /// Consumes the engine and extracts the final front. A run that has not
  /// reached a stop condition yet is reported as cancelled and incomplete.
  pub fn finish(mut self) -> Result<RunReport, EngineError> {
    let mut run = match self.run.take() {
      Some(run) => run,
      None => Box::new(Run::start(&self.problem, &self.oracle, &self.config)?),
    };
    let stop_reason = match run.log.stop_reason() {
      Some(reason) => reason,
      None => {
        info!(generation = run.generation, "run finished before stopping");
        run.log.stop(StopReason::Cancelled, false);
        StopReason::Cancelled
      }
    };
    let front = run.front();
    let Run { context, log, .. } = *run;
    report(
      &context.evaluator,
      front,
      log,
      stop_reason,
      self.config.diagnostic_count,
    )
  }
}

impl<O: Oracle + 'static> Optimizer for Nsga2<O> {
  fn optimize(mut self) -> Result<RunReport, EngineError> {
    self.generations()?.for_each(drop);
    self.finish()
  }
}

/// Iterator over completed generations. See [`Nsga2::generations`].
pub struct Generations<'a, O: Oracle + 'static> {
  run: &'a mut Run<O>,
  cancellation: &'a CancellationToken,
}

impl<O: Oracle + 'static> Iterator for Generations<'_, O> {
  type Item = GenerationSnapshot;

  fn next(&mut self) -> Option<Self::Item> {
    if !self.run.reported {
      self.run.reported = true;
      return self.run.snapshot();
    }
    if self.run.log.stop_reason().is_some() {
      return None;
    }
    if self.cancellation.is_cancelled() {
      info!(generation = self.run.generation, "run cancelled");
      self.run.log.stop(StopReason::Cancelled, false);
      return None;
    }
    self.run.evolve();
    self.run.reported = true;
    self.run.snapshot()
  }
}

/// State of a started run.
struct Run<O> {
  context: RunContext<O>,
  codec: Codec,
  population: Population,
  ranking: Ranking,
  crowding: Vec<CrowdingDistance>,
  controller: ConvergenceController,
  selection: BinaryTournament,
  crossover: UniformCrossover,
  mutation: ResetMutation,
  log: RunLog,
  generation: usize,
  population_size: usize,
  dedup_epsilon: f64,
  /// Whether the current generation was yielded already.
  reported: bool,
}

impl<O: Oracle + 'static> Run<O> {
  /// Validates the inputs and evaluates generation 0.
  #[instrument(
    name = "nsga2",
    skip_all,
    fields(population = config.population_size, seed = config.seed)
  )]
  fn start(
    problem: &Arc<ProblemDefinition>,
    oracle: &Arc<O>,
    config: &EngineConfig,
  ) -> Result<Self, EngineError> {
    config.validate()?;
    problem.validate()?;

    let codec = Codec::new(problem);
    let cardinality = codec.cardinality();
    let population_size = match usize::try_from(cardinality) {
      Ok(cardinality) if cardinality < config.population_size => {
        warn!(
          cardinality,
          requested = config.population_size,
          "design space is smaller than the population, capping population"
        );
        cardinality
      }
      _ => config.population_size,
    };

    let mut context =
      RunContext::new(Arc::clone(problem), Arc::clone(oracle), config);
    let genotypes =
      initial_genotypes(&codec, population_size, &mut context.rng);
    let population: Population =
      evaluate_genotypes(&codec, &mut context.evaluator, genotypes)
        .into_iter()
        .collect();

    let mut run = Self {
      context,
      codec,
      population,
      ranking: Ranking::default(),
      crowding: Vec::new(),
      controller: ConvergenceController::from_config(config),
      selection: BinaryTournament,
      crossover: UniformCrossover::new(config.crossover_probability),
      mutation: ResetMutation::new(config.mutation_probability),
      log: RunLog::default(),
      generation: 0,
      population_size,
      dedup_epsilon: config.dedup_epsilon,
      reported: false,
    };
    run.rank_and_record();
    Ok(run)
  }

  /// One select, recombine, mutate, evaluate and survive cycle.
  #[instrument(
    level = "debug",
    skip_all,
    fields(generation = self.generation + 1)
  )]
  fn evolve(&mut self) {
    let n = self.population_size;
    let rng = &mut self.context.rng;
    let parents = self.selection.select(
      self.ranking.ranks(),
      &self.crowding,
      2 * n.div_ceil(2),
      rng,
    );
    let members = self.population.members();
    let mut offspring: Vec<Genotype> = Vec::with_capacity(parents.len());
    for pair in parents.chunks_exact(2) {
      offspring.extend(self.crossover.recombine(
        &members[pair[0]].genotype,
        &members[pair[1]].genotype,
        rng,
      ));
    }
    offspring.truncate(n);
    for genotype in &mut offspring {
      self.mutation.mutate(genotype, &self.codec, rng);
    }

    let children =
      evaluate_genotypes(&self.codec, &mut self.context.evaluator, offspring);
    let mut pool = std::mem::take(&mut self.population);
    pool.extend(children);
    debug!(pool = pool.len(), "merged parents and offspring");

    self.population = survive(pool, n);
    self.generation += 1;
    self.rank_and_record();
  }

  fn rank_and_record(&mut self) {
    self.ranking = self.population.rank();
    self.crowding =
      distances_by_front(&self.ranking, &self.population.scores());
    self.reported = false;

    let Some(stats) = generation_stats(
      self.generation,
      &self.population,
      &self.ranking,
      self.context.evaluator.evaluated(),
    ) else {
      return;
    };
    debug!(
      generation = self.generation,
      best_cost = stats.best_cost,
      front = stats.front_size,
      feasible = stats.feasible_count,
      "generation complete"
    );
    let stop = self.controller.observe(self.generation, stats.spread);
    self.log.push(stats);
    if let Some(reason) = stop {
      info!(generation = self.generation, %reason, "run stopped");
      self.log.stop(reason, true);
    }
  }

  fn front(&self) -> ParetoFront {
    extract_front(&self.population, &self.ranking, self.dedup_epsilon)
  }

  fn snapshot(&self) -> Option<GenerationSnapshot> {
    Some(GenerationSnapshot {
      stats: self.log.last()?.clone(),
      front: self.front(),
    })
  }
}

/// Distinct random genotypes, or the whole design space when it is not
/// larger than `size`.
fn initial_genotypes<R: Rng>(
  codec: &Codec,
  size: usize,
  rng: &mut R,
) -> Vec<Genotype> {
  if codec.cardinality() <= size as u128 {
    return codec.genotypes().collect();
  }
  let mut seen = HashSet::with_capacity(size);
  let mut genotypes = Vec::with_capacity(size);
  for _ in 0..size.saturating_mul(SAMPLING_ATTEMPTS) {
    if genotypes.len() == size {
      break;
    }
    let genotype = codec.random_genotype(rng);
    if seen.insert(genotype) {
      genotypes.push(genotype);
    }
  }
  if genotypes.len() < size {
    debug!(sampled = genotypes.len(), "topping up initial population");
    genotypes.extend(
      codec
        .genotypes()
        .filter(|genotype| !seen.contains(genotype))
        .take(size - genotypes.len()),
    );
  }
  genotypes
}

/// Elitist survival: fills the next generation front by front and truncates
/// the first front that does not fit by descending crowding distance. Equal
/// distances prefer the lexicographically smaller objective vector, then
/// the smaller candidate.
fn survive(pool: Population, size: usize) -> Population {
  let ranking = pool.rank();
  let scores = pool.scores();
  let members = pool.members();
  let mut chosen = Vec::with_capacity(size);
  for front in ranking.fronts() {
    let room = size - chosen.len();
    if room == 0 {
      break;
    }
    if front.len() <= room {
      chosen.extend_from_slice(front);
      continue;
    }
    let points: Vec<_> = front.iter().map(|&idx| scores[idx]).collect();
    let distances = crowding_distances(&points);
    let mut order: Vec<usize> = (0..front.len()).collect();
    order.sort_by(|&a, &b| {
      distances[b]
        .total_cmp(&distances[a])
        .then_with(|| compare_scores(&points[a], &points[b]))
        .then_with(|| {
          members[front[a]].candidate.cmp(&members[front[b]].candidate)
        })
    });
    chosen.extend(order.into_iter().take(room).map(|k| front[k]));
  }
  pool.select(&chosen)
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use rand::{rngs::StdRng, SeedableRng};

  use super::*;
  use crate::{
    candidate::Candidate,
    evaluation::tests::evaluation,
    oracle::screening::ScreeningOracle,
    population::Member,
    problem::{self, DomainSpec},
  };

  fn sample_engine(config: EngineConfig) -> Nsga2<ScreeningOracle> {
    let problem = problem::tests::sample();
    let oracle = ScreeningOracle::new(&problem);
    Nsga2::builder()
      .problem(problem)
      .oracle(oracle)
      .config(config)
      .build()
  }

  fn member(depth: u32, scores: [f64; 3]) -> Member {
    Member {
      genotype: [0; 9],
      candidate: Candidate {
        depth,
        ..crate::candidate::tests::sample()
      },
      evaluation: Arc::new(evaluation(scores, true, &[])),
    }
  }

  #[test]
  fn test_survival_keeps_best_fronts() {
    let pool: Population = [
      member(350, [1.0, 5.0, 1.0]),
      member(400, [2.0, 2.0, 2.0]),
      member(450, [3.0, 3.0, 3.0]),
      member(500, [5.0, 1.0, 1.0]),
    ]
    .into_iter()
    .collect();
    let survivors = survive(pool, 3);
    let depths: Vec<_> =
      survivors.members().iter().map(|m| m.candidate.depth).collect();
    assert_eq!(depths, [350, 400, 500]);
  }

  #[test]
  fn test_survival_of_one_keeps_cheapest() {
    let pool: Population = [
      member(350, [3.0, 350.0, 1.0]),
      member(400, [1.0, 400.0, 9.0]),
      member(450, [2.0, 450.0, 0.5]),
    ]
    .into_iter()
    .collect();
    let survivors = survive(pool, 1);
    assert_eq!(survivors.members()[0].candidate.depth, 400);
  }

  #[test]
  fn test_initial_genotypes_are_distinct() {
    let codec = Codec::new(&problem::tests::sample());
    let mut rng = StdRng::seed_from_u64(11);
    let genotypes = initial_genotypes(&codec, 90, &mut rng);
    assert_eq!(genotypes.len(), 90);
    assert_eq!(genotypes.iter().collect::<HashSet<_>>().len(), 90);
    assert_eq!(initial_genotypes(&codec, 200, &mut rng).len(), 96);
  }

  #[test]
  fn test_population_is_capped_by_cardinality() {
    let mut problem = problem::tests::sample();
    problem.geometry.depth = DomainSpec::Values(vec![450]);
    problem.geometry.bar_count = DomainSpec::Values(vec![4]);
    problem.geometry.bar_diameter = DomainSpec::Values(vec![16]);
    problem.materials.concrete_grades = vec![25];
    let oracle = ScreeningOracle::new(&problem);
    let mut engine = Nsga2::builder()
      .problem(problem)
      .oracle(oracle)
      .config(EngineConfig::builder().population_size(10).build())
      .build();
    let first = engine.generations().unwrap().next().unwrap();
    assert_eq!(first.stats.generation, 0);
    assert_eq!(first.stats.evaluations, 2);
  }

  #[test]
  fn test_generations_resume() {
    let config = EngineConfig::builder()
      .population_size(16)
      .max_generations(4)
      .seed(3)
      .build();
    let mut engine = sample_engine(config.clone());
    let first: Vec<_> = engine.generations().unwrap().take(2).collect();
    let rest: Vec<_> = engine.generations().unwrap().collect();
    let generations: Vec<_> = first
      .iter()
      .chain(&rest)
      .map(|s| s.stats.generation)
      .collect();
    assert_eq!(generations, [0, 1, 2, 3, 4]);
    assert_eq!(
      rest.last().unwrap().stats.stop_reason,
      Some(StopReason::MaxGenerations)
    );
    assert_eq!(engine.generations().unwrap().count(), 0);

    let report = engine.finish().unwrap();
    assert!(report.complete);
    assert_eq!(report.log.len(), 5);

    let uninterrupted = sample_engine(config).optimize().unwrap();
    assert_eq!(uninterrupted.front, report.front);
    assert_eq!(uninterrupted.log, report.log);
  }

  #[test]
  fn test_finish_before_stop_is_incomplete() {
    let mut engine = sample_engine(
      EngineConfig::builder()
        .population_size(20)
        .max_generations(10)
        .build(),
    );
    assert_eq!(engine.generations().unwrap().take(3).count(), 3);
    let report = engine.finish().unwrap();
    assert!(!report.complete);
    assert_eq!(report.stop_reason, StopReason::Cancelled);
    assert_eq!(report.log.len(), 3);
    assert!(!report.front.is_empty());
  }

  #[test]
  fn test_cancellation_between_generations() {
    let mut engine = sample_engine(
      EngineConfig::builder()
        .population_size(20)
        .max_generations(50)
        .build(),
    );
    let token = engine.cancellation_token();
    let mut seen = 0;
    for snapshot in engine.generations().unwrap() {
      seen += 1;
      if snapshot.stats.generation == 2 {
        token.cancel();
      }
    }
    assert_eq!(seen, 3);
    let report = engine.finish().unwrap();
    assert_eq!(report.stop_reason, StopReason::Cancelled);
    assert!(!report.complete);
    assert_eq!(report.log.stop_reason(), Some(StopReason::Cancelled));
  }

  #[test]
  fn test_invalid_config_is_reported() {
    let mut engine =
      sample_engine(EngineConfig::builder().mutation_probability(2.0).build());
    assert!(matches!(
      engine.generations().err(),
      Some(EngineError::Validation(_))
    ));
  }
}
