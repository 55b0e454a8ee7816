//! Evaluations and the per-run evaluation cache.

use std::{
  cmp::Ordering,
  collections::{BTreeMap, HashMap},
  sync::Arc,
};

use itertools::Itertools;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{
  candidate::Candidate,
  config::{EngineConfig, Execution},
  objectives::{ObjectiveEvaluator, Objectives},
  oracle::{Oracle, OracleAdapter},
  problem::ProblemDefinition,
  score::{ParetoDominance, Scores, OBJECTIVE_NUM},
};

/// Objectives, feasibility and constraint margins of one candidate.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Evaluation {
  pub objectives: Objectives,
  pub feasible: bool,
  /// Signed margin per named check; negative values are violations.
  pub margins: BTreeMap<String, f64>,
}

impl Evaluation {
  /// Objective scores in cost, depth, carbon order.
  pub fn scores(&self) -> Scores<OBJECTIVE_NUM> {
    self.objectives.scores()
  }

  /// Sum of all violations. Infinite if any check failed outright.
  pub fn total_violation(&self) -> f64 {
    self.margins.values().copied().map(violation).sum()
  }

  /// Compares two infeasible evaluations by total violation. The smaller
  /// total dominates; equal totals are mutually non-dominated.
  pub fn violation_dominance(&self, other: &Self) -> Ordering {
    self
      .total_violation()
      .partial_cmp(&other.total_violation())
      .unwrap_or(Ordering::Equal)
  }

  /// Constrained dominance: a feasible evaluation dominates an infeasible
  /// one and two feasible evaluations compare objectives. Two infeasible ones
  /// compare total violations. `Less` means `self` dominates.
  pub fn constrained_dominance(&self, other: &Self) -> Ordering {
    match (self.feasible, other.feasible) {
      (true, true) => self.scores().dominance(&other.scores()),
      (true, false) => Ordering::Less,
      (false, true) => Ordering::Greater,
      (false, false) => self.violation_dominance(other),
    }
  }
}

fn violation(margin: f64) -> f64 {
  if margin < 0.0 {
    -margin
  } else {
    0.0
  }
}

/// Evaluates candidates through the oracle and the objective model and
/// memoizes the result per distinct candidate for the run's lifetime.
pub struct Evaluator<O> {
  problem: Arc<ProblemDefinition>,
  adapter: OracleAdapter<O>,
  execution: Execution,
  cache: HashMap<Candidate, Arc<Evaluation>>,
  any_feasible: bool,
}

impl<O: Oracle + 'static> Evaluator<O> {
  pub fn new(
    problem: Arc<ProblemDefinition>,
    oracle: Arc<O>,
    config: &EngineConfig,
  ) -> Self {
    let adapter =
      OracleAdapter::new(oracle, problem.loading, config.oracle_timeout());
    Self {
      problem,
      adapter,
      execution: config.execution,
      cache: HashMap::new(),
      any_feasible: false,
    }
  }

  /// Returns one evaluation per candidate, in candidate order. Only
  /// candidates never seen before reach the oracle.
  #[instrument(
    level = "debug",
    skip_all,
    fields(candidates = candidates.len())
  )]
  pub fn evaluate(
    &mut self,
    candidates: &[Candidate],
  ) -> Vec<Arc<Evaluation>> {
    let pending = candidates
      .iter()
      .filter(|c| !self.cache.contains_key(*c))
      .unique()
      .copied()
      .collect::<Vec<_>>();
    debug!(fresh = pending.len(), cached = self.cache.len(), "evaluating");

    let fresh = self.execute(&pending);
    for (candidate, evaluation) in pending.into_iter().zip(fresh) {
      self.any_feasible |= evaluation.feasible;
      self.cache.insert(candidate, Arc::new(evaluation));
    }
    candidates
      .iter()
      .map(|c| Arc::clone(&self.cache[c]))
      .collect()
  }

  fn execute(&self, candidates: &[Candidate]) -> Vec<Evaluation> {
    match self.execution {
      Execution::Sequential => {
        candidates.iter().map(|c| self.evaluate_one(c)).collect()
      }
      Execution::ParallelEach => {
        candidates.par_iter().map(|c| self.evaluate_one(c)).collect()
      }
      Execution::ParallelBatch => {
        let chunk_size =
          (candidates.len() / rayon::current_num_threads()).max(1);
        candidates
          .par_chunks(chunk_size)
          .flat_map_iter(|chunk| chunk.iter().map(|c| self.evaluate_one(c)))
          .collect()
      }
    }
  }

  fn evaluate_one(&self, candidate: &Candidate) -> Evaluation {
    let compliance = self.adapter.check(candidate);
    Evaluation {
      objectives: ObjectiveEvaluator::new(&self.problem).evaluate(candidate),
      feasible: compliance.feasible,
      margins: compliance.margins,
    }
  }

  /// Number of distinct candidates evaluated so far.
  pub fn evaluated(&self) -> usize {
    self.cache.len()
  }

  /// Whether any evaluated candidate was feasible.
  pub fn any_feasible(&self) -> bool {
    self.any_feasible
  }

  /// Up to `count` evaluated candidates with the smallest total violation,
  /// ties broken by candidate order.
  pub fn least_infeasible(
    &self,
    count: usize,
  ) -> Vec<(Candidate, Arc<Evaluation>)> {
    self
      .cache
      .iter()
      .filter(|(_, e)| !e.feasible)
      .sorted_by(|(a, ea), (b, eb)| {
        ea.total_violation()
          .total_cmp(&eb.total_violation())
          .then_with(|| a.cmp(b))
      })
      .take(count)
      .map(|(c, e)| (*c, Arc::clone(e)))
      .collect()
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

  use super::*;
  use crate::{
    candidate,
    oracle::{ComplianceResult, OracleError},
    problem::{self, Loading},
    sorting::non_dominated_sort,
  };

  pub(crate) fn evaluation(
    scores: [f64; 3],
    feasible: bool,
    margins: &[(&str, f64)],
  ) -> Evaluation {
    Evaluation {
      objectives: Objectives {
        cost: scores[0],
        depth: scores[1],
        carbon: scores[2],
      },
      feasible,
      margins: margins.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
    }
  }

  #[test]
  fn test_constrained_dominance() {
    let good = evaluation([1.0, 1.0, 1.0], true, &[]);
    let worse = evaluation([2.0, 1.0, 1.0], true, &[]);
    let bad = evaluation([0.0, 0.0, 0.0], false, &[("flexure", -0.1)]);
    let awful = evaluation([0.0, 0.0, 0.0], false, &[("flexure", -0.5)]);
    assert_eq!(good.constrained_dominance(&worse), Ordering::Less);
    assert_eq!(worse.constrained_dominance(&bad), Ordering::Less);
    assert_eq!(bad.constrained_dominance(&good), Ordering::Greater);
    assert_eq!(bad.constrained_dominance(&awful), Ordering::Less);
  }

  #[test]
  fn test_smaller_total_violation_dominates() {
    let slight = evaluation([0.0; 3], false, &[("shear", -0.1)]);
    let gross = evaluation([0.0; 3], false, &[("flexure", -5.0)]);
    assert_eq!(slight.violation_dominance(&gross), Ordering::Less);
    assert_eq!(gross.constrained_dominance(&slight), Ordering::Greater);
    let split = evaluation(
      [0.0; 3],
      false,
      &[("flexure", -0.25), ("shear", -0.25), ("span", 0.3)],
    );
    let single = evaluation([9.0; 3], false, &[("deflection", -0.5)]);
    assert_eq!(split.violation_dominance(&single), Ordering::Equal);
  }

  #[test]
  fn test_oracle_failure_ranks_behind_finite_violations() {
    let failed = evaluation(
      [0.0; 3],
      false,
      &[("oracle_failure", f64::NEG_INFINITY)],
    );
    let barely = evaluation([9.0; 3], false, &[("flexure", -0.01)]);
    let badly = evaluation([9.0; 3], false, &[("flexure", -1e6)]);
    assert_eq!(barely.constrained_dominance(&failed), Ordering::Less);
    assert_eq!(badly.constrained_dominance(&failed), Ordering::Less);
    assert_eq!(failed.constrained_dominance(&failed), Ordering::Equal);

    let items = [failed, barely, badly];
    let ranking =
      non_dominated_sort(&items, |a, b| a.constrained_dominance(b));
    assert_eq!(ranking.fronts(), &[vec![1], vec![2], vec![0]]);
  }

  #[test]
  fn test_total_violation() {
    let e = evaluation([0.0; 3], false, &[("a", -0.25), ("b", 0.5), ("c", -1.0)]);
    assert_eq!(e.total_violation(), 1.25);
    let failed = evaluation([0.0; 3], false, &[("oracle_failure", f64::NEG_INFINITY)]);
    assert_eq!(failed.total_violation(), f64::INFINITY);
  }

  static CALLS: AtomicUsize = AtomicUsize::new(0);

  fn counting_oracle(
    c: &Candidate,
    _: &Loading,
  ) -> Result<ComplianceResult, OracleError> {
    CALLS.fetch_add(1, AtomicOrdering::SeqCst);
    Ok(ComplianceResult::from_margins([(
      "depth",
      f64::from(c.depth) / 400.0 - 1.0,
    )]))
  }

  #[test]
  fn test_cache_evaluates_once() {
    let problem = Arc::new(problem::tests::sample());
    let config = EngineConfig::builder()
      .execution(Execution::Sequential)
      .build();
    let mut evaluator =
      Evaluator::new(problem, Arc::new(counting_oracle), &config);
    let c = candidate::tests::sample();
    let shallow = Candidate { depth: 350, ..c };
    let before = CALLS.load(AtomicOrdering::SeqCst);
    let first = evaluator.evaluate(&[c, c, shallow]);
    let second = evaluator.evaluate(&[shallow, c]);
    assert_eq!(CALLS.load(AtomicOrdering::SeqCst) - before, 2);
    assert_eq!(evaluator.evaluated(), 2);
    assert_eq!(first[0], second[1]);
    assert_eq!(*first[2], *second[0]);
    assert!(first[0].feasible);
    assert!(!first[2].feasible);
    assert!(evaluator.any_feasible());
    let diagnostics = evaluator.least_infeasible(5);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].0, shallow);
  }

  #[test]
  fn test_execution_strategies_agree() {
    let problem = Arc::new(problem::tests::sample());
    let codec = crate::codec::Codec::new(&problem);
    let candidates = codec
      .genotypes()
      .map(|g| codec.decode(&g).unwrap())
      .collect::<Vec<_>>();
    let results = [
      Execution::Sequential,
      Execution::ParallelEach,
      Execution::ParallelBatch,
    ]
    .map(|execution| {
      let config = EngineConfig::builder().execution(execution).build();
      let oracle = crate::oracle::screening::ScreeningOracle::new(&problem);
      Evaluator::new(Arc::clone(&problem), Arc::new(oracle), &config)
        .evaluate(&candidates)
    });
    assert_eq!(results[0], results[1]);
    assert_eq!(results[0], results[2]);
  }
}
