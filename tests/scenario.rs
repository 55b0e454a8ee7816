mod common;

use beam_pareto::prelude::*;
use common::{
  assert_mutually_non_dominated, candidates, exhaustive_front,
};

fn genetic(config: EngineConfig) -> Result<RunReport, EngineError> {
  let problem = common::scenario();
  let oracle = ScreeningOracle::new(&problem);
  Nsga2::builder()
    .problem(problem)
    .oracle(oracle)
    .config(config)
    .build()
    .optimize()
}

fn scenario_config() -> EngineConfig {
  EngineConfig::builder()
    .population_size(20)
    .max_generations(30)
    .seed(42)
    .build()
}

#[test]
fn test_front_keeps_boundaries_and_cheapest_design() {
  let report = genetic(scenario_config()).unwrap();
  assert!(report.complete);
  assert_eq!(report.stop_reason, StopReason::MaxGenerations);
  assert_eq!(report.log.len(), 31);
  assert!(!report.front.is_empty());

  let depths: Vec<_> = report.front.iter().map(|m| m.candidate.depth).collect();
  assert!(depths.contains(&350), "depths {depths:?}");
  assert!(depths.contains(&500), "depths {depths:?}");

  let brute_force = exhaustive_front(&common::scenario());
  let cheapest = report.front.cheapest().unwrap().objectives().cost;
  let best = brute_force.cheapest().unwrap().objectives().cost;
  assert!(cheapest <= best + 1e-9, "{cheapest} > {best}");
}

#[test]
fn test_front_members_are_mutually_non_dominated() {
  let report = genetic(scenario_config()).unwrap();
  assert!(report.front.len() > 1);
  assert_mutually_non_dominated(&report.front);

  let batched = genetic(EngineConfig {
    execution: Execution::ParallelBatch,
    seed: 17,
    ..scenario_config()
  })
  .unwrap();
  assert_mutually_non_dominated(&batched.front);
}

#[test]
fn test_same_seed_same_front() {
  let first = genetic(scenario_config()).unwrap();
  let second = genetic(scenario_config()).unwrap();
  assert_eq!(first.front, second.front);
  assert_eq!(first.log, second.log);

  let other = genetic(EngineConfig {
    seed: 43,
    ..scenario_config()
  })
  .unwrap();
  assert!(other.front.iter().all(FrontMember::is_feasible));
}

#[test]
fn test_execution_strategy_does_not_change_results() {
  let reports: Vec<_> = [
    Execution::Sequential,
    Execution::ParallelEach,
    Execution::ParallelBatch,
  ]
  .into_iter()
  .map(|execution| {
    genetic(EngineConfig {
      execution,
      max_generations: 10,
      ..scenario_config()
    })
    .unwrap()
  })
  .collect();
  assert_eq!(reports[0], reports[1]);
  assert_eq!(reports[0], reports[2]);
}

#[test]
fn test_best_cost_never_regresses() {
  let problem = common::sample();
  let oracle = ScreeningOracle::new(&problem);
  let mut engine = Nsga2::builder()
    .problem(problem)
    .oracle(oracle)
    .config(
      EngineConfig::builder()
        .population_size(20)
        .max_generations(25)
        .seed(5)
        .build(),
    )
    .build();
  let mut best = f64::INFINITY;
  let mut previous = None;
  for snapshot in engine.generations().unwrap() {
    let stats = snapshot.stats;
    if let Some(previous) = previous {
      assert_eq!(stats.generation, previous + 1);
    }
    previous = Some(stats.generation);
    assert!(stats.evaluations >= stats.feasible_count);
    if stats.feasible_count == 0 {
      continue;
    }
    assert!(stats.best_cost <= best, "generation {}", stats.generation);
    best = stats.best_cost;
    assert_eq!(snapshot.front.cheapest().unwrap().objectives().cost, best);
  }
  assert!(best.is_finite());
}

#[test]
fn test_front_holds_only_passing_designs() {
  let report = genetic(scenario_config()).unwrap();
  for member in &report.front {
    assert!(member.is_feasible());
    assert!(member.evaluation.margins.values().all(|&m| m >= 0.0));
    assert!(member.evaluation.margins.contains_key("flexure"));
  }
}

#[test]
fn test_oracle_failures_only_make_designs_infeasible() {
  let problem = common::scenario();
  let screening = ScreeningOracle::new(&problem);
  let oracle = move |c: &Candidate, loading: &Loading| {
    match c.depth {
      350 => Err(OracleError::new("solver did not converge")),
      450 => panic!("solver crashed"),
      _ => screening.evaluate(c, loading),
    }
  };
  let report = Nsga2::builder()
    .problem(problem)
    .oracle(oracle)
    .config(scenario_config())
    .build()
    .optimize()
    .unwrap();
  assert!(report.complete);
  assert!(!report.front.is_empty());
  assert!(report
    .front
    .iter()
    .all(|m| m.candidate.depth == 400 || m.candidate.depth == 500));
}

#[test]
fn test_nothing_feasible_reports_least_infeasible() {
  // every design misses a deflection limit, shallower ones by more
  let oracle = |c: &Candidate, _: &Loading| -> Result<ComplianceResult, OracleError> {
    Ok(ComplianceResult::from_margins([
      ("deflection", f64::from(c.depth) / 1000.0 - 1.0),
      ("flexure", 0.5),
    ]))
  };
  let result = Nsga2::builder()
    .problem(common::sample())
    .oracle(oracle)
    .config(
      EngineConfig::builder()
        .population_size(10)
        .max_generations(5)
        .diagnostic_count(4)
        .build(),
    )
    .build()
    .optimize();
  let Err(EngineError::EmptyFeasibleSet(diagnostics)) = result else {
    panic!("expected an empty feasible set");
  };
  assert_eq!(diagnostics.log.len(), 6);
  assert_eq!(diagnostics.least_infeasible.len(), 4);
  let violations: Vec<_> = diagnostics
    .least_infeasible
    .iter()
    .map(|m| m.evaluation.total_violation())
    .collect();
  assert!(violations.windows(2).all(|w| w[0] <= w[1]));
  assert!(violations.iter().all(|&v| v > 0.0));
  assert!(diagnostics.least_infeasible.iter().all(|m| !m.is_feasible()));
}

#[test]
fn test_cancelled_before_start() {
  let problem = common::scenario();
  let oracle = ScreeningOracle::new(&problem);
  let token = CancellationToken::new();
  token.cancel();
  let report = Nsga2::builder()
    .problem(problem)
    .oracle(oracle)
    .config(scenario_config())
    .cancellation(token)
    .build()
    .optimize()
    .unwrap();
  assert!(!report.complete);
  assert_eq!(report.stop_reason, StopReason::Cancelled);
  assert_eq!(report.log.len(), 1);
  assert_eq!(report.log.entries()[0].generation, 0);
}

#[test]
fn test_cancelled_from_another_thread() {
  let problem = common::sample();
  let oracle = ScreeningOracle::new(&problem);
  let mut engine = Nsga2::builder()
    .problem(problem)
    .oracle(oracle)
    .config(
      EngineConfig::builder()
        .population_size(20)
        .max_generations(1000)
        .build(),
    )
    .build();
  let token = engine.cancellation_token();
  let mut generations = 0;
  for snapshot in engine.generations().unwrap() {
    generations += 1;
    if snapshot.stats.generation == 4 {
      let token = token.clone();
      std::thread::spawn(move || token.cancel()).join().unwrap();
      break;
    }
  }
  assert_eq!(generations, 5);
  // the flag is seen when the run is resumed
  assert_eq!(engine.generations().unwrap().count(), 0);
  let report = engine.finish().unwrap();
  assert_eq!(report.stop_reason, StopReason::Cancelled);
  assert_eq!(report.log.len(), 5);
}

#[test]
fn test_auto_mode_picks_search_by_cardinality() {
  let problem = common::sample();
  let oracle = ScreeningOracle::new(&problem);
  let config = EngineConfig::builder()
    .mode(SearchMode::Auto)
    .population_size(20)
    .max_generations(10)
    .build();

  let small = search(problem.clone(), config.clone(), oracle).unwrap();
  assert_eq!(small.stop_reason, StopReason::Exhausted);
  assert_eq!(small.front, exhaustive_front(&problem));

  let large = search(
    problem,
    EngineConfig {
      exhaustive_limit: 95,
      ..config
    },
    oracle,
  )
  .unwrap();
  assert_ne!(large.stop_reason, StopReason::Exhausted);
  assert!(large.log.len() > 1);
}

#[test]
fn test_exhaustive_mode_rejects_large_domains() {
  let problem = common::sample();
  let oracle = ScreeningOracle::new(&problem);
  let config = EngineConfig::builder()
    .mode(SearchMode::Exhaustive)
    .exhaustive_limit(10)
    .build();
  assert!(matches!(
    search(problem, config, oracle),
    Err(EngineError::Validation(ValidationError::DomainTooLarge { .. }))
  ));
}

#[test]
fn test_invalid_problem_is_rejected_before_search() {
  let mut problem = common::sample();
  problem.materials.concrete_grades.push(30);
  let oracle = ScreeningOracle::new(&problem);
  assert!(matches!(
    search(problem, EngineConfig::default(), oracle),
    Err(EngineError::Validation(_))
  ));
}

#[test]
fn test_config_and_report_serialize() {
  let config: EngineConfig = serde_json::from_str(
    r#"{ "population_size": 20, "max_generations": 30, "seed": 42 }"#,
  )
  .unwrap();
  assert_eq!(config, scenario_config());
  assert_eq!(config.execution, Execution::ParallelEach);

  let report = genetic(config).unwrap();
  let json = serde_json::to_value(&report).unwrap();
  assert_eq!(json["stop_reason"], "max_generations");
  assert_eq!(json["complete"], true);
  assert_eq!(
    json["front"].as_array().map(Vec::len),
    Some(report.front.len())
  );

  let restored: RunReport = serde_json::from_value(json).unwrap();
  assert_eq!(restored.stop_reason, report.stop_reason);
  assert_eq!(restored.log.len(), report.log.len());
  assert_eq!(candidates(&restored.front), candidates(&report.front));
  for (a, b) in restored.front.iter().zip(&report.front) {
    assert!((a.objectives().cost - b.objectives().cost).abs() < 1e-6);
  }
}
