//! Cross-checks the genetic search against full enumeration on a design
//! space small enough for both.

use std::collections::BTreeMap;

use beam_pareto::prelude::*;

fn main() -> Result<(), EngineError> {
  tracing_subscriber::fmt().init();

  let problem = ProblemDefinition::builder()
    .span(5000)
    .loading(Loading {
      moment: 120.0,
      shear: 80.0,
    })
    .materials(Materials {
      concrete_grades: vec![25, 40],
      steel_grades: vec![500],
    })
    .geometry(
      GeometryBounds::builder()
        .width([230, 300])
        .depth(DiscreteRange::new(350, 500, 50)?)
        .bar_count([3, 4, 5])
        .bar_diameter([16, 20])
        .stirrup_diameter([8])
        .stirrup_spacing([150])
        .build(),
    )
    .cost_rates(
      CostRates::builder()
        .concrete_per_m3(BTreeMap::from([(25, 5500.0), (40, 7000.0)]))
        .steel_per_kg(75.0)
        .formwork_per_m2(450.0)
        .labor_per_kg(12.0)
        .build(),
    )
    .carbon_rates(
      CarbonRates::builder()
        .concrete_per_m3(BTreeMap::from([(25, 280.0), (40, 390.0)]))
        .steel_per_kg(1.9)
        .build(),
    )
    .build();

  let oracle = ScreeningOracle::new(&problem);
  let config = EngineConfig::builder()
    .population_size(20)
    .max_generations(60)
    .seed(7)
    .build();

  let exhaustive = search(
    problem.clone(),
    EngineConfig {
      mode: SearchMode::Exhaustive,
      ..config.clone()
    },
    oracle,
  )?;
  let genetic = search(problem, config, oracle)?;

  let candidates = |report: &RunReport| {
    report.front.iter().map(|m| m.candidate).collect::<Vec<_>>()
  };
  let (all, found) = (candidates(&exhaustive), candidates(&genetic));
  let missed = all.iter().filter(|c| !found.contains(c)).count();
  println!(
    "exhaustive front: {} designs out of {} evaluated",
    all.len(),
    exhaustive.log.last().map_or(0, |s| s.evaluations)
  );
  println!(
    "genetic front:    {} designs, {} missed, {} evaluated",
    found.len(),
    missed,
    genetic.log.last().map_or(0, |s| s.evaluations)
  );
  for member in &exhaustive.front {
    let mark = if found.contains(&member.candidate) { '+' } else { '-' };
    let o = member.objectives();
    println!(
      "{mark} {:>4} x {:<4} {:>9.0} {:>6.1}",
      member.candidate.width, member.candidate.depth, o.cost, o.carbon
    );
  }
  Ok(())
}
