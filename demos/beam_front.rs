//! Trade-off between cost, depth and carbon of a 5 m simply supported beam,
//! streamed generation by generation.

use std::collections::BTreeMap;

use beam_pareto::prelude::*;

fn main() -> Result<(), EngineError> {
  // engine events at INFO and above
  tracing_subscriber::fmt().init();

  let problem = ProblemDefinition::builder()
    .span(5000)
    .loading(Loading {
      moment: 120.0,
      shear: 80.0,
    })
    .materials(Materials {
      concrete_grades: vec![25, 30, 40],
      steel_grades: vec![415, 500],
    })
    .geometry(
      GeometryBounds::builder()
        .width([230, 300])
        .depth(DiscreteRange::new(350, 750, 50)?)
        .bar_count(DiscreteRange::new(2, 6, 1)?)
        .bar_diameter([12, 16, 20, 25])
        .stirrup_diameter([8, 10])
        .stirrup_spacing(DiscreteRange::new(100, 300, 25)?)
        .build(),
    )
    .cost_rates(
      CostRates::builder()
        .concrete_per_m3(BTreeMap::from([
          (25, 5500.0),
          (30, 6000.0),
          (40, 7000.0),
        ]))
        .steel_per_kg(75.0)
        .formwork_per_m2(450.0)
        .labor_per_kg(12.0)
        .build(),
    )
    .carbon_rates(
      CarbonRates::builder()
        .concrete_per_m3(BTreeMap::from([
          (25, 280.0),
          (30, 310.0),
          (40, 390.0),
        ]))
        .steel_per_kg(1.9)
        .build(),
    )
    .build();

  let oracle = ScreeningOracle::new(&problem);
  let mut engine = Nsga2::builder()
    .problem(problem)
    .oracle(oracle)
    .config(
      EngineConfig::builder()
        .population_size(60)
        .max_generations(80)
        .seed(42)
        .build(),
    )
    .build();

  // a progress line per generation, the way a UI would consume them
  for snapshot in engine.generations()? {
    let stats = &snapshot.stats;
    println!(
      "gen {:>3} | front {:>3} | feasible {:>3} | best cost {:>9.0}",
      stats.generation, stats.front_size, stats.feasible_count, stats.best_cost
    );
  }

  let report = engine.finish()?;
  println!("stopped: {}", report.stop_reason);
  println!(" width | depth |  bars   | grade |    cost   | kgCO2e");
  for member in &report.front {
    let c = &member.candidate;
    let o = member.objectives();
    println!(
      "{:>6} | {:>5} | {:>2}T{:<2}x{} | M{}/{} | {:>9.0} | {:>6.1}",
      c.width,
      c.depth,
      c.bar_count,
      c.bar_diameter,
      c.layers,
      c.concrete_grade,
      c.steel_grade,
      o.cost,
      o.carbon
    );
  }
  Ok(())
}
