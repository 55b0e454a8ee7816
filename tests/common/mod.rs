#![allow(dead_code)]

use std::collections::BTreeMap;

use beam_pareto::{prelude::*, score::ParetoDominance};

/// A 5 m simply supported beam under 120 kNm and 80 kN with the given
/// depth and longitudinal bar domains.
pub fn beam(
  depth: DomainSpec,
  bar_count: &[u32],
  bar_diameter: &[u32],
) -> ProblemDefinition {
  ProblemDefinition::builder()
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
        .depth(depth)
        .bar_count(bar_count.to_vec())
        .bar_diameter(bar_diameter.to_vec())
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
    .build()
}

/// Depths 350 to 500 by 50, three to five T20 bars. 48 candidates.
pub fn scenario() -> ProblemDefinition {
  beam(DomainSpec::Values(vec![350, 400, 450, 500]), &[3, 4, 5], &[20])
}

/// Depths 350 to 500 by 50, three to five T16 or T20 bars. 96 candidates.
pub fn sample() -> ProblemDefinition {
  beam(DomainSpec::Values(vec![350, 400, 450, 500]), &[3, 4, 5], &[16, 20])
}

/// Depths 350 to 450 by 50, three or four T20 bars. 24 candidates.
pub fn tiny() -> ProblemDefinition {
  beam(DomainSpec::Values(vec![350, 400, 450]), &[3, 4], &[20])
}

/// Candidates of a front in front order.
pub fn candidates(front: &ParetoFront) -> Vec<Candidate> {
  front.iter().map(|member| member.candidate).collect()
}

/// Front of the whole design space.
pub fn exhaustive_front(problem: &ProblemDefinition) -> ParetoFront {
  let oracle = ScreeningOracle::new(problem);
  Exhaustive::builder()
    .problem(problem.clone())
    .oracle(oracle)
    .build()
    .optimize()
    .unwrap()
    .front
}

/// Panics if any front member dominates another.
pub fn assert_mutually_non_dominated(front: &ParetoFront) {
  for a in front {
    for b in front {
      assert!(
        !a.scores().dominates(&b.scores()),
        "{:?} dominates {:?}",
        a.candidate,
        b.candidate
      );
    }
  }
}
