//! Cost, embodied carbon and depth objectives.
//!
//! Every objective is a pure function of the candidate and the problem's
//! rate tables, and every objective is minimized.

use serde::{Deserialize, Serialize};

use crate::{
  candidate::{bar_area, Candidate},
  problem::ProblemDefinition,
  score::{Scores, OBJECTIVE_NUM},
};

/// Density of reinforcing steel in kg/m³.
pub const STEEL_DENSITY: f64 = 7850.0;
/// Hook allowance per stirrup end, in bar diameters.
const HOOK_DIAMETERS: f64 = 10.0;

/// Objective vector of one candidate.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct Objectives {
  pub cost: f64,
  /// Overall section depth in mm.
  pub depth: f64,
  /// Embodied carbon in kgCO2e.
  pub carbon: f64,
}

impl Objectives {
  /// Objective names in score order.
  pub const NAMES: [&'static str; OBJECTIVE_NUM] = ["cost", "depth", "carbon"];

  /// Scores in the fixed order cost, depth, carbon.
  pub fn scores(&self) -> Scores<OBJECTIVE_NUM> {
    [self.cost, self.depth, self.carbon]
  }
}

/// Material take-off of one beam.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct Quantities {
  /// Concrete volume in m³.
  pub concrete_volume: f64,
  /// Longitudinal plus shear reinforcement in kg.
  pub steel_mass: f64,
  /// Formwork contact area (soffit and both sides) in m².
  pub formwork_area: f64,
  /// Tension reinforcement ratio.
  pub reinforcement_ratio: f64,
}

impl Quantities {
  /// Take-off for a candidate spanning the problem's span.
  pub fn of(candidate: &Candidate, problem: &ProblemDefinition) -> Self {
    let span = f64::from(problem.span) / 1000.0;
    let b = f64::from(candidate.width) / 1000.0;
    let depth = f64::from(candidate.depth) / 1000.0;
    let cover = f64::from(problem.clear_cover);

    let longitudinal = candidate.steel_area() * 1e-6 * span;
    let stirrup_count =
      (f64::from(problem.span) / f64::from(candidate.stirrup_spacing)).floor()
        + 1.0;
    let phi_v = f64::from(candidate.stirrup_diameter);
    let leg_length = (2.0
      * (f64::from(candidate.width) - 2.0 * cover
        + f64::from(candidate.depth)
        - 2.0 * cover)
      + 2.0 * HOOK_DIAMETERS * phi_v)
      .max(0.0);
    let stirrups =
      stirrup_count * leg_length * bar_area(candidate.stirrup_diameter) * 1e-9;

    Self {
      concrete_volume: b * depth * span,
      steel_mass: (longitudinal + stirrups) * STEEL_DENSITY,
      formwork_area: (b + 2.0 * depth) * span,
      reinforcement_ratio: candidate.reinforcement_ratio(problem.clear_cover),
    }
  }
}

/// Computes [`Objectives`] from the problem's rate tables.
#[derive(Clone, Copy, Debug)]
pub struct ObjectiveEvaluator<'a> {
  problem: &'a ProblemDefinition,
}

impl<'a> ObjectiveEvaluator<'a> {
  pub fn new(problem: &'a ProblemDefinition) -> Self {
    Self { problem }
  }

  /// Evaluates all objectives. Grades missing from the rate tables are ruled
  /// out by [`ProblemDefinition::validate`] and price at zero here.
  pub fn evaluate(&self, candidate: &Candidate) -> Objectives {
    let q = Quantities::of(candidate, self.problem);
    let cost = &self.problem.cost_rates;
    let carbon = &self.problem.carbon_rates;
    let grade = candidate.concrete_grade;

    let mut labor = q.steel_mass * cost.labor_per_kg;
    if q.reinforcement_ratio > cost.congestion_threshold {
      labor *= cost.congestion_multiplier;
    }
    let total_cost = q.concrete_volume
      * cost.concrete_per_m3.get(&grade).copied().unwrap_or_default()
      + q.steel_mass * cost.steel_per_kg
      + q.formwork_area * cost.formwork_per_m2
      + labor;
    let total_carbon = q.concrete_volume
      * carbon.concrete_per_m3.get(&grade).copied().unwrap_or_default()
      + q.steel_mass * carbon.steel_per_kg
      + q.formwork_area * carbon.formwork_per_m2;

    Objectives {
      cost: total_cost,
      depth: f64::from(candidate.depth),
      carbon: total_carbon,
    }
  }
}
