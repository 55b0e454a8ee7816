//! A simplified limit-state screening oracle.
//!
//! Good enough to drive demos and tests with realistic trade-offs between
//! depth, steel and concrete. It follows the usual rectangular stress block
//! formulation for singly reinforced sections but is an approximation, not a
//! validated code-compliance implementation.

use crate::{
  candidate::Candidate,
  oracle::{ComplianceResult, Oracle, OracleError},
  problem::{Loading, ProblemDefinition, SupportCondition},
};

/// Maximum nominal aggregate size in mm, used for bar spacing.
const AGGREGATE_SIZE: f64 = 20.0;
/// Yield strength cap for shear reinforcement in MPa.
const STIRRUP_FY_CAP: f64 = 415.0;

/// Screening checks for a rectangular, singly reinforced beam.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ScreeningOracle {
  span: u32,
  support: SupportCondition,
  clear_cover: u32,
}

impl ScreeningOracle {
  pub fn new(problem: &ProblemDefinition) -> Self {
    Self {
      span: problem.span,
      support: problem.support,
      clear_cover: problem.clear_cover,
    }
  }
}

impl Oracle for ScreeningOracle {
  fn evaluate(
    &self,
    c: &Candidate,
    loading: &Loading,
  ) -> Result<ComplianceResult, OracleError> {
    let d = c.effective_depth(self.clear_cover);
    if d <= 0.0 {
      return Err(OracleError::new(format!(
        "depth {} mm leaves no room for the reinforcement",
        c.depth
      )));
    }
    let b = f64::from(c.width);
    let depth = f64::from(c.depth);
    let fck = f64::from(c.concrete_grade);
    let fy = f64::from(c.steel_grade);
    let ast = c.steel_area();
    let cover = f64::from(self.clear_cover);

    // flexure
    let mu = loading.moment * 1e6;
    let xu = 0.87 * fy * ast / (0.36 * fck * b);
    let xu_max = neutral_axis_limit(fy) * d;
    let mr = if xu <= xu_max {
      0.87 * fy * ast * (d - 0.416 * xu)
    } else {
      0.36 * fck * b * xu_max * (d - 0.416 * xu_max)
    };
    let ast_min = 0.85 * b * d / fy;
    let ast_max = 0.04 * b * depth;

    // shear
    let vu = loading.shear * 1e3;
    let pt = 100.0 * ast / (b * d);
    let tau_c = concrete_shear_strength(fck, pt);
    let tau_c_max = 0.62 * fck.sqrt();
    let asv = c.stirrup_area();
    let sv = f64::from(c.stirrup_spacing);
    let fy_v = fy.min(STIRRUP_FY_CAP);
    let v_capacity = tau_c * b * d + 0.87 * fy_v * asv * d / sv;
    let sv_max = (0.75 * d).min(300.0);
    let asv_min = 0.4 * b * sv / (0.87 * fy_v);

    // serviceability
    let span = f64::from(self.span);
    let allowed_ratio = span_depth_limit(self.support, span);

    // detailing
    let per_layer = f64::from(c.bars_per_layer());
    let phi = f64::from(c.bar_diameter);
    let free_width =
      b - 2.0 * cover - 2.0 * f64::from(c.stirrup_diameter) - per_layer * phi;
    let clear_spacing = if per_layer > 1.0 {
      free_width / (per_layer - 1.0)
    } else {
      free_width
    };
    let min_spacing = phi.max(AGGREGATE_SIZE + 5.0);

    Ok(ComplianceResult::from_margins([
      ("flexure", mr / mu - 1.0),
      ("ductility", 1.0 - xu / xu_max),
      ("min_steel", ast / ast_min - 1.0),
      ("max_steel", 1.0 - ast / ast_max),
      ("shear", v_capacity / vu.max(1.0) - 1.0),
      ("shear_stress", 1.0 - vu / (b * d) / tau_c_max),
      ("stirrup_spacing", 1.0 - sv / sv_max),
      ("min_stirrups", asv / asv_min - 1.0),
      ("deflection", allowed_ratio / (span / d) - 1.0),
      ("bar_spacing", clear_spacing / min_spacing - 1.0),
    ]))
  }
}

/// Limiting neutral axis depth ratio `xu,max / d` for a steel grade.
fn neutral_axis_limit(fy: f64) -> f64 {
  700.0 / (1100.0 + 0.87 * fy)
}

/// Design shear strength of concrete in MPa for a tension steel percentage.
fn concrete_shear_strength(fck: f64, pt: f64) -> f64 {
  let pt = pt.clamp(0.15, 3.0);
  let beta = (0.8 * fck / (6.89 * pt)).max(1.0);
  0.85 * (0.8 * fck).sqrt() * ((1.0 + 5.0 * beta).sqrt() - 1.0) / (6.0 * beta)
}

/// Allowed span to effective depth ratio.
fn span_depth_limit(support: SupportCondition, span: f64) -> f64 {
  let basic = match support {
    SupportCondition::SimplySupported => 20.0,
    SupportCondition::Continuous => 26.0,
    SupportCondition::Cantilever => return 7.0,
  };
  if span > 10_000.0 {
    basic * 10_000.0 / span
  } else {
    basic
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{candidate, problem};

  fn oracle() -> ScreeningOracle {
    ScreeningOracle::new(&problem::tests::sample())
  }

  const LOADING: Loading = Loading {
    moment: 120.0,
    shear: 80.0,
  };

  #[test]
  fn test_neutral_axis_limits() {
    assert!((neutral_axis_limit(250.0) - 0.531).abs() < 1e-3);
    assert!((neutral_axis_limit(415.0) - 0.479).abs() < 1e-3);
    assert!((neutral_axis_limit(500.0) - 0.456).abs() < 1e-3);
  }

  #[test]
  fn test_concrete_shear_strength_grows_with_steel() {
    let low = concrete_shear_strength(25.0, 0.5);
    let high = concrete_shear_strength(25.0, 1.5);
    assert!(low < high);
    assert!((low - 0.49).abs() < 0.02);
  }

  #[test]
  fn test_reasonable_section_passes() {
    let c = candidate::tests::sample();
    let result = oracle().evaluate(&c, &LOADING).unwrap();
    assert!(result.feasible, "{result:?}");
    assert_eq!(result.margins.len(), 10);
  }

  #[test]
  fn test_shallow_section_fails_flexure() {
    let c = Candidate {
      width: 230,
      depth: 350,
      bar_count: 3,
      bar_diameter: 16,
      ..candidate::tests::sample()
    };
    let result = oracle().evaluate(&c, &LOADING).unwrap();
    assert!(!result.feasible);
    assert!(result.margins["flexure"] < 0.0);
  }

  #[test]
  fn test_no_effective_depth_is_error() {
    let c = Candidate {
      depth: 40,
      ..candidate::tests::sample()
    };
    assert!(oracle().evaluate(&c, &LOADING).is_err());
  }

  #[test]
  fn test_span_depth_limits() {
    use SupportCondition::*;
    assert_eq!(span_depth_limit(SimplySupported, 5000.0), 20.0);
    assert_eq!(span_depth_limit(Continuous, 5000.0), 26.0);
    assert_eq!(span_depth_limit(Cantilever, 5000.0), 7.0);
    assert_eq!(span_depth_limit(SimplySupported, 12_500.0), 16.0);
  }
}
