//! Engineering design of a single beam section.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Clear vertical gap between two layers of longitudinal bars, in mm.
pub const LAYER_GAP: u32 = 25;

/// One point of the discrete design space.
///
/// Lengths are millimetres, strengths are characteristic values in MPa.
/// Candidates are plain values: two candidates with the same fields are the
/// same design, which is what makes evaluation memoization possible.
#[derive(
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Debug,
  Serialize,
  Deserialize,
)]
pub struct Candidate {
  /// Section width `b`.
  pub width: u32,
  /// Overall section depth `D`.
  pub depth: u32,
  /// Total number of longitudinal tension bars.
  pub bar_count: u32,
  /// Longitudinal bar diameter.
  pub bar_diameter: u32,
  /// Number of bar layers (1 or 2).
  pub layers: u32,
  /// Stirrup bar diameter.
  pub stirrup_diameter: u32,
  /// Stirrup centre-to-centre spacing.
  pub stirrup_spacing: u32,
  /// Concrete characteristic strength `fck`.
  pub concrete_grade: u32,
  /// Steel yield strength `fy`.
  pub steel_grade: u32,
}

impl Candidate {
  /// Area of all longitudinal bars in mm².
  pub fn steel_area(&self) -> f64 {
    f64::from(self.bar_count) * bar_area(self.bar_diameter)
  }

  /// Two-legged stirrup area in mm².
  pub fn stirrup_area(&self) -> f64 {
    2.0 * bar_area(self.stirrup_diameter)
  }

  /// Number of bars in the most populated layer.
  pub fn bars_per_layer(&self) -> u32 {
    self.bar_count.div_ceil(self.layers.max(1))
  }

  /// Effective depth `d` in mm for the given clear cover. Two layers are
  /// reduced to their common centroid. Negative when the section is too
  /// shallow to hold its reinforcement.
  pub fn effective_depth(&self, clear_cover: u32) -> f64 {
    let to_first_layer = f64::from(clear_cover)
      + f64::from(self.stirrup_diameter)
      + f64::from(self.bar_diameter) / 2.0;
    let layer_offset = if self.layers > 1 {
      f64::from(self.bar_diameter + LAYER_GAP) / 2.0
    } else {
      0.0
    };
    f64::from(self.depth) - to_first_layer - layer_offset
  }

  /// Tension reinforcement ratio `As / (b d)`.
  pub fn reinforcement_ratio(&self, clear_cover: u32) -> f64 {
    let d = self.effective_depth(clear_cover);
    if d <= 0.0 {
      return f64::INFINITY;
    }
    self.steel_area() / (f64::from(self.width) * d)
  }
}

/// Area of a round bar of diameter `diameter` in mm².
pub fn bar_area(diameter: u32) -> f64 {
  PI * f64::from(diameter).powi(2) / 4.0
}
