//! Per-generation statistics and the append-only run log.

use std::fmt;

use itertools::{Itertools, MinMaxResult};
use serde::{Deserialize, Serialize};

use crate::score::{Scores, OBJECTIVE_NUM};

/// Why a run stopped.
#[derive(
  Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
  /// The front spread stayed stable for the configured window.
  Converged,
  /// The generation budget ran out.
  MaxGenerations,
  /// The caller cancelled the run between generations.
  Cancelled,
  /// The whole design space was enumerated.
  Exhausted,
}

impl fmt::Display for StopReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      StopReason::Converged => "converged",
      StopReason::MaxGenerations => "max_generations",
      StopReason::Cancelled => "cancelled",
      StopReason::Exhausted => "exhausted",
    })
  }
}

/// Per-objective bounding box of a set of objective vectors.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct Spread {
  pub min: Scores<OBJECTIVE_NUM>,
  pub max: Scores<OBJECTIVE_NUM>,
}

impl Spread {
  /// Bounding box of `points`, `None` when there are none.
  pub fn of<I>(points: I) -> Option<Self>
  where
    I: IntoIterator<Item = Scores<OBJECTIVE_NUM>>,
    I::IntoIter: Clone,
  {
    let points = points.into_iter();
    let mut spread = Spread {
      min: [0.0; OBJECTIVE_NUM],
      max: [0.0; OBJECTIVE_NUM],
    };
    for o_idx in 0..OBJECTIVE_NUM {
      let values = points.clone().map(|p| p[o_idx]);
      let (min, max) = match values.minmax_by(|a, b| a.total_cmp(b)) {
        MinMaxResult::NoElements => return None,
        MinMaxResult::OneElement(v) => (v, v),
        MinMaxResult::MinMax(min, max) => (min, max),
      };
      spread.min[o_idx] = min;
      spread.max[o_idx] = max;
    }
    Some(spread)
  }

  /// Largest relative movement of any bound since `previous`. Each
  /// objective is scaled by the magnitude of its previous bounds.
  pub fn relative_change(&self, previous: &Self) -> f64 {
    (0..OBJECTIVE_NUM)
      .map(|o_idx| {
        let scale = previous.min[o_idx]
          .abs()
          .max(previous.max[o_idx].abs())
          .max(f64::MIN_POSITIVE);
        ((self.min[o_idx] - previous.min[o_idx]).abs()
          + (self.max[o_idx] - previous.max[o_idx]).abs())
          / scale
      })
      .fold(0.0, f64::max)
  }

  /// Volume of this box relative to `reference`, one factor per objective.
  /// Objectives with no extent in `reference` are ignored.
  pub fn relative_volume(&self, reference: &Self) -> f64 {
    (0..OBJECTIVE_NUM)
      .filter_map(|o_idx| {
        let outer = reference.max[o_idx] - reference.min[o_idx];
        (outer > 0.0 && outer.is_finite())
          .then(|| (self.max[o_idx] - self.min[o_idx]) / outer)
      })
      .product()
  }
}

/// Summary of one generation.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct GenerationStats {
  /// 0 for the evaluated initial population.
  pub generation: usize,
  pub best_cost: f64,
  pub best_depth: f64,
  pub best_carbon: f64,
  /// Number of population members in front 0.
  pub front_size: usize,
  /// Number of feasible population members.
  pub feasible_count: usize,
  /// Distinct candidates evaluated since the run started.
  pub evaluations: usize,
  /// Bounding box of front 0 in objective space.
  pub spread: Spread,
  /// Bounding-box volume of front 0 relative to the whole population.
  pub diversity: f64,
  /// Set on the entry of the generation that ended the run.
  pub stop_reason: Option<StopReason>,
}

impl GenerationStats {
  /// Builds the entry from the objective scores of front 0 and of the
  /// whole population. Returns `None` for an empty front.
  pub fn collect(
    generation: usize,
    front: &[Scores<OBJECTIVE_NUM>],
    population: &[Scores<OBJECTIVE_NUM>],
    feasible_count: usize,
    evaluations: usize,
  ) -> Option<Self> {
    let spread = Spread::of(front.iter().copied())?;
    let outer = Spread::of(population.iter().copied()).unwrap_or(spread);
    let [best_cost, best_depth, best_carbon] = spread.min;
    Some(Self {
      generation,
      best_cost,
      best_depth,
      best_carbon,
      front_size: front.len(),
      feasible_count,
      evaluations,
      spread,
      diversity: spread.relative_volume(&outer),
      stop_reason: None,
    })
  }
}

/// Append-only record of a run.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct RunLog {
  entries: Vec<GenerationStats>,
  stop_reason: Option<StopReason>,
}

impl RunLog {
  pub fn entries(&self) -> &[GenerationStats] {
    &self.entries
  }

  pub fn last(&self) -> Option<&GenerationStats> {
    self.entries.last()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Why the run stopped, once it has.
  pub fn stop_reason(&self) -> Option<StopReason> {
    self.stop_reason
  }

  pub(crate) fn push(&mut self, stats: GenerationStats) {
    self.entries.push(stats);
  }

  /// Records the final stop reason. A terminal generation entry, if there
  /// is one, carries the same reason.
  pub(crate) fn stop(&mut self, reason: StopReason, on_last_entry: bool) {
    self.stop_reason = Some(reason);
    if on_last_entry {
      if let Some(last) = self.entries.last_mut() {
        last.stop_reason = Some(reason);
      }
    }
  }
}
