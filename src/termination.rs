//! Convergence control.

use tracing::debug;

use crate::{
  config::EngineConfig,
  stats::{Spread, StopReason},
};

/// Decides after every generation whether the run stops.
///
/// A run stops once `max_generations` generations followed the initial
/// one, or earlier when the spread of front 0 moved by less than `epsilon`
/// (relative) for `window` consecutive generations. A zero window disables
/// the early stop.
#[derive(Clone, PartialEq, Debug)]
pub struct ConvergenceController {
  max_generations: usize,
  epsilon: f64,
  window: usize,
  previous: Option<Spread>,
  stable: usize,
}

impl ConvergenceController {
  pub fn new(max_generations: usize, epsilon: f64, window: usize) -> Self {
    Self {
      max_generations,
      epsilon,
      window,
      previous: None,
      stable: 0,
    }
  }

  pub fn from_config(config: &EngineConfig) -> Self {
    Self::new(
      config.max_generations,
      config.convergence_epsilon,
      config.convergence_window,
    )
  }

  /// Number of consecutive stable generations seen so far.
  pub fn stable_generations(&self) -> usize {
    self.stable
  }

  /// Observes the front spread of `generation`. Convergence wins over an
  /// exhausted budget when both happen at once.
  pub fn observe(
    &mut self,
    generation: usize,
    spread: Spread,
  ) -> Option<StopReason> {
    if let Some(previous) = self.previous.replace(spread) {
      let change = spread.relative_change(&previous);
      if change < self.epsilon {
        self.stable += 1;
      } else {
        self.stable = 0;
      }
      debug!(generation, change, stable = self.stable, "front spread");
    }
    if self.window > 0 && self.stable >= self.window {
      Some(StopReason::Converged)
    } else if generation >= self.max_generations {
      Some(StopReason::MaxGenerations)
    } else {
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn spread(cost: f64) -> Spread {
    Spread {
      min: [cost, 350.0, 100.0],
      max: [2.0 * cost, 500.0, 200.0],
    }
  }

  #[test]
  fn test_max_generations() {
    let mut controller = ConvergenceController::new(3, 1e-4, 0);
    assert_eq!(controller.observe(0, spread(1.0)), None);
    assert_eq!(controller.observe(1, spread(1.0)), None);
    assert_eq!(controller.observe(2, spread(1.0)), None);
    assert_eq!(
      controller.observe(3, spread(1.0)),
      Some(StopReason::MaxGenerations)
    );
  }

  #[test]
  fn test_zero_generations_stops_at_once() {
    let mut controller = ConvergenceController::new(0, 1e-4, 5);
    assert_eq!(
      controller.observe(0, spread(1.0)),
      Some(StopReason::MaxGenerations)
    );
  }

  #[test]
  fn test_converges_after_stable_window() {
    let mut controller = ConvergenceController::new(100, 1e-4, 2);
    assert_eq!(controller.observe(0, spread(10.0)), None);
    assert_eq!(controller.observe(1, spread(9.0)), None);
    assert_eq!(controller.observe(2, spread(9.0)), None);
    assert_eq!(controller.stable_generations(), 1);
    assert_eq!(controller.observe(3, spread(8.0)), None);
    assert_eq!(controller.stable_generations(), 0);
    assert_eq!(controller.observe(4, spread(8.0)), None);
    assert_eq!(
      controller.observe(5, spread(8.0)),
      Some(StopReason::Converged)
    );
  }
}
