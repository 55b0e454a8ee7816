//! Per-run state shared by the search steps.

use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc,
};

use rand::{rngs::StdRng, SeedableRng};

use crate::{
  config::EngineConfig,
  evaluation::Evaluator,
  oracle::Oracle,
  problem::ProblemDefinition,
};

/// Cooperative cancellation flag. Clones share the same flag.
///
/// A running search checks the flag between generations only, so the
/// generation being evaluated when [`cancel`](Self::cancel) is called still
/// completes.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn cancel(&self) {
    self.0.store(true, Ordering::Release);
  }

  pub fn is_cancelled(&self) -> bool {
    self.0.load(Ordering::Acquire)
  }
}

/// The random number generator and the evaluation cache of one run. Every
/// run owns its context exclusively.
pub struct RunContext<O> {
  pub rng: StdRng,
  pub evaluator: Evaluator<O>,
}

impl<O: Oracle + 'static> RunContext<O> {
  pub fn new(
    problem: Arc<ProblemDefinition>,
    oracle: Arc<O>,
    config: &EngineConfig,
  ) -> Self {
    Self {
      rng: StdRng::seed_from_u64(config.seed),
      evaluator: Evaluator::new(problem, oracle, config),
    }
  }
}
