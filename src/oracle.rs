//! Code-compliance oracle contract and the adapter that calls it.
//!
//! The engine never looks inside the compliance calculation. An [`Oracle`]
//! receives a candidate and the factored loading and answers with a
//! [`ComplianceResult`]: a feasibility flag plus signed margins per named
//! check, where negative means violated.
//!
//! [`OracleAdapter`] is the only place that talks to an oracle. Whatever
//! goes wrong on the oracle side (an `Err`, a panic, a missed deadline) is
//! folded into an infeasible result with a `-inf` margin on a synthetic
//! check, so one bad call never aborts a run.

pub mod screening;

use std::{
  collections::BTreeMap,
  panic::{self, AssertUnwindSafe},
  sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    mpsc, Arc,
  },
  thread,
  time::Duration,
};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{candidate::Candidate, problem::Loading};

/// Synthetic check recorded when the oracle fails or panics.
pub const ORACLE_FAILURE: &str = "oracle_failure";
/// Synthetic check recorded when the oracle misses its deadline.
pub const ORACLE_TIMEOUT: &str = "oracle_timeout";

/// Overrunning oracle calls one adapter lets run at once.
pub const STALLED_CALL_LIMIT: usize = 32;

/// Outcome of a compliance check.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct ComplianceResult {
  pub feasible: bool,
  /// Signed margin per named check. Negative values are violations.
  pub margins: BTreeMap<String, f64>,
}

impl ComplianceResult {
  /// Builds a result whose feasibility follows from the margins: feasible
  /// iff no margin is negative.
  pub fn from_margins<K, I>(margins: I) -> Self
  where
    K: Into<String>,
    I: IntoIterator<Item = (K, f64)>,
  {
    let margins: BTreeMap<String, f64> =
      margins.into_iter().map(|(k, v)| (k.into(), v)).collect();
    let feasible = margins.values().all(|m| *m >= 0.0);
    Self { feasible, margins }
  }

  /// Infeasible result with a single `-inf` margin on `check`.
  pub fn failed(check: &str) -> Self {
    Self {
      feasible: false,
      margins: BTreeMap::from([(check.to_owned(), f64::NEG_INFINITY)]),
    }
  }
}

/// Error reported by an oracle implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("OracleError: {0}")]
pub struct OracleError(pub String);

impl OracleError {
  pub fn new(message: impl Into<String>) -> Self {
    Self(message.into())
  }
}

/// A code-compliance checker. Implementations must be deterministic and free
/// of side effects observable by the engine.
///
/// Closures of type `Fn(&Candidate, &Loading) -> Result<ComplianceResult,
/// OracleError>` implement this trait too.
pub trait Oracle: Send + Sync {
  /// Checks `candidate` against `loading`.
  fn evaluate(
    &self,
    candidate: &Candidate,
    loading: &Loading,
  ) -> Result<ComplianceResult, OracleError>;
}

impl<F> Oracle for F
where
  F: Fn(&Candidate, &Loading) -> Result<ComplianceResult, OracleError>
    + Send
    + Sync,
{
  fn evaluate(
    &self,
    candidate: &Candidate,
    loading: &Loading,
  ) -> Result<ComplianceResult, OracleError> {
    self(candidate, loading)
  }
}

type CallOutcome = thread::Result<Result<ComplianceResult, OracleError>>;

/// Calls an oracle and normalizes every outcome into a [`ComplianceResult`].
/// No retries happen here.
pub struct OracleAdapter<O> {
  oracle: Arc<O>,
  loading: Loading,
  timeout: Option<Duration>,
  /// Calls that missed their deadline and have not returned yet.
  stalled: Arc<AtomicUsize>,
}

impl<O: Oracle + 'static> OracleAdapter<O> {
  pub fn new(
    oracle: Arc<O>,
    loading: Loading,
    timeout: Option<Duration>,
  ) -> Self {
    Self {
      oracle,
      loading,
      timeout,
      stalled: Arc::new(AtomicUsize::new(0)),
    }
  }

  /// Number of calls that missed their deadline and are still running.
  pub fn stalled_calls(&self) -> usize {
    self.stalled.load(Ordering::SeqCst)
  }

  /// Checks a candidate. Never fails.
  pub fn check(&self, candidate: &Candidate) -> ComplianceResult {
    let outcome = match self.timeout {
      None => Some(self.call(candidate)),
      Some(timeout) => self.call_with_timeout(candidate, timeout),
    };
    match outcome {
      Some(Ok(Ok(result))) => sanitize(result),
      Some(Ok(Err(err))) => {
        warn!(?candidate, error = %err, "oracle returned an error");
        ComplianceResult::failed(ORACLE_FAILURE)
      }
      Some(Err(_)) => {
        warn!(?candidate, "oracle panicked");
        ComplianceResult::failed(ORACLE_FAILURE)
      }
      None => {
        warn!(
          ?candidate,
          timeout = ?self.timeout,
          stalled = self.stalled_calls(),
          "oracle timed out"
        );
        ComplianceResult::failed(ORACLE_TIMEOUT)
      }
    }
  }

  fn call(&self, candidate: &Candidate) -> CallOutcome {
    panic::catch_unwind(AssertUnwindSafe(|| {
      self.oracle.evaluate(candidate, &self.loading)
    }))
  }

  /// Runs the call on a helper thread and waits at most `timeout`. A call
  /// that overruns keeps its thread until it returns; its answer is dropped.
  ///
  /// At most [`STALLED_CALL_LIMIT`] overrunning calls are left running. Past
  /// that, calls time out at once without reaching the oracle until some
  /// stalled call returns.
  fn call_with_timeout(
    &self,
    candidate: &Candidate,
    timeout: Duration,
  ) -> Option<CallOutcome> {
    let stalled = self.stalled_calls();
    if stalled >= STALLED_CALL_LIMIT {
      warn!(?candidate, stalled, "too many stalled oracle calls, skipping");
      return None;
    }
    let (tx, rx) = mpsc::sync_channel(1);
    // set by whichever of the caller and the helper gives up on the other
    let finished = Arc::new(AtomicBool::new(false));
    let oracle = Arc::clone(&self.oracle);
    let candidate = *candidate;
    let loading = self.loading;
    let spawned = thread::Builder::new().name("oracle-call".into()).spawn({
      let finished = Arc::clone(&finished);
      let stalled = Arc::clone(&self.stalled);
      move || {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
          oracle.evaluate(&candidate, &loading)
        }));
        let _ = tx.send(outcome);
        if finished.swap(true, Ordering::SeqCst) {
          stalled.fetch_sub(1, Ordering::SeqCst);
        }
      }
    });
    if let Err(err) = spawned {
      warn!(error = %err, "could not spawn oracle thread");
      return Some(Ok(Err(OracleError::new(err.to_string()))));
    }
    match rx.recv_timeout(timeout) {
      Ok(outcome) => Some(outcome),
      Err(mpsc::RecvTimeoutError::Timeout) => {
        self.stalled.fetch_add(1, Ordering::SeqCst);
        if finished.swap(true, Ordering::SeqCst) {
          self.stalled.fetch_sub(1, Ordering::SeqCst);
        }
        None
      }
      Err(mpsc::RecvTimeoutError::Disconnected) => Some(Ok(Err(
        OracleError::new("oracle thread ended without an answer"),
      ))),
    }
  }
}

/// NaN margins carry no information and count as total violations.
fn sanitize(mut result: ComplianceResult) -> ComplianceResult {
  for margin in result.margins.values_mut() {
    if margin.is_nan() {
      *margin = f64::NEG_INFINITY;
      result.feasible = false;
    }
  }
  result
}
