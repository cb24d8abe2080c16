use std::fmt::Display;

use tracing::warn;

/// Outcome of a step whose failure never fails the enclosing operation
/// (backup snapshots, image asset cleanup, rollbacks).
///
/// Callers either inspect it or hand it to [`BestEffort::report`], which logs
/// a failure and drops it. It never converts into an error.
#[must_use = "report best-effort outcomes so failures are logged"]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BestEffort {
    Done,
    Failed(String),
}

impl BestEffort {
    pub fn from_result<E: Display>(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => BestEffort::Done,
            Err(err) => BestEffort::Failed(err.to_string()),
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, BestEffort::Done)
    }

    /// Logs a failure under `step` and discards the outcome.
    pub fn report(self, step: &str) {
        if let BestEffort::Failed(reason) = self {
            warn!(step, %reason, "best-effort step failed");
        }
    }
}
