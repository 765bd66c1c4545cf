use serde::Serialize;
use std::sync::atomic::{AtomicI64, Ordering::Relaxed};

use crate::reconcile::outcome::{AccountResult, OutcomeStatus};

#[derive(Default, Serialize)]
pub struct Counter(pub AtomicI64);

impl Counter {
    pub fn inc(&self, by: i64) {
        self.0.fetch_add(by, Relaxed);
    }

    pub fn get(&self) -> i64 {
        self.0.load(Relaxed)
    }
}

impl Clone for Counter {
    fn clone(&self) -> Self {
        Self(AtomicI64::new(self.get()))
    }
}

impl std::fmt::Display for Counter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.get())
    }
}

impl std::fmt::Debug for Counter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// Totals for one batch run, updated as accounts finish.
#[derive(Debug, Serialize, Default, Clone)]
pub struct RunStats {
    pub num_applied: Counter,
    pub num_skipped: Counter,
    pub num_failed: Counter,
    pub num_accounts_done: Counter,
    /// Accounts that never got past session acquisition or folder listing.
    pub num_accounts_failed: Counter,
    /// Accounts done with at least one failed operation.
    pub num_accounts_partial: Counter,
}

impl RunStats {
    pub fn record(&self, result: &AccountResult) {
        if !result.is_done() {
            self.num_accounts_failed.inc(1);
            return;
        }
        self.num_accounts_done.inc(1);
        let mut any_failed = false;
        for outcome in &result.outcomes {
            match outcome.status {
                OutcomeStatus::Applied => self.num_applied.inc(1),
                OutcomeStatus::Skipped(_) => self.num_skipped.inc(1),
                OutcomeStatus::Failed(_) => {
                    any_failed = true;
                    self.num_failed.inc(1);
                }
            }
        }
        if any_failed {
            self.num_accounts_partial.inc(1);
        }
    }

    pub fn has_failures(&self) -> bool {
        self.num_failed.get() > 0 || self.num_accounts_failed.get() > 0
    }
}

impl std::fmt::Display for RunStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} account(s) done ({} partial), {} failed; operations: {} applied, {} skipped, {} failed",
            self.num_accounts_done,
            self.num_accounts_partial,
            self.num_accounts_failed,
            self.num_applied,
            self.num_skipped,
            self.num_failed,
        )
    }
}
