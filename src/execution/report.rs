use std::path::{Path, PathBuf};

use chrono::Local;
use indexmap::IndexSet;
use serde::Serialize;

use crate::execution::import::ImportEntry;
use crate::execution::stats::RunStats;
use crate::reconcile::outcome::{AccountResult, AccountStatus, OutcomeStatus};
use crate::utils::error::Result;

/// Machine-readable record of an import run, kept for follow-up runs.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub stats: RunStats,
    pub shared_folders: Vec<AccountResult>,
    pub attributes: Vec<ImportEntry>,
}

impl ImportReport {
    /// Accounts with any failure in either phase, each listed once.
    pub fn failed_accounts(&self) -> IndexSet<&str> {
        let shared = self
            .shared_folders
            .iter()
            .filter(|r| r.status() != AccountStatus::Success)
            .map(|r| r.account.as_str());
        let attributes = self
            .attributes
            .iter()
            .filter(|e| matches!(e.status, OutcomeStatus::Failed(_)))
            .map(|e| e.account.as_str());
        shared.chain(attributes).collect()
    }

    pub fn has_failures(&self) -> bool {
        self.stats.has_failures() || !self.failed_accounts().is_empty()
    }

    /// Writes `<dir>/import-<timestamp>.json` and returns its path.
    pub async fn write(&self, dir: &Path) -> Result<PathBuf> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(format!(
            "import-{}.json",
            Local::now().format("%Y-%m-%d-%H-%M-%S")
        ));
        tokio::fs::write(&path, serde_json::to_vec_pretty(self)?).await?;
        Ok(path)
    }
}
