//! Drives grant and link reconciliation across a batch of accounts.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::base::model::AccountSnapshot;
use crate::execution::stats::RunStats;
use crate::ops::interface::{DirectoryClient, LogSink, SessionProvider};
use crate::reconcile::grants::{apply_grants, reconcile_grants};
use crate::reconcile::links::apply_links;
use crate::reconcile::outcome::{AccountResult, AccountState, FailedStage, OperationOutcome};
use crate::reconcile::task_group::run_all;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// One account at a time, in snapshot order.
    #[default]
    Sequential,
    /// All accounts in flight together.
    Parallel,
}

pub struct BatchRunner<'a, P: SessionProvider> {
    provider: &'a P,
    sink: &'a dyn LogSink,
    stats: RunStats,
    parallelism: Option<usize>,
}

fn transition(account: &str, state: &mut AccountState, next: AccountState) {
    debug!("{account}: {state:?} -> {next:?}");
    *state = next;
}

impl<'a, P: SessionProvider> BatchRunner<'a, P> {
    pub fn new(provider: &'a P, sink: &'a dyn LogSink) -> Self {
        Self {
            provider,
            sink,
            stats: RunStats::default(),
            parallelism: None,
        }
    }

    /// Caps the number of accounts in flight in parallel mode.
    pub fn with_parallelism(mut self, parallelism: Option<usize>) -> Self {
        self.parallelism = parallelism;
        self
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Returns exactly one result per input account, in input order.
    pub async fn run(&self, accounts: &[AccountSnapshot], mode: RunMode) -> Vec<AccountResult> {
        self.sink.info(
            "IMPORT",
            &format!("Reconciling shared folders for {} account(s)", accounts.len()),
        );
        let results = match mode {
            RunMode::Sequential => {
                let mut results = Vec::with_capacity(accounts.len());
                for account in accounts {
                    results.push(self.reconcile_account(account).await);
                }
                results
            }
            RunMode::Parallel => {
                run_all(
                    accounts.iter().map(|account| self.reconcile_account(account)),
                    self.parallelism,
                )
                .await
            }
        };
        self.sink.info("IMPORT", &format!("Shared folders: {}", self.stats));
        results
    }

    pub async fn reconcile_account(&self, account: &AccountSnapshot) -> AccountResult {
        let name = account.name.as_str();
        let result = self.reconcile_account_inner(account).await;
        self.stats.record(&result);

        match &result.state {
            AccountState::Failed { stage, reason } => {
                self.sink
                    .error(name, &format!("Failed during {stage}: {reason}"));
            }
            _ => {
                let failed = result.failures().count();
                if failed == 0 {
                    self.sink
                        .success(name, "Shared folders have been reconciled");
                } else {
                    self.sink.error(
                        name,
                        &format!("Shared folders reconciled with {failed} failed operation(s)"),
                    );
                }
            }
        }
        result
    }

    async fn reconcile_account_inner(&self, account: &AccountSnapshot) -> AccountResult {
        let name = account.name.as_str();
        let mut state = AccountState::Pending;

        let session = match self.provider.delegate(name).await {
            Ok(session) => session,
            Err(err) => {
                return AccountResult::failed(name, FailedStage::SessionAcquisition, err.to_string());
            }
        };
        let client = self.provider.connect(session);
        transition(name, &mut state, AccountState::SessionAcquired);

        let live = match client.list_folders().await {
            Ok(live) => live,
            Err(err) => {
                return AccountResult::failed(name, FailedStage::FolderListing, err.to_string());
            }
        };

        let mut outcomes: Vec<OperationOutcome> = Vec::new();

        let grant_plan = reconcile_grants(account.desired_folders(), &live.folders);
        outcomes.extend(apply_grants(&client, &grant_plan, name, self.sink).await);
        transition(name, &mut state, AccountState::GrantsReconciled);

        outcomes.extend(
            apply_links(&client, account.desired_links(), &live.links, name, self.sink).await,
        );
        transition(name, &mut state, AccountState::LinksReconciled);

        transition(name, &mut state, AccountState::Done);
        AccountResult {
            account: account.name.clone(),
            state,
            outcomes,
        }
    }
}
