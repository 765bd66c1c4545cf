//! Plain attribute import: modifying existing accounts or creating missing ones.

use std::collections::HashSet;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::prelude::*;
use crate::reconcile::task_group::{run_all, settle_all};

const IMPORT: &str = "IMPORT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ImportAction {
    /// Update accounts that already exist on the target.
    #[default]
    Modify,
    /// Create accounts the target does not have yet.
    Create,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportEntry {
    pub account: String,
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

impl ImportEntry {
    fn new(account: &str, status: OutcomeStatus) -> Self {
        Self {
            account: account.to_string(),
            status,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AttributeImport {
    pub action: ImportAction,
    pub options: Vec<ImportOption>,
    pub mode: RunMode,
    pub parallelism: Option<usize>,
}

impl AttributeImport {
    /// Options that carry plain attributes for the chosen action.
    fn effective_options(&self) -> Vec<ImportOption> {
        self.options
            .iter()
            .copied()
            .filter(|o| *o != ImportOption::SharedFolders)
            .filter(|o| self.action == ImportAction::Modify || !o.requires_existing_account())
            .collect()
    }

    /// Shared folders are reconciled only for accounts that already exist.
    pub fn reconciles_shared_folders(&self) -> bool {
        self.action == ImportAction::Modify && self.options.contains(&ImportOption::SharedFolders)
    }

    /// Whether anything is left to do once shared folders are handled elsewhere.
    pub fn has_work(&self) -> bool {
        !self.effective_options().is_empty()
    }

    pub async fn run<D: AccountDirectory>(
        &self,
        directory: &D,
        accounts: &[AccountSnapshot],
        sink: &dyn LogSink,
    ) -> Vec<ImportEntry> {
        let options = self.effective_options();
        sink.info(
            IMPORT,
            &format!(
                "Importing {:?} with options: {}",
                self.action,
                options.iter().map(|o| format!("{o:?}")).join(", ")
            ),
        );

        let entries = match self.action {
            ImportAction::Modify => {
                self.dispatch(accounts, |account| modify_one(directory, account, &options, sink))
                    .await
            }
            ImportAction::Create => {
                let existing = match directory.get_all_accounts().await {
                    Ok(existing) => existing,
                    Err(err) => {
                        sink.error(IMPORT, &format!("Failed to get accounts: {err}"));
                        return vec![];
                    }
                };
                let existing: HashSet<&str> = existing.iter().map(|a| a.name.as_str()).collect();
                let (present, missing): (Vec<&AccountSnapshot>, Vec<&AccountSnapshot>) = accounts
                    .iter()
                    .partition(|a| existing.contains(a.name.as_str()));
                let mut entries: Vec<ImportEntry> = present
                    .iter()
                    .map(|a| {
                        ImportEntry::new(&a.name, OutcomeStatus::Skipped("already exists".into()))
                    })
                    .collect();
                entries.extend(
                    self.dispatch(missing, |account| create_one(directory, account, &options, sink))
                        .await,
                );
                entries
            }
        };

        sink.info(IMPORT, "All accounts have been imported");
        entries
    }

    async fn dispatch<'a, I, F, Fut>(&self, accounts: I, f: F) -> Vec<ImportEntry>
    where
        I: IntoIterator<Item = &'a AccountSnapshot>,
        F: Fn(&'a AccountSnapshot) -> Fut,
        Fut: Future<Output = ImportEntry>,
    {
        match self.mode {
            RunMode::Sequential => {
                let mut entries = vec![];
                for account in accounts {
                    entries.push(f(account).await);
                }
                entries
            }
            RunMode::Parallel => run_all(accounts.into_iter().map(f), self.parallelism).await,
        }
    }
}

async fn modify_one<D: AccountDirectory>(
    directory: &D,
    account: &AccountSnapshot,
    options: &[ImportOption],
    sink: &dyn LogSink,
) -> ImportEntry {
    let name = account.name.as_str();
    let target = match directory.get_account_by_name(name).await {
        Ok(target) => target,
        Err(err) => {
            let reason = format!("Failed to get account: {err}");
            sink.error(name, &reason);
            return ImportEntry::new(name, OutcomeStatus::Failed(reason));
        }
    };

    let update = AttributeUpdate::select(account, options);
    if update.is_empty() {
        return ImportEntry::new(name, OutcomeStatus::Skipped("nothing to import".into()));
    }
    if !update.to_ldap_pairs().is_empty()
        && let Err(err) = directory.modify_account(&target.id, &update).await
    {
        let reason = format!("Failed to modify account: {err}");
        sink.error(name, &reason);
        return ImportEntry::new(name, OutcomeStatus::Failed(reason));
    }

    let aliases = update.aliases.as_deref().unwrap_or_default();
    let results = settle_all(
        aliases
            .iter()
            .map(|alias| directory.add_account_alias(&target.id, alias)),
    )
    .await;
    let mut failed = 0;
    for (alias, result) in aliases.iter().zip(results) {
        if let Err(err) = result {
            failed += 1;
            sink.error(name, &format!("Failed to add alias {alias}: {err}"));
        }
    }
    if failed > 0 {
        return ImportEntry::new(
            name,
            OutcomeStatus::Failed(format!("{failed} alias(es) could not be added")),
        );
    }

    sink.success(name, "Account has been modified");
    ImportEntry::new(name, OutcomeStatus::Applied)
}

async fn create_one<D: AccountDirectory>(
    directory: &D,
    account: &AccountSnapshot,
    options: &[ImportOption],
    sink: &dyn LogSink,
) -> ImportEntry {
    let name = account.name.as_str();
    let update = AttributeUpdate::select(account, options);
    match directory.create_account(name, &update).await {
        Ok(()) => {
            sink.success(name, "Account has been created");
            ImportEntry::new(name, OutcomeStatus::Applied)
        }
        Err(err) => {
            let reason = format!("Failed to create account: {err}");
            sink.error(name, &reason);
            ImportEntry::new(name, OutcomeStatus::Failed(reason))
        }
    }
}
