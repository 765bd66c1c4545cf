use serde::{Deserialize, Serialize};
use std::fmt;

use crate::base::model::Grant;

/// Identity of a single operation, stable enough to retry it later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OperationTarget {
    /// The folder itself, for failures that block all of its grants.
    Folder { path: String },
    Grant { folder_path: String, grant: Grant },
    LinkDeletion { path: String, link_id: String },
    LinkCreation { path: String },
}

impl fmt::Display for OperationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationTarget::Folder { path } => write!(f, "folder '{path}'"),
            OperationTarget::Grant { folder_path, grant } => {
                write!(f, "grant {grant} on '{folder_path}'")
            }
            OperationTarget::LinkDeletion { path, link_id } => {
                write!(f, "delete link {link_id} at '{path}'")
            }
            OperationTarget::LinkCreation { path } => write!(f, "mount point '{path}'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum OutcomeStatus {
    Applied,
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationOutcome {
    pub target: OperationTarget,
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

impl OperationOutcome {
    pub fn applied(target: OperationTarget) -> Self {
        Self {
            target,
            status: OutcomeStatus::Applied,
        }
    }

    pub fn skipped(target: OperationTarget, reason: impl Into<String>) -> Self {
        Self {
            target,
            status: OutcomeStatus::Skipped(reason.into()),
        }
    }

    pub fn failed(target: OperationTarget, reason: impl Into<String>) -> Self {
        Self {
            target,
            status: OutcomeStatus::Failed(reason.into()),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, OutcomeStatus::Failed(_))
    }
}

/// Stage an account had reached when it could not continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailedStage {
    SessionAcquisition,
    FolderListing,
}

impl fmt::Display for FailedStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailedStage::SessionAcquisition => write!(f, "session acquisition"),
            FailedStage::FolderListing => write!(f, "folder listing"),
        }
    }
}

/// Lifecycle of one account inside a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AccountState {
    Pending,
    SessionAcquired,
    GrantsReconciled,
    LinksReconciled,
    Done,
    Failed { stage: FailedStage, reason: String },
}

impl AccountState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AccountState::Done | AccountState::Failed { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Success,
    Partial,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountResult {
    pub account: String,
    pub state: AccountState,
    pub outcomes: Vec<OperationOutcome>,
}

impl AccountResult {
    pub fn failed(account: impl Into<String>, stage: FailedStage, reason: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            state: AccountState::Failed {
                stage,
                reason: reason.into(),
            },
            outcomes: vec![],
        }
    }

    pub fn is_done(&self) -> bool {
        self.state == AccountState::Done
    }

    /// `Done` with no failed operation is a success; `Done` with some is partial.
    pub fn status(&self) -> AccountStatus {
        match &self.state {
            AccountState::Done if self.outcomes.iter().any(|o| o.is_failed()) => {
                AccountStatus::Partial
            }
            AccountState::Done => AccountStatus::Success,
            _ => AccountStatus::Failure,
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &OperationOutcome> {
        self.outcomes.iter().filter(|o| o.is_failed())
    }

    pub fn count(&self, pred: impl Fn(&OutcomeStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grant_target() -> OperationTarget {
        OperationTarget::Grant {
            folder_path: "/Inbox/Shared".into(),
            grant: Grant::new("alice", "r", "usr"),
        }
    }

    #[test]
    fn test_status_aggregation() {
        let mut result = AccountResult {
            account: "a@example.com".into(),
            state: AccountState::Done,
            outcomes: vec![OperationOutcome::applied(grant_target())],
        };
        assert_eq!(result.status(), AccountStatus::Success);

        result.outcomes.push(OperationOutcome::failed(
            OperationTarget::LinkCreation {
                path: "/Team".into(),
            },
            "permission denied",
        ));
        assert_eq!(result.status(), AccountStatus::Partial);
        assert_eq!(result.failures().count(), 1);

        let failed = AccountResult::failed(
            "b@example.com",
            FailedStage::SessionAcquisition,
            "no such account",
        );
        assert_eq!(failed.status(), AccountStatus::Failure);
        assert!(failed.state.is_terminal());
        assert!(!failed.is_done());
    }

    #[test]
    fn test_skipped_done_is_success() {
        let result = AccountResult {
            account: "a@example.com".into(),
            state: AccountState::Done,
            outcomes: vec![OperationOutcome::skipped(grant_target(), "already granted")],
        };
        assert_eq!(result.status(), AccountStatus::Success);
        assert_eq!(result.count(|s| matches!(s, OutcomeStatus::Skipped(_))), 1);
    }

    #[test]
    fn test_target_display() {
        assert_eq!(grant_target().to_string(), "grant usr:alice:r on '/Inbox/Shared'");
        assert_eq!(
            OperationTarget::LinkDeletion {
                path: "/Team".into(),
                link_id: "77".into()
            }
            .to_string(),
            "delete link 77 at '/Team'"
        );
    }

    #[test]
    fn test_outcome_serializes_with_reason() {
        let outcome = OperationOutcome::failed(
            OperationTarget::Folder {
                path: "/Projects".into(),
            },
            "folder not found on target",
        );
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["target"]["kind"], "folder");
        assert_eq!(value["status"], "failed");
        assert_eq!(value["reason"], "folder not found on target");
    }
}
