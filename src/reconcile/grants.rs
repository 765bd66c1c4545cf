//! Additive grant reconciliation: desired grants missing on the target are added,
//! grants present only on the target are left alone.

use indexmap::IndexSet;
use log::debug;

use crate::base::model::{Folder, Grant};
use crate::ops::interface::{DirectoryClient, LogSink};
use crate::reconcile::lookup::{Lookup, PathIndex};
use crate::reconcile::outcome::{OperationOutcome, OperationTarget};
use crate::reconcile::task_group::settle_all;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantAdd {
    pub folder_id: String,
    pub folder_path: String,
    pub grant: Grant,
}

impl GrantAdd {
    fn target(&self) -> OperationTarget {
        OperationTarget::Grant {
            folder_path: self.folder_path.clone(),
            grant: self.grant.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderNotFound {
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrantPlan {
    pub operations: Vec<GrantAdd>,
    pub errors: Vec<FolderNotFound>,
    /// Desired grants the target already carries.
    pub already_present: Vec<(String, Grant)>,
}

pub fn reconcile_grants(desired: &[Folder], live: &[Folder]) -> GrantPlan {
    let live_index = PathIndex::new(live, |f| f.path.as_str());
    let mut plan = GrantPlan::default();

    for folder in desired.iter().filter(|f| !f.is_root()) {
        let target = match live_index.first(&folder.path) {
            Lookup::Found(target) => target,
            Lookup::NotFound => {
                plan.errors.push(FolderNotFound {
                    path: folder.path.clone(),
                });
                continue;
            }
        };

        let existing: IndexSet<&Grant> = target.grants.iter().collect();
        let wanted: IndexSet<&Grant> = folder.grants.iter().collect();
        for grant in wanted {
            if existing.contains(grant) {
                plan.already_present
                    .push((folder.path.clone(), grant.clone()));
                continue;
            }
            plan.operations.push(GrantAdd {
                folder_id: target.id.clone(),
                folder_path: folder.path.clone(),
                grant: grant.clone(),
            });
        }
    }
    plan
}

/// Issues every grant addition concurrently and records one outcome per grant.
pub async fn apply_grants<C: DirectoryClient + ?Sized>(
    client: &C,
    plan: &GrantPlan,
    account: &str,
    sink: &dyn LogSink,
) -> Vec<OperationOutcome> {
    let mut outcomes = Vec::with_capacity(
        plan.errors.len() + plan.already_present.len() + plan.operations.len(),
    );

    for missing in &plan.errors {
        sink.error(
            account,
            &format!("Folder '{}' not found in target account", missing.path),
        );
        outcomes.push(OperationOutcome::failed(
            OperationTarget::Folder {
                path: missing.path.clone(),
            },
            "folder not found in target account",
        ));
    }

    for (path, grant) in &plan.already_present {
        outcomes.push(OperationOutcome::skipped(
            OperationTarget::Grant {
                folder_path: path.clone(),
                grant: grant.clone(),
            },
            "already granted",
        ));
    }

    debug!("{account}: dispatching {} grant(s)", plan.operations.len());
    let results = settle_all(
        plan.operations
            .iter()
            .map(|op| client.grant(&op.folder_id, &op.grant)),
    )
    .await;

    for (op, result) in plan.operations.iter().zip(results) {
        match result {
            Ok(()) => outcomes.push(OperationOutcome::applied(op.target())),
            Err(err) => {
                sink.error(
                    account,
                    &format!(
                        "Failed to grant {} on '{}': {err}",
                        op.grant, op.folder_path
                    ),
                );
                outcomes.push(OperationOutcome::failed(op.target(), err.to_string()));
            }
        }
    }
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder(id: &str, path: &str, grants: Vec<Grant>) -> Folder {
        Folder {
            id: id.to_string(),
            name: path.rsplit('/').next().unwrap_or_default().to_string(),
            path: path.to_string(),
            view: Some("message".to_string()),
            grants,
        }
    }

    #[test]
    fn test_missing_grant_is_added() {
        let desired = vec![folder(
            "2001",
            "/Inbox/Shared",
            vec![Grant::new("alice", "r", "usr")],
        )];
        let live = vec![folder("345", "/Inbox/Shared", vec![])];

        let plan = reconcile_grants(&desired, &live);
        assert_eq!(
            plan.operations,
            vec![GrantAdd {
                folder_id: "345".to_string(),
                folder_path: "/Inbox/Shared".to_string(),
                grant: Grant::new("alice", "r", "usr"),
            }]
        );
        assert!(plan.errors.is_empty());
    }

    #[test]
    fn test_rerun_against_converged_state_is_empty() {
        let desired = vec![
            folder(
                "2001",
                "/Inbox/Shared",
                vec![Grant::new("alice", "r", "usr"), Grant::new("team", "rwidx", "grp")],
            ),
            folder("2002", "/Calendar", vec![Grant::new("bob", "r", "usr")]),
        ];
        let mut live = vec![
            folder("10", "/Inbox/Shared", vec![Grant::new("team", "rwidx", "grp")]),
            folder("11", "/Calendar", vec![]),
        ];

        let first = reconcile_grants(&desired, &live);
        assert_eq!(first.operations.len(), 2);

        for op in &first.operations {
            let target = live.iter_mut().find(|f| f.id == op.folder_id).unwrap();
            target.grants.push(op.grant.clone());
        }

        let second = reconcile_grants(&desired, &live);
        assert!(second.operations.is_empty());
        assert_eq!(second.already_present.len(), 3);
    }

    #[test]
    fn test_target_only_grants_are_kept() {
        let desired = vec![folder("1", "/Notes", vec![])];
        let live = vec![folder("9", "/Notes", vec![Grant::new("mallory", "rwidx", "usr")])];
        let plan = reconcile_grants(&desired, &live);
        assert!(plan.operations.is_empty());
        assert!(plan.errors.is_empty());
    }

    #[test]
    fn test_grant_equality_uses_all_fields() {
        let desired = vec![folder("1", "/Notes", vec![Grant::new("alice", "rw", "usr")])];
        let live = vec![folder("9", "/Notes", vec![Grant::new("alice", "r", "usr")])];
        let plan = reconcile_grants(&desired, &live);
        assert_eq!(plan.operations.len(), 1);
        assert_eq!(plan.operations[0].grant.permission, "rw");
    }

    #[test]
    fn test_duplicate_desired_grants_added_once() {
        let desired = vec![folder(
            "1",
            "/Notes",
            vec![Grant::new("alice", "r", "usr"), Grant::new("alice", "r", "usr")],
        )];
        let live = vec![folder("9", "/Notes", vec![])];
        assert_eq!(reconcile_grants(&desired, &live).operations.len(), 1);
    }

    #[test]
    fn test_missing_folder_does_not_block_others() {
        let desired = vec![
            folder("1", "/Projects", vec![Grant::new("alice", "r", "usr")]),
            folder("2", "/Inbox/Shared", vec![Grant::new("bob", "r", "usr")]),
        ];
        let live = vec![folder("20", "/Inbox/Shared", vec![])];

        let plan = reconcile_grants(&desired, &live);
        assert_eq!(
            plan.errors,
            vec![FolderNotFound {
                path: "/Projects".to_string()
            }]
        );
        assert_eq!(plan.operations.len(), 1);
        assert_eq!(plan.operations[0].folder_id, "20");
        assert_eq!(plan.operations[0].grant.delegate, "bob");
    }

    #[test]
    fn test_root_folder_is_ignored() {
        let mut root = folder("1", "/", vec![Grant::new("admin", "rwidxa", "usr")]);
        root.name = "USER_ROOT".to_string();
        let plan = reconcile_grants(&[root], &[]);
        assert!(plan.operations.is_empty());
        assert!(plan.errors.is_empty());
    }

    #[test]
    fn test_path_match_is_case_sensitive() {
        let desired = vec![folder("1", "/Inbox/shared", vec![Grant::new("a", "r", "usr")])];
        let live = vec![folder("2", "/Inbox/Shared", vec![])];
        let plan = reconcile_grants(&desired, &live);
        assert_eq!(plan.errors.len(), 1);
        assert!(plan.operations.is_empty());
    }
}
