//! Mount-point reconciliation.
//!
//! Runs in two phases per account: broken target links occupying a desired path are
//! deleted first, then the creation set is computed against what is left. Creation
//! never starts before every deletion of the pass has settled.

use indexmap::IndexSet;
use log::debug;
use std::collections::HashSet;

use crate::base::model::FolderLink;
use crate::ops::interface::{DirectoryClient, LogSink, MountpointSpec};
use crate::reconcile::lookup::PathIndex;
use crate::reconcile::outcome::{OperationOutcome, OperationTarget};
use crate::reconcile::task_group::settle_all;

/// A broken target link that sits on a path a desired link should occupy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleLink {
    pub id: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkFieldMissing {
    pub path: String,
    pub field: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMount {
    pub path: String,
    pub spec: MountpointSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreationPlan {
    pub creations: Vec<PlannedMount>,
    pub errors: Vec<LinkFieldMissing>,
    /// Paths already served by a healthy target link.
    pub healthy: Vec<String>,
    /// Paths listed more than once in the desired state; only the first is used.
    pub duplicates: Vec<String>,
}

/// Outcome of both phases assuming every scheduled deletion succeeds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkPlan {
    pub deletions: Vec<String>,
    pub creations: Vec<MountpointSpec>,
    pub errors: Vec<LinkFieldMissing>,
}

pub fn plan_deletions(desired: &[FolderLink], live: &[FolderLink]) -> Vec<StaleLink> {
    let desired_paths: HashSet<&str> = desired.iter().map(|l| l.path.as_str()).collect();
    live.iter()
        .filter(|l| l.broken && desired_paths.contains(l.path.as_str()))
        .map(|l| StaleLink {
            id: l.id.clone(),
            path: l.path.clone(),
        })
        .collect()
}

fn required<'a>(
    value: &'a Option<String>,
    field: &'static str,
    path: &str,
) -> Result<&'a str, LinkFieldMissing> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(LinkFieldMissing {
            path: path.to_string(),
            field,
        }),
    }
}

pub fn mountpoint_spec(link: &FolderLink) -> Result<MountpointSpec, LinkFieldMissing> {
    let path = link.path.as_str();
    Ok(MountpointSpec {
        name: link.name.clone(),
        owner: required(&link.owner, "owner", path)?.to_string(),
        remote_path: required(&link.remote_path, "remotePath", path)?.to_string(),
        view: required(&link.view, "view", path)?.to_string(),
        parent_folder_id: required(&link.parent_folder_id, "parentFolderId", path)?.to_string(),
    })
}

/// Computes the creation set once deletions have settled. `deleted` holds the ids
/// of target links that were actually removed.
pub fn plan_creations(
    desired: &[FolderLink],
    live: &[FolderLink],
    deleted: &HashSet<&str>,
) -> CreationPlan {
    let remaining: Vec<&FolderLink> = live
        .iter()
        .filter(|l| !deleted.contains(l.id.as_str()))
        .collect();
    let live_index = PathIndex::new(remaining, |l| l.path.as_str());

    let mut plan = CreationPlan::default();
    let mut seen: IndexSet<&str> = IndexSet::new();
    for link in desired {
        if !seen.insert(link.path.as_str()) {
            plan.duplicates.push(link.path.clone());
            continue;
        }
        if live_index.all(&link.path).iter().any(|l| l.is_healthy()) {
            plan.healthy.push(link.path.clone());
            continue;
        }
        match mountpoint_spec(link) {
            Ok(spec) => plan.creations.push(PlannedMount {
                path: link.path.clone(),
                spec,
            }),
            Err(missing) => plan.errors.push(missing),
        }
    }
    plan
}

pub fn reconcile_links(desired: &[FolderLink], live: &[FolderLink]) -> LinkPlan {
    let deletions = plan_deletions(desired, live);
    let deleted: HashSet<&str> = deletions.iter().map(|d| d.id.as_str()).collect();
    let creation = plan_creations(desired, live, &deleted);
    LinkPlan {
        deletions: deletions.iter().map(|d| d.id.clone()).collect(),
        creations: creation.creations.into_iter().map(|c| c.spec).collect(),
        errors: creation.errors,
    }
}

pub async fn apply_links<C: DirectoryClient + ?Sized>(
    client: &C,
    desired: &[FolderLink],
    live: &[FolderLink],
    account: &str,
    sink: &dyn LogSink,
) -> Vec<OperationOutcome> {
    let mut outcomes = Vec::new();

    let stale = plan_deletions(desired, live);
    debug!("{account}: deleting {} stale link(s)", stale.len());
    let results = settle_all(stale.iter().map(|s| client.delete_link(&s.id))).await;

    let mut deleted: HashSet<&str> = HashSet::new();
    for (link, result) in stale.iter().zip(results) {
        let target = OperationTarget::LinkDeletion {
            path: link.path.clone(),
            link_id: link.id.clone(),
        };
        match result {
            Ok(()) => {
                deleted.insert(link.id.as_str());
                outcomes.push(OperationOutcome::applied(target));
            }
            Err(err) => {
                sink.error(
                    account,
                    &format!("Failed to delete broken link '{}': {err}", link.path),
                );
                outcomes.push(OperationOutcome::failed(target, err.to_string()));
            }
        }
    }

    let plan = plan_creations(desired, live, &deleted);
    for path in &plan.healthy {
        outcomes.push(OperationOutcome::skipped(
            OperationTarget::LinkCreation { path: path.clone() },
            "healthy link already present",
        ));
    }
    for path in &plan.duplicates {
        outcomes.push(OperationOutcome::skipped(
            OperationTarget::LinkCreation { path: path.clone() },
            "duplicate path in snapshot",
        ));
    }
    for missing in &plan.errors {
        sink.error(
            account,
            &format!(
                "Cannot create mount point '{}': missing {}",
                missing.path, missing.field
            ),
        );
        outcomes.push(OperationOutcome::failed(
            OperationTarget::LinkCreation {
                path: missing.path.clone(),
            },
            format!("missing {}", missing.field),
        ));
    }

    debug!("{account}: creating {} mount point(s)", plan.creations.len());
    let results = settle_all(
        plan.creations
            .iter()
            .map(|c| client.create_mountpoint(&c.spec)),
    )
    .await;
    for (mount, result) in plan.creations.iter().zip(results) {
        let target = OperationTarget::LinkCreation {
            path: mount.path.clone(),
        };
        match result {
            Ok(()) => outcomes.push(OperationOutcome::applied(target)),
            Err(err) => {
                sink.error(
                    account,
                    &format!("Failed to create mount point '{}': {err}", mount.path),
                );
                outcomes.push(OperationOutcome::failed(target, err.to_string()));
            }
        }
    }
    outcomes
}
