//! Capturing the source installation into a snapshot.

use crate::prelude::*;
use crate::reconcile::task_group::run_all;

const EXPORT: &str = "EXPORT";

#[derive(Debug, Clone, Copy, Default)]
pub struct ExportOptions {
    /// Also capture every account's folders, grants and mount points.
    pub shared_folders: bool,
    pub mode: RunMode,
    pub parallelism: Option<usize>,
}

async fn attach_folders<P: SessionProvider>(
    provider: &P,
    account: &mut AccountSnapshot,
    sink: &dyn LogSink,
) {
    let listing = match provider.delegate(&account.name).await {
        Ok(session) => provider.connect(session).list_folders().await,
        Err(err) => Err(err),
    };
    match listing {
        Ok(listing) => {
            sink.success(
                &account.name,
                &format!(
                    "Exported {} folder(s) and {} mount point(s)",
                    listing.folders.len(),
                    listing.links.len()
                ),
            );
            account.folders = Some(listing.folders);
            account.folder_links = Some(listing.links);
        }
        Err(err) => sink.error(
            &account.name,
            &format!("Failed to export shared folders: {err}"),
        ),
    }
}

/// Lists the source accounts and optionally their folder trees. Only the initial
/// account listing can fail the export; per-account failures are logged.
pub async fn export_accounts<P>(
    admin: &P,
    options: ExportOptions,
    sink: &dyn LogSink,
) -> Result<Vec<AccountSnapshot>>
where
    P: AccountDirectory + SessionProvider,
{
    let mut accounts = admin.get_all_accounts().await?;
    sink.info(EXPORT, &format!("Found {} accounts", accounts.len()));

    if options.shared_folders {
        match options.mode {
            RunMode::Sequential => {
                for account in accounts.iter_mut() {
                    attach_folders(admin, account, sink).await;
                }
            }
            RunMode::Parallel => {
                run_all(
                    accounts
                        .iter_mut()
                        .map(|account| attach_folders(admin, account, sink)),
                    options.parallelism,
                )
                .await;
            }
        }
    }

    sink.info(EXPORT, "All accounts have been exported");
    Ok(accounts)
}
