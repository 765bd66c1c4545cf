//! Contracts of the collaborators the reconciliation core drives.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::base::attributes::AttributeUpdate;
use crate::base::model::{AccountSnapshot, FolderListing, Grant, SessionToken};
use crate::utils::error::Result;

/// Everything needed to create a mount point; all fields validated non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MountpointSpec {
    pub name: String,
    pub owner: String,
    pub remote_path: String,
    pub view: String,
    pub parent_folder_id: String,
}

/// Per-account access to the target installation, bound to one delegated session.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    async fn list_folders(&self) -> Result<FolderListing>;

    async fn grant(&self, folder_id: &str, grant: &Grant) -> Result<()>;

    async fn delete_link(&self, link_id: &str) -> Result<()>;

    async fn create_mountpoint(&self, spec: &MountpointSpec) -> Result<()>;
}

#[async_trait]
pub trait SessionProvider: Send + Sync {
    type Client: DirectoryClient;

    async fn delegate(&self, account_name: &str) -> Result<SessionToken>;

    fn connect(&self, session: SessionToken) -> Self::Client;
}

/// Administrative account directory of one installation.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    async fn get_all_accounts(&self) -> Result<Vec<AccountSnapshot>>;

    async fn get_account_by_name(&self, name: &str) -> Result<AccountSnapshot>;

    async fn modify_account(&self, account_id: &str, update: &AttributeUpdate) -> Result<()>;

    async fn create_account(&self, name: &str, update: &AttributeUpdate) -> Result<()>;

    async fn add_account_alias(&self, account_id: &str, alias: &str) -> Result<()>;
}

pub trait SnapshotSource {
    fn accounts(&self) -> Vec<AccountSnapshot>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Success => "SUCCESS",
            LogLevel::Error => "ERROR",
        }
    }
}

/// User-facing report channel. Must accept concurrent writers.
pub trait LogSink: Send + Sync {
    fn record(&self, account: &str, level: LogLevel, message: &str);

    fn info(&self, account: &str, message: &str) {
        self.record(account, LogLevel::Info, message)
    }

    fn success(&self, account: &str, message: &str) {
        self.record(account, LogLevel::Success, message)
    }

    fn error(&self, account: &str, message: &str) {
        self.record(account, LogLevel::Error, message)
    }
}
