#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use zimbra_migrate::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Delegate(String),
    ListFolders(String),
    Grant {
        account: String,
        folder_id: String,
        grant: Grant,
    },
    DeleteLink {
        account: String,
        link_id: String,
    },
    CreateMountpoint {
        account: String,
        spec: MountpointSpec,
    },
    GetAllAccounts,
    GetAccount(String),
    ModifyAccount {
        id: String,
        pairs: Vec<(&'static str, String)>,
    },
    CreateAccount(String),
    AddAlias {
        id: String,
        alias: String,
    },
}

impl Call {
    pub fn account(&self) -> Option<&str> {
        match self {
            Call::Delegate(a) | Call::ListFolders(a) => Some(a),
            Call::Grant { account, .. }
            | Call::DeleteLink { account, .. }
            | Call::CreateMountpoint { account, .. } => Some(account),
            _ => None,
        }
    }
}

fn fault(reason: &str) -> Error {
    Error::remote_fault(reason, Some("service.FAILURE".to_string()))
}

/// In-memory installation recording every call made against it.
#[derive(Default)]
pub struct FakeInstallation {
    pub listings: HashMap<String, FolderListing>,
    pub accounts: Vec<AccountSnapshot>,
    pub session_failures: HashSet<String>,
    pub listing_failures: HashSet<String>,
    /// `(folder_id, delegate)` pairs whose grant is rejected.
    pub grant_failures: HashSet<(String, String)>,
    pub delete_failures: HashSet<String>,
    pub create_failures: HashSet<String>,
    pub alias_failures: HashSet<String>,
    pub account_lookup_failures: HashSet<String>,
    pub list_delay: Option<Duration>,
    calls: Mutex<Vec<Call>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeInstallation {
    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, account: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.account() == Some(account))
            .collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn into_provider(self) -> FakeProvider {
        FakeProvider(Arc::new(self))
    }
}

#[derive(Clone)]
pub struct FakeProvider(pub Arc<FakeInstallation>);

impl std::ops::Deref for FakeProvider {
    type Target = FakeInstallation;

    fn deref(&self) -> &FakeInstallation {
        &self.0
    }
}

pub struct FakeClient {
    account: String,
    inst: Arc<FakeInstallation>,
}

#[async_trait]
impl DirectoryClient for FakeClient {
    async fn list_folders(&self) -> Result<FolderListing> {
        self.inst.record(Call::ListFolders(self.account.clone()));
        let now = self.inst.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.inst.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.inst.list_delay {
            tokio::time::sleep(delay).await;
        }
        self.inst.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.inst.listing_failures.contains(&self.account) {
            return Err(fault("mailbox is in maintenance mode"));
        }
        Ok(self
            .inst
            .listings
            .get(&self.account)
            .cloned()
            .unwrap_or_default())
    }

    async fn grant(&self, folder_id: &str, grant: &Grant) -> Result<()> {
        self.inst.record(Call::Grant {
            account: self.account.clone(),
            folder_id: folder_id.to_string(),
            grant: grant.clone(),
        });
        if self
            .inst
            .grant_failures
            .contains(&(folder_id.to_string(), grant.delegate.clone()))
        {
            return Err(fault(&format!("no such grantee: {}", grant.delegate)));
        }
        Ok(())
    }

    async fn delete_link(&self, link_id: &str) -> Result<()> {
        self.inst.record(Call::DeleteLink {
            account: self.account.clone(),
            link_id: link_id.to_string(),
        });
        if self.inst.delete_failures.contains(link_id) {
            return Err(fault("permission denied"));
        }
        Ok(())
    }

    async fn create_mountpoint(&self, spec: &MountpointSpec) -> Result<()> {
        self.inst.record(Call::CreateMountpoint {
            account: self.account.clone(),
            spec: spec.clone(),
        });
        if self.inst.create_failures.contains(&spec.name) {
            return Err(fault("object with that name already exists"));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionProvider for FakeProvider {
    type Client = FakeClient;

    async fn delegate(&self, account_name: &str) -> Result<SessionToken> {
        self.record(Call::Delegate(account_name.to_string()));
        if self.session_failures.contains(account_name) {
            return Err(fault(&format!("no such account: {account_name}")));
        }
        Ok(SessionToken::new(account_name))
    }

    fn connect(&self, session: SessionToken) -> FakeClient {
        FakeClient {
            account: session.as_str().to_string(),
            inst: self.0.clone(),
        }
    }
}

#[async_trait]
impl AccountDirectory for FakeProvider {
    async fn get_all_accounts(&self) -> Result<Vec<AccountSnapshot>> {
        self.record(Call::GetAllAccounts);
        Ok(self.accounts.clone())
    }

    async fn get_account_by_name(&self, name: &str) -> Result<AccountSnapshot> {
        self.record(Call::GetAccount(name.to_string()));
        if self.account_lookup_failures.contains(name) {
            return Err(fault(&format!("no such account: {name}")));
        }
        self.accounts
            .iter()
            .find(|a| a.name == name)
            .cloned()
            .ok_or_else(|| fault(&format!("no such account: {name}")))
    }

    async fn modify_account(&self, account_id: &str, update: &AttributeUpdate) -> Result<()> {
        self.record(Call::ModifyAccount {
            id: account_id.to_string(),
            pairs: update.to_ldap_pairs(),
        });
        Ok(())
    }

    async fn create_account(&self, name: &str, _update: &AttributeUpdate) -> Result<()> {
        self.record(Call::CreateAccount(name.to_string()));
        Ok(())
    }

    async fn add_account_alias(&self, account_id: &str, alias: &str) -> Result<()> {
        self.record(Call::AddAlias {
            id: account_id.to_string(),
            alias: alias.to_string(),
        });
        if self.alias_failures.contains(alias) {
            return Err(fault("alias already exists"));
        }
        Ok(())
    }
}

/// Sink that keeps every report line in memory.
#[derive(Default)]
pub struct RecordingSink {
    lines: Mutex<Vec<(String, LogLevel, String)>>,
}

impl RecordingSink {
    pub fn lines(&self) -> Vec<(String, LogLevel, String)> {
        self.lines.lock().unwrap().clone()
    }

    pub fn for_account(&self, account: &str) -> Vec<(LogLevel, String)> {
        self.lines()
            .into_iter()
            .filter(|(a, _, _)| a == account)
            .map(|(_, level, message)| (level, message))
            .collect()
    }
}

impl LogSink for RecordingSink {
    fn record(&self, account: &str, level: LogLevel, message: &str) {
        self.lines
            .lock()
            .unwrap()
            .push((account.to_string(), level, message.to_string()));
    }
}

pub fn folder(id: &str, path: &str, grants: Vec<Grant>) -> Folder {
    Folder {
        id: id.to_string(),
        name: path.rsplit('/').next().unwrap_or_default().to_string(),
        path: path.to_string(),
        view: Some("message".to_string()),
        grants,
    }
}

pub fn healthy_link(id: &str, path: &str, owner: &str) -> FolderLink {
    FolderLink {
        id: id.to_string(),
        name: path.rsplit('/').next().unwrap_or_default().to_string(),
        path: path.to_string(),
        broken: false,
        view: Some("message".to_string()),
        permission: Some("r".to_string()),
        owner: Some(owner.to_string()),
        rest: None,
        parent_folder_id: Some("1".to_string()),
        remote_path: Some(path.to_string()),
    }
}

pub fn broken_link(id: &str, path: &str) -> FolderLink {
    FolderLink {
        id: id.to_string(),
        name: path.rsplit('/').next().unwrap_or_default().to_string(),
        path: path.to_string(),
        broken: true,
        ..Default::default()
    }
}

pub fn account(name: &str) -> AccountSnapshot {
    AccountSnapshot {
        id: format!("src-{name}"),
        name: name.to_string(),
        folders: Some(vec![]),
        folder_links: Some(vec![]),
        ..Default::default()
    }
}
