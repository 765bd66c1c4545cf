//! `accounts.json`: the snapshot file exchanged between export and import.

use std::fs;
use std::path::{Path, PathBuf};

use crate::base::model::AccountSnapshot;
use crate::ops::interface::SnapshotSource;
use crate::utils::error::Result;

#[derive(Debug, Clone)]
pub struct JsonSnapshot {
    path: PathBuf,
    accounts: Vec<AccountSnapshot>,
}

impl JsonSnapshot {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let accounts: Vec<AccountSnapshot> = serde_json::from_str(&content)?;
        Ok(Self {
            path: path.to_path_buf(),
            accounts,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl SnapshotSource for JsonSnapshot {
    fn accounts(&self) -> Vec<AccountSnapshot> {
        self.accounts.clone()
    }
}

pub fn write_snapshot(path: impl AsRef<Path>, accounts: &[AccountSnapshot]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(accounts)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::model::{Folder, FolderLink, Grant};

    #[test]
    fn test_write_then_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("accounts.json");
        let account = AccountSnapshot {
            id: "a1".into(),
            name: "dave@example.com".into(),
            folders: Some(vec![Folder {
                id: "257".into(),
                name: "Shared".into(),
                path: "/Shared".into(),
                view: Some("message".into()),
                grants: vec![Grant::new("eve@example.com", "r", "usr")],
            }]),
            folder_links: Some(vec![FolderLink {
                id: "300".into(),
                name: "Team".into(),
                path: "/Team".into(),
                owner: Some("bob@example.com".into()),
                remote_path: Some("/Team".into()),
                view: Some("message".into()),
                parent_folder_id: Some("1".into()),
                ..Default::default()
            }]),
            ..Default::default()
        };
        write_snapshot(&path, std::slice::from_ref(&account)).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"folderLinks\""));
        assert!(raw.contains("\"ownerPath\""));
        assert!(raw.contains("\"d\": \"eve@example.com\""));

        let snapshot = JsonSnapshot::open(&path).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.accounts(), vec![account]);
    }

    #[test]
    fn test_open_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = JsonSnapshot::open(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, crate::utils::error::Error::Io(_)));
    }

    #[test]
    fn test_open_rejects_non_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.json");
        fs::write(&path, r#"{"name": "x@example.com"}"#).unwrap();
        let err = JsonSnapshot::open(&path).unwrap_err();
        assert!(matches!(err, crate::utils::error::Error::Json(_)));
    }
}
