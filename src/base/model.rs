use serde::{Deserialize, Serialize};

/// Path of the account root folder. Its grants are never compared.
pub const ROOT_FOLDER_PATH: &str = "/";
pub const ROOT_FOLDER_NAME: &str = "USER_ROOT";

/// A permission entry on a folder. Equality covers all three fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grant {
    #[serde(rename = "d", alias = "delegate", default)]
    pub delegate: String,
    #[serde(rename = "perm", alias = "permission")]
    pub permission: String,
    #[serde(rename = "gt", alias = "granteeType")]
    pub grantee_type: String,
}

impl Grant {
    pub fn new(
        delegate: impl Into<String>,
        permission: impl Into<String>,
        grantee_type: impl Into<String>,
    ) -> Self {
        Self {
            delegate: delegate.into(),
            permission: permission.into(),
            grantee_type: grantee_type.into(),
        }
    }
}

impl std::fmt::Display for Grant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.grantee_type, self.delegate, self.permission)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: String,
    pub name: String,
    /// Absolute path within the account tree; the join key between installations.
    pub path: String,
    #[serde(default)]
    pub view: Option<String>,
    #[serde(default)]
    pub grants: Vec<Grant>,
}

impl Folder {
    pub fn is_root(&self) -> bool {
        self.path == ROOT_FOLDER_PATH || self.name == ROOT_FOLDER_NAME
    }
}

/// A mount point in one account that refers to a folder owned by another account.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderLink {
    pub id: String,
    pub name: String,
    pub path: String,
    /// The installation could not resolve the owner or the remote folder.
    #[serde(default)]
    pub broken: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Server-built REST URL of the remote folder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_folder_id: Option<String>,
    /// Folder path inside the owner's mailbox.
    #[serde(
        rename = "ownerPath",
        alias = "remotePath",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub remote_path: Option<String>,
}

impl FolderLink {
    pub fn is_healthy(&self) -> bool {
        !self.broken
    }
}

/// Result of listing one account's tree on an installation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderListing {
    pub folders: Vec<Folder>,
    pub links: Vec<FolderLink>,
}

/// Plain directory attributes captured at export time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quota: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hidden_forwarding_addresses: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forwarding_addresses: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incoming_filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outgoing_filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zimbra_auth_ldap_external_dn: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// One account as captured in a snapshot: the desired state for the target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSnapshot {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub attributes: AccountAttributes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folders: Option<Vec<Folder>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_links: Option<Vec<FolderLink>>,
}

impl AccountSnapshot {
    pub fn desired_folders(&self) -> &[Folder] {
        self.folders.as_deref().unwrap_or_default()
    }

    pub fn desired_links(&self) -> &[FolderLink] {
        self.folder_links.as_deref().unwrap_or_default()
    }
}

/// Delegated credential scoped to a single account.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken(..)")
    }
}
