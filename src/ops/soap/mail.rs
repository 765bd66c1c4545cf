use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::base::model::{
    Folder, FolderLink, FolderListing, Grant, ROOT_FOLDER_NAME, SessionToken,
};
use crate::ops::interface::{DirectoryClient, MountpointSpec};
use crate::ops::soap::{Namespace, SoapClient};
use crate::utils::error::Result;

#[derive(Debug, Default, Deserialize)]
struct RawAcl {
    #[serde(default)]
    grant: Vec<Grant>,
}

#[derive(Debug, Deserialize)]
struct RawFolder {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(rename = "absFolderPath", default)]
    abs_folder_path: String,
    #[serde(default)]
    view: Option<String>,
    #[serde(default)]
    acl: Option<RawAcl>,
    #[serde(default)]
    folder: Vec<RawFolder>,
    #[serde(default)]
    link: Vec<RawLink>,
}

#[derive(Debug, Deserialize)]
struct RawLink {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(rename = "absFolderPath", default)]
    abs_folder_path: String,
    #[serde(default)]
    broken: bool,
    #[serde(default)]
    view: Option<String>,
    #[serde(default)]
    perm: Option<String>,
    #[serde(default)]
    owner: Option<String>,
    #[serde(default)]
    rest: Option<String>,
    #[serde(default)]
    l: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GetFolderResponse {
    #[serde(default)]
    folder: Vec<RawFolder>,
}

/// Path of the shared folder inside the owner's mailbox, taken from the REST URL
/// (`https://host/home/<owner>/<path>`).
fn remote_path_from_rest(rest: &str, owner: &str) -> Option<String> {
    let (_, tail) = rest.split_once(owner)?;
    let decoded = urlencoding::decode(tail).ok()?;
    (!decoded.is_empty()).then(|| decoded.into_owned())
}

impl RawLink {
    fn into_link(self) -> FolderLink {
        if self.broken {
            return FolderLink {
                id: self.id,
                name: self.name,
                path: self.abs_folder_path,
                broken: true,
                ..Default::default()
            };
        }
        let remote_path = match (&self.rest, &self.owner) {
            (Some(rest), Some(owner)) => remote_path_from_rest(rest, owner),
            _ => None,
        };
        FolderLink {
            id: self.id,
            name: self.name,
            path: self.abs_folder_path,
            broken: false,
            view: self.view,
            permission: self.perm,
            owner: self.owner,
            rest: self.rest,
            parent_folder_id: self.l,
            remote_path,
        }
    }
}

fn flatten(raw: RawFolder, listing: &mut FolderListing) {
    let grants = if raw.name == ROOT_FOLDER_NAME {
        vec![]
    } else {
        raw.acl.map(|acl| acl.grant).unwrap_or_default()
    };
    listing.folders.push(Folder {
        id: raw.id,
        name: raw.name,
        path: raw.abs_folder_path,
        view: raw.view,
        grants,
    });
    // Children of a link belong to the owner's mailbox and are not descended into.
    listing
        .links
        .extend(raw.link.into_iter().map(RawLink::into_link));
    for child in raw.folder {
        flatten(child, listing);
    }
}

fn into_listing(resp: GetFolderResponse) -> FolderListing {
    let mut listing = FolderListing::default();
    for root in resp.folder {
        flatten(root, &mut listing);
    }
    listing
}

/// Mailbox-level client acting as one account through a delegated session.
#[derive(Debug, Clone)]
pub struct MailClient {
    soap: SoapClient,
}

impl MailClient {
    pub fn new(http: reqwest::Client, mail_url: &str, session: SessionToken) -> Self {
        Self {
            soap: SoapClient::new(http, mail_url, Some(session.as_str().to_string())),
        }
    }
}

#[async_trait]
impl DirectoryClient for MailClient {
    async fn list_folders(&self) -> Result<FolderListing> {
        let resp: GetFolderResponse = self
            .soap
            .invoke("GetFolder", Namespace::Mail, json!({ "tr": true }))
            .await?;
        Ok(into_listing(resp))
    }

    async fn grant(&self, folder_id: &str, grant: &Grant) -> Result<()> {
        self.soap
            .invoke_raw(
                "FolderAction",
                Namespace::Mail,
                json!({
                    "action": {
                        "id": folder_id,
                        "op": "grant",
                        "grant": {
                            "d": grant.delegate,
                            "gt": grant.grantee_type,
                            "perm": grant.permission,
                        },
                    },
                }),
            )
            .await?;
        Ok(())
    }

    async fn delete_link(&self, link_id: &str) -> Result<()> {
        self.soap
            .invoke_raw(
                "FolderAction",
                Namespace::Mail,
                json!({ "action": { "id": link_id, "op": "delete" } }),
            )
            .await?;
        Ok(())
    }

    async fn create_mountpoint(&self, spec: &MountpointSpec) -> Result<()> {
        self.soap
            .invoke_raw(
                "CreateMountpoint",
                Namespace::Mail,
                json!({
                    "link": {
                        "name": spec.name,
                        "l": spec.parent_folder_id,
                        "owner": spec.owner,
                        "path": spec.remote_path,
                        "view": spec.view,
                        "reminder": false,
                    },
                }),
            )
            .await?;
        Ok(())
    }
}
