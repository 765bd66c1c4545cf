use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::base::attributes::AttributeUpdate;
use crate::base::model::{AccountAttributes, AccountSnapshot, SessionToken};
use crate::ops::interface::{AccountDirectory, SessionProvider};
use crate::ops::soap::mail::MailClient;
use crate::ops::soap::{Namespace, SoapClient, content_of};
use crate::protocol_bail;
use crate::utils::error::Result;

#[derive(Debug, Deserialize)]
struct RawAttr {
    n: String,
    #[serde(rename = "_content", default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct RawAccount {
    id: String,
    name: String,
    #[serde(default)]
    a: Vec<RawAttr>,
}

#[derive(Debug, Deserialize)]
struct AccountsResponse {
    #[serde(default)]
    account: Vec<RawAccount>,
}

impl RawAccount {
    fn first(&self, attr: &str) -> Option<String> {
        self.a
            .iter()
            .find(|a| a.n == attr)
            .map(|a| a.content.clone())
            .filter(|v| !v.is_empty())
    }

    fn all(&self, attr: &str) -> Vec<String> {
        self.a
            .iter()
            .filter(|a| a.n == attr)
            .map(|a| a.content.clone())
            .collect()
    }

    fn is_system_resource(&self) -> bool {
        self.first("zimbraIsSystemResource").as_deref() == Some("TRUE")
    }

    fn into_snapshot(self) -> AccountSnapshot {
        let attributes = AccountAttributes {
            display_name: self.first("displayName"),
            first_name: self.first("givenName"),
            last_name: self.first("sn"),
            middle_name: self.first("initials"),
            description: self.first("description"),
            quota: self.first("zimbraMailQuota"),
            notes: self.first("zimbraNotes"),
            status: self.first("zimbraAccountStatus"),
            hidden_forwarding_addresses: self.all("zimbraMailForwardingAddress"),
            forwarding_addresses: self.first("zimbraPrefMailForwardingAddress"),
            incoming_filter: self.first("zimbraMailSieveScript"),
            outgoing_filter: self.first("zimbraMailOutgoingSieveScript"),
            zimbra_auth_ldap_external_dn: self.first("zimbraAuthLdapExternalDn"),
            aliases: self.all("zimbraMailAlias"),
            company: self.first("company"),
            title: self.first("title"),
            street: self.first("street"),
            city: self.first("l"),
            state: self.first("st"),
            postal_code: self.first("postalCode"),
            country: self.first("co"),
        };
        AccountSnapshot {
            id: self.id,
            name: self.name,
            attributes,
            folders: None,
            folder_links: None,
        }
    }
}

fn attrs_json(update: &AttributeUpdate) -> Value {
    Value::Array(
        update
            .to_ldap_pairs()
            .into_iter()
            .map(|(n, v)| json!({ "n": n, "_content": v }))
            .collect(),
    )
}

/// Administrative session against one installation.
#[derive(Debug, Clone)]
pub struct AdminClient {
    soap: SoapClient,
    mail_url: String,
}

impl AdminClient {
    /// Logs in as an administrator and returns a client bound to the admin token.
    pub async fn authenticate(
        http: reqwest::Client,
        admin_url: &str,
        mail_url: &str,
        username: &str,
        password: &str,
    ) -> Result<Self> {
        let anonymous = SoapClient::new(http.clone(), admin_url, None);
        let resp = anonymous
            .invoke_raw(
                "Auth",
                Namespace::Admin,
                json!({ "name": { "_content": username }, "password": { "_content": password } }),
            )
            .await?;
        let Some(token) = resp.get("authToken").and_then(content_of) else {
            protocol_bail!("AuthResponse carries no authToken");
        };
        Ok(Self::with_token(http, admin_url, mail_url, token))
    }

    pub fn with_token(http: reqwest::Client, admin_url: &str, mail_url: &str, token: &str) -> Self {
        Self {
            soap: SoapClient::new(http, admin_url, Some(token.to_string())),
            mail_url: mail_url.to_string(),
        }
    }

    pub async fn delegate_auth(&self, account: &str) -> Result<SessionToken> {
        let resp = self
            .soap
            .invoke_raw(
                "DelegateAuth",
                Namespace::Admin,
                json!({ "account": { "by": "name", "_content": account } }),
            )
            .await?;
        match resp.get("authToken").and_then(content_of) {
            Some(token) => Ok(SessionToken::new(token)),
            None => protocol_bail!("DelegateAuthResponse carries no authToken"),
        }
    }
}

#[async_trait]
impl AccountDirectory for AdminClient {
    /// Every non-system account with its exportable attributes.
    async fn get_all_accounts(&self) -> Result<Vec<AccountSnapshot>> {
        let resp: AccountsResponse = self
            .soap
            .invoke("GetAllAccounts", Namespace::Admin, json!({}))
            .await?;
        Ok(resp
            .account
            .into_iter()
            .filter(|a| !a.is_system_resource())
            .map(RawAccount::into_snapshot)
            .collect())
    }

    async fn get_account_by_name(&self, name: &str) -> Result<AccountSnapshot> {
        let resp: AccountsResponse = self
            .soap
            .invoke(
                "GetAccount",
                Namespace::Admin,
                json!({
                    "effectiveQuota": false,
                    "applyCos": true,
                    "account": { "by": "name", "_content": name },
                }),
            )
            .await?;
        match resp.account.into_iter().next() {
            Some(account) => Ok(account.into_snapshot()),
            None => protocol_bail!("GetAccountResponse carries no account for {name}"),
        }
    }

    async fn modify_account(&self, account_id: &str, update: &AttributeUpdate) -> Result<()> {
        self.soap
            .invoke_raw(
                "ModifyAccount",
                Namespace::Admin,
                json!({ "id": account_id, "a": attrs_json(update) }),
            )
            .await?;
        Ok(())
    }

    async fn create_account(&self, name: &str, update: &AttributeUpdate) -> Result<()> {
        self.soap
            .invoke_raw(
                "CreateAccount",
                Namespace::Admin,
                json!({ "name": name, "a": attrs_json(update) }),
            )
            .await?;
        Ok(())
    }

    async fn add_account_alias(&self, account_id: &str, alias: &str) -> Result<()> {
        self.soap
            .invoke_raw(
                "AddAccountAlias",
                Namespace::Admin,
                json!({ "id": account_id, "alias": alias }),
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl SessionProvider for AdminClient {
    type Client = MailClient;

    async fn delegate(&self, account_name: &str) -> Result<SessionToken> {
        self.delegate_auth(account_name).await
    }

    fn connect(&self, session: SessionToken) -> MailClient {
        MailClient::new(self.soap.http().clone(), &self.mail_url, session)
    }
}
