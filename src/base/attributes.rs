//! Selection of plain directory attributes to carry over to the target installation.

use serde::{Deserialize, Serialize};

use crate::base::model::AccountSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ImportOption {
    ZimbraId,
    FirstName,
    MiddleName,
    LastName,
    DisplayName,
    Status,
    Aliases,
    Description,
    Quota,
    Notes,
    Filter,
    Forwarding,
    HiddenForwarding,
    ZimbraAuthLdapExternalDn,
    SharedFolders,
    Company,
    Address,
}

impl ImportOption {
    /// Options that only make sense on accounts that already exist on the target.
    pub fn requires_existing_account(self) -> bool {
        matches!(self, ImportOption::SharedFolders | ImportOption::Aliases)
    }
}

/// Attribute values picked for one account. `None` means "leave untouched".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeUpdate {
    pub zimbra_id: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub display_name: Option<String>,
    pub status: Option<String>,
    pub description: Option<String>,
    pub quota: Option<String>,
    pub notes: Option<String>,
    pub incoming_filter: Option<String>,
    pub outgoing_filter: Option<String>,
    pub forwarding_addresses: Option<String>,
    pub hidden_forwarding_addresses: Option<Vec<String>>,
    pub zimbra_auth_ldap_external_dn: Option<String>,
    pub company: Option<String>,
    pub title: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub aliases: Option<Vec<String>>,
}

fn present(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

fn present_list(values: &[String]) -> Option<Vec<String>> {
    let values: Vec<String> = values.iter().filter(|v| !v.is_empty()).cloned().collect();
    (!values.is_empty()).then_some(values)
}

impl AttributeUpdate {
    pub fn select(account: &AccountSnapshot, options: &[ImportOption]) -> Self {
        let attrs = &account.attributes;
        let mut update = AttributeUpdate::default();
        for option in options {
            match option {
                ImportOption::ZimbraId => {
                    update.zimbra_id = (!account.id.is_empty()).then(|| account.id.clone());
                }
                ImportOption::FirstName => update.first_name = present(&attrs.first_name),
                ImportOption::MiddleName => update.middle_name = present(&attrs.middle_name),
                ImportOption::LastName => update.last_name = present(&attrs.last_name),
                ImportOption::DisplayName => update.display_name = present(&attrs.display_name),
                ImportOption::Status => update.status = present(&attrs.status),
                ImportOption::Description => update.description = present(&attrs.description),
                ImportOption::Quota => update.quota = present(&attrs.quota),
                ImportOption::Notes => update.notes = present(&attrs.notes),
                ImportOption::Filter => {
                    update.incoming_filter = present(&attrs.incoming_filter);
                    update.outgoing_filter = present(&attrs.outgoing_filter);
                }
                ImportOption::Forwarding => {
                    update.forwarding_addresses = present(&attrs.forwarding_addresses)
                }
                ImportOption::HiddenForwarding => {
                    update.hidden_forwarding_addresses =
                        present_list(&attrs.hidden_forwarding_addresses)
                }
                ImportOption::ZimbraAuthLdapExternalDn => {
                    update.zimbra_auth_ldap_external_dn =
                        present(&attrs.zimbra_auth_ldap_external_dn)
                }
                ImportOption::Company => {
                    update.company = present(&attrs.company);
                    update.title = present(&attrs.title);
                }
                ImportOption::Address => {
                    update.street = present(&attrs.street);
                    update.city = present(&attrs.city);
                    update.state = present(&attrs.state);
                    update.postal_code = present(&attrs.postal_code);
                    update.country = present(&attrs.country);
                }
                ImportOption::Aliases => update.aliases = present_list(&attrs.aliases),
                // Handled by the reconciliation runner.
                ImportOption::SharedFolders => {}
            }
        }
        update
    }

    /// Directory attribute name/value pairs for the present fields.
    /// Aliases are not attributes; they go through a separate call.
    pub fn to_ldap_pairs(&self) -> Vec<(&'static str, String)> {
        let single = [
            ("zimbraPrefMailForwardingAddress", &self.forwarding_addresses),
            ("givenName", &self.first_name),
            ("initials", &self.middle_name),
            ("sn", &self.last_name),
            ("zimbraNotes", &self.notes),
            ("zimbraMailQuota", &self.quota),
            ("description", &self.description),
            ("zimbraMailSieveScript", &self.incoming_filter),
            ("zimbraMailOutgoingSieveScript", &self.outgoing_filter),
            ("zimbraAuthLdapExternalDn", &self.zimbra_auth_ldap_external_dn),
            ("zimbraAccountStatus", &self.status),
            ("displayName", &self.display_name),
            ("zimbraId", &self.zimbra_id),
            ("company", &self.company),
            ("title", &self.title),
            ("street", &self.street),
            ("l", &self.city),
            ("st", &self.state),
            ("co", &self.country),
            ("postalCode", &self.postal_code),
        ];

        let mut pairs = Vec::new();
        for address in self.hidden_forwarding_addresses.iter().flatten() {
            pairs.push(("zimbraMailForwardingAddress", address.clone()));
        }
        for (name, value) in single {
            if let Some(value) = value {
                pairs.push((name, value.clone()));
            }
        }
        pairs
    }

    pub fn is_empty(&self) -> bool {
        self.to_ldap_pairs().is_empty() && self.aliases.is_none()
    }
}
