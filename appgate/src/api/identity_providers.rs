//! Identity providers of every type share one collection

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use super::client::Client;
use super::collection::Collection;
use super::common::AppgateApiResource;
use super::shape::{FieldGate, WireShape};
use super::version::ApiRevision::{self, V15, V16, V17, V18};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IdentityProviderKind {
    #[default]
    LocalDatabase,
    Ldap,
    LdapCertificate,
    Radius,
    Oidc,
    Connector,
}

impl IdentityProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityProviderKind::LocalDatabase => "LocalDatabase",
            IdentityProviderKind::Ldap => "Ldap",
            IdentityProviderKind::LdapCertificate => "LdapCertificate",
            IdentityProviderKind::Radius => "Radius",
            IdentityProviderKind::Oidc => "Oidc",
            IdentityProviderKind::Connector => "Connector",
        }
    }

    pub fn min_revision(&self) -> ApiRevision {
        match self {
            IdentityProviderKind::Oidc => V18,
            _ => V15,
        }
    }
}

impl fmt::Display for IdentityProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityProvider {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: IdentityProviderKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_provider: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_boarding_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inactivity_timeout_minutes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_pool_v4: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_pool_v6: Option<String>,
    #[serde(default)]
    pub dns_servers: Vec<String>,
    #[serde(default)]
    pub dns_search_domains: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_local_dns_requests: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_limit_per_user: Option<i64>,
    #[serde(default)]
    pub claim_mappings: Vec<ClaimMapping>,
    #[serde(default)]
    pub on_demand_claim_mappings: Vec<OnDemandClaimMapping>,

    // LDAP and LDAP certificate
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hostnames: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_distinguished_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_dn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username_attribute: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub membership_filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub membership_base_dn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_user_attribute: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ca_certificates: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_x509_external_checks: Option<bool>,

    // RADIUS
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication_protocol: Option<String>,

    // OIDC
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google: Option<bool>,

    // Local database
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_lockout_threshold: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_lockout_duration_minutes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_password_length: Option<i64>,

    /// onBoarding2FA, passwordWarning and peer-managed fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimMapping {
    pub attribute_name: String,
    pub claim_name: String,
    #[serde(default)]
    pub list: bool,
    #[serde(default)]
    pub encrypt: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnDemandClaimMapping {
    pub command: String,
    pub claim_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
    #[serde(default)]
    pub platform: String,
}

impl AppgateApiResource for IdentityProvider {
    fn api_path() -> &'static str {
        "/identity-providers"
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn name(&self) -> &str {
        &self.name
    }
}

pub static IDENTITY_PROVIDER_SHAPE: WireShape = WireShape {
    gates: &[
        FieldGate::since("deviceLimitPerUser", "device_limit_per_user", V17),
        FieldGate::until("objectClass", "object_class", V16),
        FieldGate::since("userFilter", "user_filter", V16),
    ],
};

impl Client {
    pub fn identity_providers(&self) -> Collection<'_, IdentityProvider> {
        Collection::new(self, &IDENTITY_PROVIDER_SHAPE)
    }
}
