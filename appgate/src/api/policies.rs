//! Policies of every type share one collection and one wire shape

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use super::client::Client;
use super::collection::Collection;
use super::common::AppgateApiResource;
use super::shape::{FieldGate, WireShape};
use super::version::ApiRevision::{self, V15, V17, V18};

/// Type discriminator stamped on every policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    #[default]
    Access,
    Device,
    Dhcp,
    Admin,
}

impl PolicyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyKind::Access => "access",
            PolicyKind::Device => "device",
            PolicyKind::Dhcp => "dhcp",
            PolicyKind::Admin => "admin",
        }
    }

    /// First revision that knows this policy type
    pub fn min_revision(&self) -> ApiRevision {
        match self {
            PolicyKind::Dhcp => V17,
            _ => V15,
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: PolicyKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub expression: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_site: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entitlements: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entitlement_links: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ringfence_rules: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ringfence_rule_links: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub administrative_roles: Vec<String>,
    /// Type-specific settings blocks and peer-managed fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AppgateApiResource for Policy {
    fn api_path() -> &'static str {
        "/policies"
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

pub static POLICY_SHAPE: WireShape = WireShape {
    gates: &[
        FieldGate::since("clientProfileSettings", "client_profile_settings", V18),
        FieldGate::since("dhcpSettings", "dhcp_settings", V17),
    ],
};

impl Client {
    pub fn policies(&self) -> Collection<'_, Policy> {
        Collection::new(self, &POLICY_SHAPE)
    }
}
