use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::client::Client;
use super::collection::Collection;
use super::common::AppgateApiResource;
use super::shape::{FieldGate, WireShape};
use super::version::ApiRevision::V18;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entitlement {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub site: String,
    #[serde(default, skip_serializing)]
    pub site_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_logic: Option<String>,
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(default)]
    pub actions: Vec<EntitlementAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_sensitivity: Option<String>,
    /// appShortcuts and peer-managed fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitlementAction {
    pub subtype: String,
    pub action: String,
    #[serde(default)]
    pub hosts: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<String>,
}

impl AppgateApiResource for Entitlement {
    fn api_path() -> &'static str {
        "/entitlements"
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

pub static ENTITLEMENT_SHAPE: WireShape = WireShape {
    gates: &[FieldGate::since(
        "riskSensitivity",
        "risk_sensitivity",
        V18,
    )],
};

impl Client {
    pub fn entitlements(&self) -> Collection<'_, Entitlement> {
        Collection::new(self, &ENTITLEMENT_SHAPE)
    }
}
