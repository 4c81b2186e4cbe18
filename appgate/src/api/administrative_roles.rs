use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::client::Client;
use super::collection::Collection;
use super::common::AppgateApiResource;
use super::shape::{FieldGate, WireShape};
use super::version::ApiRevision::V18;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdministrativeRole {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub privileges: Vec<Privilege>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Privilege {
    #[serde(rename = "type")]
    pub kind: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<PrivilegeScope>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub functions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivilegeScope {
    #[serde(default)]
    pub all: bool,
    #[serde(default)]
    pub ids: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl AppgateApiResource for AdministrativeRole {
    fn api_path() -> &'static str {
        "/administrative-roles"
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

pub static ADMINISTRATIVE_ROLE_SHAPE: WireShape = WireShape {
    gates: &[FieldGate::since(
        "privileges.functions",
        "privileges.functions",
        V18,
    )],
};

impl Client {
    pub fn administrative_roles(&self) -> Collection<'_, AdministrativeRole> {
        Collection::new(self, &ADMINISTRATIVE_ROLE_SHAPE)
    }
}
