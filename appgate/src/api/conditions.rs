use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::client::Client;
use super::collection::Collection;
use super::common::AppgateApiResource;
use super::shape::{FieldGate, WireShape};
use super::version::ApiRevision::V17;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub expression: String,
    #[serde(default)]
    pub repeat_schedules: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remedy_logic: Option<String>,
    #[serde(default)]
    pub remedy_methods: Vec<RemedyMethod>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemedyMethod {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_suffix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
}

impl AppgateApiResource for Condition {
    fn api_path() -> &'static str {
        "/conditions"
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

pub static CONDITION_SHAPE: WireShape = WireShape {
    gates: &[FieldGate::since("remedyLogic", "remedy_logic", V17)],
};

impl Client {
    pub fn conditions(&self) -> Collection<'_, Condition> {
        Collection::new(self, &CONDITION_SHAPE)
    }
}
