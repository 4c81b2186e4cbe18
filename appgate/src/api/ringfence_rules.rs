use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::client::Client;
use super::collection::Collection;
use super::common::AppgateApiResource;
use super::shape::WireShape;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RingfenceRule {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub actions: Vec<RingfenceAction>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RingfenceAction {
    pub protocol: String,
    pub direction: String,
    pub action: String,
    #[serde(default)]
    pub hosts: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<String>,
}

impl AppgateApiResource for RingfenceRule {
    fn api_path() -> &'static str {
        "/ringfence-rules"
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

impl Client {
    pub fn ringfence_rules(&self) -> Collection<'_, RingfenceRule> {
        Collection::new(self, &WireShape::EMPTY)
    }
}
