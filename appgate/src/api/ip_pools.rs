use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::client::Client;
use super::collection::Collection;
use super::common::AppgateApiResource;
use super::shape::WireShape;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpPool {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub ip_version6: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lease_time_days: Option<i64>,
    #[serde(default)]
    pub ranges: Vec<IpRange>,
    /// Number of addresses; v6 pools exceed u64 so the peer may send a string
    #[serde(default, skip_serializing)]
    pub total: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IpRange {
    pub first: String,
    pub last: String,
}

impl IpPool {
    pub fn total_display(&self) -> Option<String> {
        match &self.total {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }
}

impl AppgateApiResource for IpPool {
    fn api_path() -> &'static str {
        "/ip-pools"
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
    pub fn ip_pools(&self) -> Collection<'_, IpPool> {
        Collection::new(self, &WireShape::EMPTY)
    }
}
