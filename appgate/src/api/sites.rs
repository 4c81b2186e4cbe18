use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::client::Client;
use super::collection::Collection;
use super::common::AppgateApiResource;
use super::shape::{FieldGate, WireShape};
use super::version::ApiRevision::{V17, V18};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub network_subnets: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entitlement_based_routing: Option<bool>,
    /// ipPoolMappings, defaultGateway, vpn, nameResolution and peer-managed fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AppgateApiResource for Site {
    fn api_path() -> &'static str {
        "/sites"
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

pub static SITE_SHAPE: WireShape = WireShape {
    gates: &[
        FieldGate::since(
            "vpn.ipAccessLogIntervalSeconds",
            "vpn.ip_access_log_interval_seconds",
            V17,
        ),
        FieldGate::since(
            "nameResolution.dnsForwarding",
            "name_resolution.dns_forwarding",
            V18,
        ),
    ],
};

impl Client {
    pub fn sites(&self) -> Collection<'_, Site> {
        Collection::new(self, &SITE_SHAPE)
    }
}
