use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::client::Client;
use super::collection::Collection;
use super::common::AppgateApiResource;
use super::shape::{FieldGate, WireShape};
use super::version::ApiRevision::V17;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MfaProvider {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub hostnames: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication_protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_user_password: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge_shared_secret: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AppgateApiResource for MfaProvider {
    fn api_path() -> &'static str {
        "/mfa-providers"
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

pub static MFA_PROVIDER_SHAPE: WireShape = WireShape {
    gates: &[FieldGate::since(
        "challengeSharedSecret",
        "challenge_shared_secret",
        V17,
    )],
};

impl Client {
    pub fn mfa_providers(&self) -> Collection<'_, MfaProvider> {
        Collection::new(self, &MFA_PROVIDER_SHAPE)
    }
}
