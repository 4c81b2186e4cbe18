//! Criteria, entitlement, user claim and device scripts

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::Debug;
use std::marker::PhantomData;

use super::client::Client;
use super::collection::Collection;
use super::common::AppgateApiResource;
use super::shape::WireShape;

/// Selects the collection an expression script lives in
pub trait ScriptKind: Debug + Clone + Default + Send + Sync + 'static {
    const PATH: &'static str;
}

#[derive(Debug, Clone, Default)]
pub struct Criteria;

#[derive(Debug, Clone, Default)]
pub struct EntitlementScriptKind;

#[derive(Debug, Clone, Default)]
pub struct UserClaim;

impl ScriptKind for Criteria {
    const PATH: &'static str = "/criteria-scripts";
}

impl ScriptKind for EntitlementScriptKind {
    const PATH: &'static str = "/entitlement-scripts";
}

impl ScriptKind for UserClaim {
    const PATH: &'static str = "/user-claim-scripts";
}

/// A named JavaScript expression evaluated by the controller
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", bound = "")]
pub struct ExpressionScript<K: ScriptKind> {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub expression: String,
    /// Entitlement scripts only: host, portOrType or appShortcut
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub script_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    #[serde(skip)]
    _kind: PhantomData<K>,
}

impl<K: ScriptKind> AppgateApiResource for ExpressionScript<K> {
    fn api_path() -> &'static str {
        K::PATH
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

pub type CriteriaScript = ExpressionScript<Criteria>;
pub type EntitlementScript = ExpressionScript<EntitlementScriptKind>;
pub type UserClaimScript = ExpressionScript<UserClaim>;

/// A file distributed to clients for device claims
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceScript {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub filename: String,
    /// Base64 file content; write-only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing)]
    pub checksum: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AppgateApiResource for DeviceScript {
    fn api_path() -> &'static str {
        "/device-scripts"
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
    pub fn expression_scripts<K: ScriptKind>(&self) -> Collection<'_, ExpressionScript<K>> {
        Collection::new(self, &WireShape::EMPTY)
    }

    pub fn criteria_scripts(&self) -> Collection<'_, CriteriaScript> {
        self.expression_scripts()
    }

    pub fn entitlement_scripts(&self) -> Collection<'_, EntitlementScript> {
        self.expression_scripts()
    }

    pub fn user_claim_scripts(&self) -> Collection<'_, UserClaimScript> {
        self.expression_scripts()
    }

    pub fn device_scripts(&self) -> Collection<'_, DeviceScript> {
        Collection::new(self, &WireShape::EMPTY)
    }
}
