use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tfplug::Context;

use super::client::Client;
use super::collection::Collection;
use super::common::AppgateApiResource;
use super::error::ApiError;
use super::shape::WireShape;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientProfile {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub spa_key_name: String,
    #[serde(default)]
    pub identity_provider_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ProfileUrl {
    url: String,
}

impl AppgateApiResource for ClientProfile {
    fn api_path() -> &'static str {
        "/client-profiles"
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

/// Client profile operations beyond plain CRUD
pub struct ClientProfilesApi<'a> {
    client: &'a Client,
}

impl<'a> ClientProfilesApi<'a> {
    pub fn collection(&self) -> Collection<'a, ClientProfile> {
        Collection::new(self.client, &WireShape::EMPTY)
    }

    /// `appgate://<hostname>/<opaque>` link that enrolls a client
    pub async fn url(&self, ctx: &Context, id: &str) -> Result<String, ApiError> {
        let path = format!("{}/url", ClientProfile::resource_path(id));
        let response: ProfileUrl = self.client.get(ctx, &path).await?;
        Ok(response.url)
    }
}

impl Client {
    pub fn client_profiles(&self) -> ClientProfilesApi<'_> {
        ClientProfilesApi { client: self }
    }
}
