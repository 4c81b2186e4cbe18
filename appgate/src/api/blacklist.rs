//! Blacklisted users are keyed by distinguished name

use serde::{Deserialize, Serialize};

use super::client::Client;
use super::collection::Collection;
use super::common::AppgateApiResource;
use super::shape::WireShape;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlacklistEntry {
    pub user_distinguished_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing)]
    pub blacklisted_at: Option<String>,
}

impl AppgateApiResource for BlacklistEntry {
    fn api_path() -> &'static str {
        "/blacklist"
    }

    fn id(&self) -> &str {
        &self.user_distinguished_name
    }

    fn set_id(&mut self, id: String) {
        self.user_distinguished_name = id;
    }

    fn name(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.user_distinguished_name)
    }
}

impl Client {
    pub fn blacklist(&self) -> Collection<'_, BlacklistEntry> {
        Collection::new(self, &WireShape::EMPTY)
    }
}
