//! Common types shared by every Appgate SDP collection

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// An object stored in one of the admin API collections
pub trait AppgateApiResource: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// Collection path relative to the admin base URL, e.g. `/sites`
    fn api_path() -> &'static str;

    fn resource_path(id: &str) -> String {
        format!("{}/{}", Self::api_path(), urlencoding::encode(id))
    }

    fn id(&self) -> &str;

    fn set_id(&mut self, id: String);

    fn name(&self) -> &str;
}

/// Envelope of every list endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub range: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
}

/// Filters accepted by list endpoints
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub query: Option<String>,
    pub order_by: Option<String>,
    pub descending: bool,
}

impl ListFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Free-text match on name, notes and tags
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(field.into());
        self
    }

    pub fn descending(mut self) -> Self {
        self.descending = true;
        self
    }

    pub fn to_query_params(&self) -> ApiQueryParams {
        let params = ApiQueryParams::new()
            .add_optional("query", self.query.as_deref())
            .add_optional("orderBy", self.order_by.as_deref());
        if self.descending {
            params.add("descending", true)
        } else {
            params
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ApiQueryParams {
    params: Vec<(String, String)>,
}

impl ApiQueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<K: Into<String>, V: ToString>(mut self, key: K, value: V) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    pub fn add_optional<K: Into<String>, V: ToString>(mut self, key: K, value: Option<V>) -> Self {
        if let Some(v) = value {
            self.params.push((key.into(), v.to_string()));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn to_query_string(&self) -> String {
        if self.params.is_empty() {
            String::new()
        } else {
            format!(
                "?{}",
                self.params
                    .iter()
                    .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
                    .collect::<Vec<_>>()
                    .join("&")
            )
        }
    }
}

/// Tags are a set on the host side; the peer keeps them as an array
pub fn sorted_tags(mut tags: Vec<String>) -> Vec<String> {
    tags.sort();
    tags.dedup();
    tags
}
