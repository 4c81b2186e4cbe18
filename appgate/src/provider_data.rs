//! Provider data structure passed to resources and data sources

use crate::api::Client;

/// Handed to every resource and data source through `configure`. Clones
/// share one session.
#[derive(Clone)]
pub struct AppgateProviderData {
    pub client: Client,
}

impl AppgateProviderData {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}
