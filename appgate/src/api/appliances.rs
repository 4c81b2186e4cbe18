//! Appliances, their seed export and deactivation

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tfplug::Context;

use super::client::Client;
use super::collection::Collection;
use super::common::AppgateApiResource;
use super::error::ApiError;
use super::shape::{FieldGate, WireShape};
use super::version::ApiRevision::{V17, V18, V19};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appliance {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub hostname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    #[serde(default, skip_serializing)]
    pub site_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_to_peers_using_client_port_with_spa: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hostname_aliases: Vec<String>,
    #[serde(default, skip_serializing)]
    pub activated: bool,
    /// Nested configuration blocks (clientInterface, networking, portal, ...)
    /// and peer-managed fields, kept as received
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AppgateApiResource for Appliance {
    fn api_path() -> &'static str {
        "/appliances"
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

pub static APPLIANCE_SHAPE: WireShape = WireShape {
    gates: &[
        FieldGate::since("hostnameAliases", "hostname_aliases", V17),
        FieldGate::since(
            "clientInterface.overrideSpaMode",
            "client_interface.override_spa_mode",
            V17,
        ),
        FieldGate::since("prometheusExporter.useHttps", "prometheus_exporter.use_https", V18),
        FieldGate::since("prometheusExporter.httpsP12", "prometheus_exporter.https_p12", V18),
        FieldGate::since("prometheusExporter.basicAuth", "prometheus_exporter.basic_auth", V18),
        FieldGate::since(
            "prometheusExporter.allowedUsers",
            "prometheus_exporter.allowed_users",
            V18,
        ),
        FieldGate::since(
            "prometheusExporter.labelsDisabled",
            "prometheus_exporter.labels_disabled",
            V18,
        ),
        FieldGate::since("logForwarder.azureMonitors", "log_forwarder.azure_monitors", V18),
        FieldGate::since(
            "logForwarder.falconLogScales",
            "log_forwarder.falcon_log_scales",
            V18,
        ),
        FieldGate::since("logForwarder.datadogs", "log_forwarder.datadogs", V19),
        FieldGate::since("logForwarder.coralogixs", "log_forwarder.coralogixs", V19),
        FieldGate::since("metricsAggregator", "metrics_aggregator", V18),
        FieldGate::since("portal.externalProfiles", "portal.external_profiles", V18),
        FieldGate::since(
            "portal.signInCustomization.autoRedirect",
            "portal.sign_in_customization.auto_redirect",
            V18,
        ),
    ],
};

/// Body of `POST /appliances/{id}/export`
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedRequest {
    #[serde(rename = "provideCloudSSHKey")]
    pub provide_cloud_ssh_key: bool,
    #[serde(rename = "sshPassword", skip_serializing_if = "Option::is_none")]
    pub ssh_password: Option<String>,
    pub allow_customization: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validity_days: Option<i64>,
}

/// Appliance operations beyond plain CRUD
pub struct AppliancesApi<'a> {
    client: &'a Client,
}

impl<'a> AppliancesApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub fn collection(&self) -> Collection<'a, Appliance> {
        Collection::new(self.client, &APPLIANCE_SHAPE)
    }

    /// Seed JSON for an inactive appliance
    pub async fn export_seed(
        &self,
        ctx: &Context,
        id: &str,
        request: &SeedRequest,
    ) -> Result<Value, ApiError> {
        tracing::debug!("Exporting seed for appliance {}", id);
        let path = format!("{}/export", Appliance::resource_path(id));
        self.client.post(ctx, &path, request).await
    }

    /// Deactivates an appliance and wipes its configuration. An appliance
    /// that is not activated counts as success.
    pub async fn deactivate(&self, ctx: &Context, id: &str) -> Result<(), ApiError> {
        let path = format!("{}/deactivate?wipe=true", Appliance::resource_path(id));
        match self.client.post_empty(ctx, &path).await {
            Ok(()) => Ok(()),
            Err(e) if is_not_activated(&e) => {
                tracing::warn!("Appliance {} was not activated, nothing to deactivate", id);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

fn is_not_activated(error: &ApiError) -> bool {
    let message = match error {
        ApiError::Validation { envelope, .. } => envelope.to_string(),
        ApiError::Conflict(envelope) => envelope.to_string(),
        ApiError::Api { message, .. } => message.clone(),
        _ => return false,
    };
    message.to_lowercase().contains("not activated")
}

impl Client {
    pub fn appliances(&self) -> AppliancesApi<'_> {
        AppliancesApi::new(self)
    }
}
