//! Appgate SDP provider
//!
//! Reconciles declared collective configuration (appliances, sites, policies,
//! identity providers and the rest) against the admin API of an Appgate SDP
//! controller, speaking whichever API revision the controller supports.

pub mod api;
pub mod config;
pub mod data_sources;
pub mod provider_data;
pub mod resources;

use async_trait::async_trait;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tfplug::context::Context;
use tfplug::provider::{
    ConfigureProviderRequest, ConfigureProviderResponse, DataSourceFactory,
    ProviderMetaSchemaRequest, ProviderMetaSchemaResponse, ProviderMetadataRequest,
    ProviderMetadataResponse, ProviderSchemaRequest, ProviderSchemaResponse, ResourceFactory,
    StopProviderRequest, StopProviderResponse, ValidateProviderConfigRequest,
    ValidateProviderConfigResponse,
};
use tfplug::types::{Diagnostic, ServerCapabilities};
use tfplug::{DataSourceWithConfigure, Provider, ResourceWithConfigure};

use api::identity_providers::IdentityProviderKind;
use config::ProviderConfig;
use data_sources::{ApplianceSeedDataSource, CollectiveDataSource, LookupDataSource, LookupKind};
pub use provider_data::AppgateProviderData;
use resources::{ManagedResource, Reconciler};

const IDENTITY_PROVIDER_KINDS: [IdentityProviderKind; 6] = [
    IdentityProviderKind::LocalDatabase,
    IdentityProviderKind::Ldap,
    IdentityProviderKind::LdapCertificate,
    IdentityProviderKind::Radius,
    IdentityProviderKind::Oidc,
    IdentityProviderKind::Connector,
];

#[derive(Default)]
pub struct AppgateProvider {
    provider_data: Option<AppgateProviderData>,
}

impl AppgateProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn provider_data(&self) -> Option<&AppgateProviderData> {
        self.provider_data.as_ref()
    }
}

fn register<R, F>(factories: &mut HashMap<String, ResourceFactory>, build: F)
where
    R: Reconciler,
    F: Fn() -> ManagedResource<R> + Send + Sync + 'static,
{
    let type_name = build().reconciler().type_name().to_string();
    factories.insert(
        type_name,
        Box::new(move || Box::new(build()) as Box<dyn ResourceWithConfigure>),
    );
}

#[async_trait]
impl Provider for AppgateProvider {
    fn type_name(&self) -> &str {
        "appgate"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ProviderMetadataRequest,
    ) -> ProviderMetadataResponse {
        ProviderMetadataResponse {
            type_name: "appgate".to_string(),
            server_capabilities: ServerCapabilities {
                plan_destroy: false,
                get_provider_schema_optional: false,
                move_resource_state: false,
            },
        }
    }

    async fn schema(&self, _ctx: Context, _request: ProviderSchemaRequest) -> ProviderSchemaResponse {
        ProviderSchemaResponse {
            schema: ProviderConfig::schema(),
            diagnostics: vec![],
        }
    }

    async fn meta_schema(
        &self,
        _ctx: Context,
        _request: ProviderMetaSchemaRequest,
    ) -> ProviderMetaSchemaResponse {
        ProviderMetaSchemaResponse {
            schema: None,
            diagnostics: vec![],
        }
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        let config = match ProviderConfig::from_config(&request.config) {
            Ok(config) => config,
            Err(diagnostics) => {
                return ConfigureProviderResponse {
                    diagnostics,
                    provider_data: None,
                }
            }
        };

        let client = match api::Client::connect(config.client_config()).await {
            Ok(client) => client,
            Err(e) => {
                return ConfigureProviderResponse {
                    diagnostics: vec![Diagnostic::error(
                        "Failed to connect to Appgate SDP",
                        format!("{}: {}", config.url, e),
                    )],
                    provider_data: None,
                }
            }
        };
        let data = AppgateProviderData::new(client);
        self.provider_data = Some(data.clone());
        ConfigureProviderResponse {
            diagnostics: vec![],
            provider_data: Some(Arc::new(data) as Arc<dyn Any + Send + Sync>),
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateProviderConfigRequest,
    ) -> ValidateProviderConfigResponse {
        ValidateProviderConfigResponse {
            diagnostics: ProviderConfig::schema().validate_config(&request.config),
        }
    }

    async fn stop(&self, _ctx: Context, _request: StopProviderRequest) -> StopProviderResponse {
        StopProviderResponse { error: None }
    }

    fn resources(&self) -> HashMap<String, ResourceFactory> {
        let mut factories: HashMap<String, ResourceFactory> = HashMap::new();

        register(&mut factories, resources::appliance);
        register(&mut factories, resources::site);
        register(&mut factories, resources::ip_pool);
        register(&mut factories, resources::entitlement);
        register(&mut factories, resources::condition);
        register(&mut factories, resources::ringfence_rule);
        register(&mut factories, resources::administrative_role);
        register(&mut factories, resources::mfa_provider);
        register(&mut factories, resources::client_profile);
        register(&mut factories, resources::blacklist_user);

        register(&mut factories, resources::access_policy);
        register(&mut factories, resources::device_policy);
        register(&mut factories, resources::dhcp_policy);
        register(&mut factories, resources::admin_policy);

        register(&mut factories, resources::criteria_script);
        register(&mut factories, resources::entitlement_script);
        register(&mut factories, resources::user_claim_script);
        register(&mut factories, resources::device_script);

        for kind in IDENTITY_PROVIDER_KINDS {
            register(&mut factories, move || resources::identity_provider(kind));
        }

        factories
    }

    fn data_sources(&self) -> HashMap<String, DataSourceFactory> {
        let mut factories: HashMap<String, DataSourceFactory> = HashMap::new();

        factories.insert(
            "appgate_collective".to_string(),
            Box::new(|| Box::new(CollectiveDataSource::new()) as Box<dyn DataSourceWithConfigure>),
        );
        factories.insert(
            "appgate_appliance_seed".to_string(),
            Box::new(|| {
                Box::new(ApplianceSeedDataSource::new()) as Box<dyn DataSourceWithConfigure>
            }),
        );
        for kind in LookupKind::ALL {
            factories.insert(
                kind.type_name(),
                Box::new(move || {
                    Box::new(LookupDataSource::new(kind)) as Box<dyn DataSourceWithConfigure>
                }),
            );
        }

        factories
    }
}
