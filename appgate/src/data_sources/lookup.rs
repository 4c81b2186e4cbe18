//! Lookup data sources, one per collection
//!
//! Each finds exactly one object by `<kind>_id` or `<kind>_name` and exposes
//! its id, name, notes and tags.

use async_trait::async_trait;
use serde_json::Value;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceMetadataRequest,
    DataSourceMetadataResponse, DataSourceSchemaRequest, DataSourceSchemaResponse,
    DataSourceWithConfigure, ReadDataSourceRequest, ReadDataSourceResponse,
    ValidateDataSourceConfigRequest, ValidateDataSourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};

use super::provider_data_from;
use crate::api::{ApiError, ApiRevision, AppgateApiResource, Client, Collection};
use crate::provider_data::AppgateProviderData;
use crate::resources::state::{Attrs, StateBuilder};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupKind {
    Site,
    Appliance,
    Entitlement,
    Policy,
    Condition,
    RingfenceRule,
    CriteriaScript,
    IpPool,
    AdministrativeRole,
    MfaProvider,
    IdentityProvider,
    ClientProfile,
}

impl LookupKind {
    pub const ALL: [LookupKind; 12] = [
        LookupKind::Site,
        LookupKind::Appliance,
        LookupKind::Entitlement,
        LookupKind::Policy,
        LookupKind::Condition,
        LookupKind::RingfenceRule,
        LookupKind::CriteriaScript,
        LookupKind::IpPool,
        LookupKind::AdministrativeRole,
        LookupKind::MfaProvider,
        LookupKind::IdentityProvider,
        LookupKind::ClientProfile,
    ];

    /// Attribute prefix, e.g. `site` for `site_id` and `site_name`
    pub fn noun(self) -> &'static str {
        match self {
            LookupKind::Site => "site",
            LookupKind::Appliance => "appliance",
            LookupKind::Entitlement => "entitlement",
            LookupKind::Policy => "policy",
            LookupKind::Condition => "condition",
            LookupKind::RingfenceRule => "ringfence_rule",
            LookupKind::CriteriaScript => "criteria_script",
            LookupKind::IpPool => "ip_pool",
            LookupKind::AdministrativeRole => "administrative_role",
            LookupKind::MfaProvider => "mfa_provider",
            LookupKind::IdentityProvider => "identity_provider",
            LookupKind::ClientProfile => "client_profile",
        }
    }

    pub fn type_name(self) -> String {
        format!("appgate_{}", self.noun())
    }

    fn min_revision(self) -> ApiRevision {
        match self {
            LookupKind::ClientProfile => ApiRevision::V16,
            _ => ApiRevision::MIN,
        }
    }

    async fn fetch(self, ctx: &Context, client: &Client, key: &LookupKey) -> Result<Vec<Value>, ApiError> {
        match self {
            LookupKind::Site => find(client.sites(), ctx, key).await,
            LookupKind::Appliance => find(client.appliances().collection(), ctx, key).await,
            LookupKind::Entitlement => find(client.entitlements(), ctx, key).await,
            LookupKind::Policy => find(client.policies(), ctx, key).await,
            LookupKind::Condition => find(client.conditions(), ctx, key).await,
            LookupKind::RingfenceRule => find(client.ringfence_rules(), ctx, key).await,
            LookupKind::CriteriaScript => find(client.criteria_scripts(), ctx, key).await,
            LookupKind::IpPool => find(client.ip_pools(), ctx, key).await,
            LookupKind::AdministrativeRole => find(client.administrative_roles(), ctx, key).await,
            LookupKind::MfaProvider => find(client.mfa_providers(), ctx, key).await,
            LookupKind::IdentityProvider => find(client.identity_providers(), ctx, key).await,
            LookupKind::ClientProfile => {
                find(client.client_profiles().collection(), ctx, key).await
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum LookupKey {
    Id(String),
    Name(String),
}

impl LookupKey {
    fn describe(&self) -> String {
        match self {
            LookupKey::Id(id) => format!("id \"{}\"", id),
            LookupKey::Name(name) => format!("name \"{}\"", name),
        }
    }
}

async fn find<T: AppgateApiResource>(
    collection: Collection<'_, T>,
    ctx: &Context,
    key: &LookupKey,
) -> Result<Vec<Value>, ApiError> {
    let items = match key {
        LookupKey::Id(id) => match collection.get(ctx, id).await {
            Ok(item) => vec![item],
            Err(e) if e.is_not_found() => vec![],
            Err(e) => return Err(e),
        },
        LookupKey::Name(name) => collection.find_by_name(ctx, name).await?,
    };

    items
        .iter()
        .map(|item| serde_json::to_value(item).map_err(|e| ApiError::Parse(e.to_string())))
        .collect()
}

pub struct LookupDataSource {
    kind: LookupKind,
    type_name: String,
    provider_data: Option<AppgateProviderData>,
}

impl LookupDataSource {
    pub fn new(kind: LookupKind) -> Self {
        Self {
            kind,
            type_name: kind.type_name(),
            provider_data: None,
        }
    }

    fn id_attribute(&self) -> String {
        format!("{}_id", self.kind.noun())
    }

    fn name_attribute(&self) -> String {
        format!("{}_name", self.kind.noun())
    }

    fn schema(&self) -> Schema {
        let noun = self.kind.noun().replace('_', " ");
        SchemaBuilder::new()
            .version(0)
            .description(&format!("Looks up one {} by id or name", noun))
            .attribute(
                AttributeBuilder::new(&self.id_attribute(), AttributeType::String)
                    .description(&format!("ID of the {}", noun))
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(&self.name_attribute(), AttributeType::String)
                    .description(&format!("Name of the {}", noun))
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("notes", AttributeType::String)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("tags", AttributeType::set_of(AttributeType::String))
                    .computed()
                    .build(),
            )
            .build()
    }

    fn key(&self, config: &DynamicValue) -> Result<LookupKey, Diagnostic> {
        let config = Attrs::of(config);
        if let Some(id) = config.non_empty_string(&self.id_attribute()) {
            return Ok(LookupKey::Id(id));
        }
        if let Some(name) = config.non_empty_string(&self.name_attribute()) {
            return Ok(LookupKey::Name(name));
        }
        Err(Diagnostic::error(
            "Missing lookup key",
            format!(
                "One of {} or {} must be set",
                self.id_attribute(),
                self.name_attribute()
            ),
        ))
    }

    fn state(&self, item: &Value) -> DynamicValue {
        let text = |field: &str| item.get(field).and_then(Value::as_str).map(str::to_string);
        let id = text("id").unwrap_or_default();
        let name = text("name").unwrap_or_default();
        let tags = item
            .get("tags")
            .and_then(Value::as_array)
            .map(|tags| {
                tags.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        StateBuilder::new()
            .string(&self.id_attribute(), &id)
            .string(&self.name_attribute(), &name)
            .string("id", id)
            .string("name", name)
            .opt_string("notes", text("notes"))
            .set("tags", tags)
            .build()
    }

    fn failure(diagnostic: Diagnostic) -> ReadDataSourceResponse {
        ReadDataSourceResponse {
            state: DynamicValue::null(),
            diagnostics: vec![diagnostic],
            deferred: None,
        }
    }
}

#[async_trait]
impl DataSource for LookupDataSource {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: DataSourceMetadataRequest,
    ) -> DataSourceMetadataResponse {
        DataSourceMetadataResponse {
            type_name: self.type_name.clone(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        DataSourceSchemaResponse {
            schema: self.schema(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateDataSourceConfigRequest,
    ) -> ValidateDataSourceConfigResponse {
        let mut diagnostics = self.schema().validate_config(&request.config);
        let config = Attrs::of(&request.config);
        if config.is_set(&self.id_attribute()) && config.is_set(&self.name_attribute()) {
            diagnostics.push(
                Diagnostic::error(
                    "Conflicting lookup keys",
                    format!(
                        "Only one of {} or {} may be set",
                        self.id_attribute(),
                        self.name_attribute()
                    ),
                )
                .with_attribute(AttributePath::new(&self.name_attribute())),
            );
        }
        ValidateDataSourceConfigResponse { diagnostics }
    }

    async fn read(&self, ctx: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let Some(data) = &self.provider_data else {
            return Self::failure(crate::resources::diagnostics::not_configured());
        };
        let client = &data.client;

        let key = match self.key(&request.config) {
            Ok(key) => key,
            Err(diag) => return Self::failure(diag),
        };

        if let Err(e) = client.require(self.kind.min_revision(), &self.type_name) {
            return Self::failure(Diagnostic::error(
                "Unsupported Appgate SDP version",
                e.to_string(),
            ));
        }

        tracing::debug!("Looking up {} by {}", self.type_name, key.describe());
        let items = match self.kind.fetch(&ctx, client, &key).await {
            Ok(items) => items,
            Err(e) => {
                return Self::failure(Diagnostic::error(
                    format!("Failed to read {}", self.type_name),
                    e.to_string(),
                ))
            }
        };

        let noun = self.kind.noun().replace('_', " ");
        match items.as_slice() {
            [item] => ReadDataSourceResponse {
                state: self.state(item),
                diagnostics: vec![],
                deferred: None,
            },
            [] => Self::failure(Diagnostic::error(
                format!("No {} found", noun),
                format!("No {} matches {}", noun, key.describe()),
            )),
            many => Self::failure(Diagnostic::error(
                format!("Ambiguous {} lookup", noun),
                format!(
                    "{} objects of kind {} match {}; look it up by id instead",
                    many.len(),
                    noun,
                    key.describe()
                ),
            )),
        }
    }
}

#[async_trait]
impl DataSourceWithConfigure for LookupDataSource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureDataSourceRequest,
    ) -> ConfigureDataSourceResponse {
        match provider_data_from(request.provider_data) {
            Ok(data) => {
                self.provider_data = Some(data);
                ConfigureDataSourceResponse {
                    diagnostics: vec![],
                }
            }
            Err(diag) => ConfigureDataSourceResponse {
                diagnostics: vec![diag],
            },
        }
    }
}
