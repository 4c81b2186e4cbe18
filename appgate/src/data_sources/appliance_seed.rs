//! Seed export for an appliance that has not joined the collective yet

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceMetadataRequest,
    DataSourceMetadataResponse, DataSourceSchemaRequest, DataSourceSchemaResponse,
    DataSourceWithConfigure, ReadDataSourceRequest, ReadDataSourceResponse,
    ValidateDataSourceConfigRequest, ValidateDataSourceConfigResponse,
};
use tfplug::defaults::StaticDefault;
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{Diagnostic, DynamicValue};
use tfplug::validators::IntBetween;

use super::provider_data_from;
use crate::api::appliances::SeedRequest;
use crate::provider_data::AppgateProviderData;
use crate::resources::state::{Attrs, StateBuilder};

#[derive(Default)]
pub struct ApplianceSeedDataSource {
    provider_data: Option<AppgateProviderData>,
}

impl ApplianceSeedDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn failure(diagnostic: Diagnostic) -> ReadDataSourceResponse {
        ReadDataSourceResponse {
            state: DynamicValue::null(),
            diagnostics: vec![diagnostic],
            deferred: None,
        }
    }
}

fn schema() -> Schema {
    SchemaBuilder::new()
        .version(0)
        .description("Exports the seed an inactive appliance boots with")
        .attribute(
            AttributeBuilder::new("appliance_id", AttributeType::String)
                .description("ID of the inactive appliance")
                .required()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("password", AttributeType::String)
                .description("Password of the cz user on the appliance")
                .optional()
                .sensitive()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("provide_cloud_ssh_key", AttributeType::Bool)
                .description("Use the SSH key of the cloud instance instead of a password")
                .optional()
                .default(StaticDefault::bool(false))
                .build(),
        )
        .attribute(
            AttributeBuilder::new("allow_customization", AttributeType::Bool)
                .description("Let the seed apply an appliance customization")
                .optional()
                .default(StaticDefault::bool(false))
                .build(),
        )
        .attribute(
            AttributeBuilder::new("validity_days", AttributeType::Number)
                .description("Days the seed can be used")
                .optional()
                .validator(IntBetween::create(1, 3650))
                .build(),
        )
        .attribute(
            AttributeBuilder::new("id", AttributeType::String)
                .computed()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("seed_file", AttributeType::String)
                .description("Seed JSON, base64")
                .computed()
                .sensitive()
                .build(),
        )
        .build()
}

#[async_trait]
impl DataSource for ApplianceSeedDataSource {
    fn type_name(&self) -> &str {
        "appgate_appliance_seed"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: DataSourceMetadataRequest,
    ) -> DataSourceMetadataResponse {
        DataSourceMetadataResponse {
            type_name: self.type_name().to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        DataSourceSchemaResponse {
            schema: schema(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateDataSourceConfigRequest,
    ) -> ValidateDataSourceConfigResponse {
        ValidateDataSourceConfigResponse {
            diagnostics: schema().validate_config(&request.config),
        }
    }

    async fn read(&self, ctx: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let Some(data) = &self.provider_data else {
            return Self::failure(crate::resources::diagnostics::not_configured());
        };

        let mut config = request.config.clone();
        schema().apply_defaults(&mut config);
        let config = Attrs::of(&config);

        let Some(appliance_id) = config.non_empty_string("appliance_id") else {
            return Self::failure(Diagnostic::error(
                "Missing appliance_id",
                "appliance_id names the appliance whose seed is exported",
            ));
        };
        let seed_request = SeedRequest {
            provide_cloud_ssh_key: config.bool("provide_cloud_ssh_key").unwrap_or(false),
            ssh_password: config.non_empty_string("password"),
            allow_customization: config.bool("allow_customization").unwrap_or(false),
            validity_days: config.int("validity_days"),
        };
        if seed_request.ssh_password.is_none() && !seed_request.provide_cloud_ssh_key {
            return Self::failure(Diagnostic::error(
                "Missing appliance credentials",
                "Set password or provide_cloud_ssh_key",
            ));
        }

        let seed = match data
            .client
            .appliances()
            .export_seed(&ctx, &appliance_id, &seed_request)
            .await
        {
            Ok(seed) => seed,
            Err(e) => {
                return Self::failure(Diagnostic::error(
                    "Failed to export appliance seed",
                    e.to_string(),
                ))
            }
        };
        let raw = match serde_json::to_vec(&seed) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!("Seed of appliance {} is not serializable: {}", appliance_id, e);
                return Self::failure(Diagnostic::error(
                    "Failed to export appliance seed",
                    e.to_string(),
                ));
            }
        };

        let state = StateBuilder::new()
            .string("id", &appliance_id)
            .string("appliance_id", appliance_id)
            .opt_string("password", config.string("password"))
            .bool("provide_cloud_ssh_key", seed_request.provide_cloud_ssh_key)
            .bool("allow_customization", seed_request.allow_customization)
            .opt_int("validity_days", seed_request.validity_days)
            .string("seed_file", STANDARD.encode(raw))
            .build();

        ReadDataSourceResponse {
            state,
            diagnostics: vec![],
            deferred: None,
        }
    }
}

#[async_trait]
impl DataSourceWithConfigure for ApplianceSeedDataSource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureDataSourceRequest,
    ) -> ConfigureDataSourceResponse {
        let mut diagnostics = vec![];
        match provider_data_from(request.provider_data) {
            Ok(data) => self.provider_data = Some(data),
            Err(diag) => diagnostics.push(diag),
        }
        ConfigureDataSourceResponse { diagnostics }
    }
}
