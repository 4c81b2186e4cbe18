//! Version facts about the collective the provider is connected to

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceMetadataRequest,
    DataSourceMetadataResponse, DataSourceSchemaRequest, DataSourceSchemaResponse,
    DataSourceWithConfigure, ReadDataSourceRequest, ReadDataSourceResponse,
    ValidateDataSourceConfigRequest, ValidateDataSourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::DynamicValue;

use super::provider_data_from;
use crate::api::ApiRevision;
use crate::provider_data::AppgateProviderData;
use crate::resources::state::StateBuilder;

#[derive(Default)]
pub struct CollectiveDataSource {
    provider_data: Option<AppgateProviderData>,
}

impl CollectiveDataSource {
    pub fn new() -> Self {
        Self::default()
    }
}

fn schema() -> Schema {
    let computed = |name: &str, kind: AttributeType, description: &str| {
        AttributeBuilder::new(name, kind)
            .description(description)
            .computed()
            .build()
    };

    SchemaBuilder::new()
        .version(0)
        .description("Peer version and API revision of the connected collective")
        .attribute(computed("id", AttributeType::String, "Admin API URL"))
        .attribute(computed(
            "peer_version",
            AttributeType::String,
            "Appgate SDP version of the controller, e.g. 6.2.1",
        ))
        .attribute(computed(
            "api_version",
            AttributeType::Number,
            "API revision in use",
        ))
        .attribute(computed(
            "min_api_version",
            AttributeType::Number,
            "Oldest API revision the provider speaks",
        ))
        .attribute(computed(
            "max_api_version",
            AttributeType::Number,
            "Newest API revision the provider speaks",
        ))
        .build()
}

#[async_trait]
impl DataSource for CollectiveDataSource {
    fn type_name(&self) -> &str {
        "appgate_collective"
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
        _request: ValidateDataSourceConfigRequest,
    ) -> ValidateDataSourceConfigResponse {
        ValidateDataSourceConfigResponse {
            diagnostics: vec![],
        }
    }

    async fn read(&self, _ctx: Context, _request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let Some(data) = &self.provider_data else {
            return ReadDataSourceResponse {
                state: DynamicValue::null(),
                diagnostics: vec![crate::resources::diagnostics::not_configured()],
                deferred: None,
            };
        };
        let client = &data.client;

        let state = StateBuilder::new()
            .string("id", client.base_url())
            .string("peer_version", client.peer_version().to_string())
            .int("api_version", client.revision().number().into())
            .int("min_api_version", ApiRevision::MIN.number().into())
            .int("max_api_version", ApiRevision::MAX.number().into())
            .build();

        ReadDataSourceResponse {
            state,
            diagnostics: vec![],
            deferred: None,
        }
    }
}

#[async_trait]
impl DataSourceWithConfigure for CollectiveDataSource {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_sources::test_helpers::{configured_at, read};
    use crate::resources::state::Attrs;
    use mockito::Server;
    use tfplug::testing::{Version, VersionConstraint};

    #[tokio::test]
    async fn reports_the_negotiated_revision() {
        let mut server = Server::new_async().await;
        let source = configured_at(
            CollectiveDataSource::new(),
            &mut server,
            ApiRevision::V17,
            Some("6.1.4-29983-release"),
        )
        .await;

        let response = read(&source, DynamicValue::null()).await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        let state = Attrs::of(&response.state);
        assert_eq!(state.string("peer_version").as_deref(), Some("6.1.4"));
        assert_eq!(state.int("api_version"), Some(17));
        assert_eq!(state.int("min_api_version"), Some(15));
        assert_eq!(state.int("max_api_version"), Some(20));

        let peer = Version::parse(&state.string("peer_version").unwrap()).unwrap();
        assert!(VersionConstraint::parse(">= 6.1, < 6.2").unwrap().matches(&peer));
    }

    #[tokio::test]
    async fn unconfigured_read_fails() {
        let source = CollectiveDataSource::new();
        let response = read(&source, DynamicValue::null()).await;
        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(response.diagnostics[0].summary, "Provider not configured");
    }
}
