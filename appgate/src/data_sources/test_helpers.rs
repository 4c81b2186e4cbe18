use mockito::ServerGuard;
use std::any::Any;
use std::sync::Arc;
use tfplug::data_source::{ConfigureDataSourceRequest, ReadDataSourceRequest, ReadDataSourceResponse};
use tfplug::types::{ClientCapabilities, DynamicValue};
use tfplug::{Context, DataSource, DataSourceWithConfigure};

use crate::api::test_helpers::{connect, mock_login};
use crate::api::ApiRevision;
use crate::provider_data::AppgateProviderData;

pub async fn configured_at<D: DataSourceWithConfigure>(
    mut source: D,
    server: &mut ServerGuard,
    revision: ApiRevision,
    version: Option<&str>,
) -> D {
    mock_login(server, revision, version).await;
    let client = connect(server, revision).await.unwrap();
    let data: Arc<dyn Any + Send + Sync> = Arc::new(AppgateProviderData::new(client));

    let response = source
        .configure(
            Context::new(),
            ConfigureDataSourceRequest {
                provider_data: Some(data),
            },
        )
        .await;
    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    source
}

pub async fn configured<D: DataSourceWithConfigure>(
    source: D,
    server: &mut ServerGuard,
    revision: ApiRevision,
) -> D {
    configured_at(source, server, revision, None).await
}

pub async fn read<D: DataSource>(source: &D, config: DynamicValue) -> ReadDataSourceResponse {
    source
        .read(
            Context::new(),
            ReadDataSourceRequest {
                type_name: source.type_name().to_string(),
                config,
                provider_meta: None,
                client_capabilities: ClientCapabilities::default(),
            },
        )
        .await
}
