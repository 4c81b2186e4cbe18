//! Test helpers for resources

use mockito::ServerGuard;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tfplug::resource::{
    ConfigureResourceRequest, CreateResourceRequest, CreateResourceResponse,
    DeleteResourceRequest, DeleteResourceResponse, ReadResourceRequest, ReadResourceResponse,
    UpdateResourceRequest, UpdateResourceResponse,
};
use tfplug::types::{ClientCapabilities, Dynamic, DynamicValue};
use tfplug::{Context, Resource, ResourceWithConfigure};

use super::engine::{ManagedResource, Reconciler};
use crate::api::test_helpers::{connect, mock_login};
use crate::api::ApiRevision;
use crate::provider_data::AppgateProviderData;

pub fn object(pairs: Vec<(&str, Dynamic)>) -> Dynamic {
    Dynamic::Map(
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect::<HashMap<_, _>>(),
    )
}

pub fn value(pairs: Vec<(&str, Dynamic)>) -> DynamicValue {
    DynamicValue::new(object(pairs))
}

pub fn strings(items: &[&str]) -> Dynamic {
    Dynamic::List(items.iter().map(|s| Dynamic::from(*s)).collect())
}

pub fn blocks(items: Vec<Dynamic>) -> Dynamic {
    Dynamic::List(items)
}

/// Logs in against `server` at `revision` and hands the session to `resource`
pub async fn configured<R: Reconciler>(
    mut resource: ManagedResource<R>,
    server: &mut ServerGuard,
    revision: ApiRevision,
    version: Option<&str>,
) -> ManagedResource<R> {
    mock_login(server, revision, version).await;
    let client = connect(server, revision).await.unwrap();
    let data: Arc<dyn Any + Send + Sync> = Arc::new(AppgateProviderData::new(client));

    let response = resource
        .configure(
            Context::new(),
            ConfigureResourceRequest {
                provider_data: Some(data),
            },
        )
        .await;
    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    resource
}

pub async fn create<R: Reconciler>(
    resource: &ManagedResource<R>,
    planned: DynamicValue,
) -> CreateResourceResponse {
    resource
        .create(
            Context::new(),
            CreateResourceRequest {
                type_name: resource.type_name().to_string(),
                config: planned.clone(),
                planned_state: planned,
                provider_meta: None,
            },
        )
        .await
}

pub async fn read<R: Reconciler>(
    resource: &ManagedResource<R>,
    current: DynamicValue,
) -> ReadResourceResponse {
    resource
        .read(
            Context::new(),
            ReadResourceRequest {
                type_name: resource.type_name().to_string(),
                current_state: current,
                provider_meta: None,
                client_capabilities: ClientCapabilities::default(),
            },
        )
        .await
}

pub async fn update<R: Reconciler>(
    resource: &ManagedResource<R>,
    prior: DynamicValue,
    planned: DynamicValue,
) -> UpdateResourceResponse {
    resource
        .update(
            Context::new(),
            UpdateResourceRequest {
                type_name: resource.type_name().to_string(),
                prior_state: prior,
                config: planned.clone(),
                planned_state: planned,
                provider_meta: None,
            },
        )
        .await
}

pub async fn delete<R: Reconciler>(
    resource: &ManagedResource<R>,
    prior: DynamicValue,
) -> DeleteResourceResponse {
    resource
        .delete(
            Context::new(),
            DeleteResourceRequest {
                type_name: resource.type_name().to_string(),
                prior_state: prior,
                provider_meta: None,
            },
        )
        .await
}
