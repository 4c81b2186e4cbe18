//! Shared fixtures for the provider integration tests

#![allow(dead_code)]

use appgate::AppgateProvider;
use mockito::{Mock, ServerGuard};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tfplug::context::Context;
use tfplug::provider::{ConfigureProviderRequest, Provider};
use tfplug::resource::{
    ConfigureResourceRequest, CreateResourceRequest, CreateResourceResponse,
    DeleteResourceRequest, DeleteResourceResponse, ReadResourceRequest, ReadResourceResponse,
    UpdateResourceRequest, UpdateResourceResponse,
};
use tfplug::types::{ClientCapabilities, Dynamic, DynamicValue};
use tfplug::{Resource, ResourceWithConfigure};

pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

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

/// Login that reports `version` as the peer release
pub async fn mock_login(server: &mut ServerGuard, version: &str) -> Mock {
    server
        .mock("POST", "/admin/login")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(
            r#"{{"token":"integration-token","expires":"2099-01-01T00:00:00Z","user":{{"name":"admin"}},"version":"{}"}}"#,
            version
        ))
        .create_async()
        .await
}

/// Configures a provider against `server` and returns it with its provider data
pub async fn configured_provider(
    server: &mut ServerGuard,
    version: &str,
) -> (AppgateProvider, Arc<dyn Any + Send + Sync>) {
    init_logging();
    mock_login(server, version).await;

    let mut provider = AppgateProvider::new();
    let config = value(vec![
        ("url", Dynamic::String(format!("{}/admin", server.url()))),
        ("username", Dynamic::from("admin")),
        ("password", Dynamic::from("admin")),
        ("provider", Dynamic::from("local")),
        ("device_id", Dynamic::from("0f8e6f36-0000-4000-8000-000000000001")),
    ]);
    let response = provider
        .configure(
            Context::new(),
            ConfigureProviderRequest {
                terraform_version: "1.9.0".to_string(),
                config,
                client_capabilities: ClientCapabilities::default(),
            },
        )
        .await;
    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    let data = response.provider_data.expect("provider data");
    (provider, data)
}

/// Builds the resource the provider registers under `type_name` and hands it
/// the provider data, the way the host does
pub async fn resource(
    provider: &AppgateProvider,
    data: &Arc<dyn Any + Send + Sync>,
    type_name: &str,
) -> Box<dyn ResourceWithConfigure> {
    let factories = provider.resources();
    let factory = factories
        .get(type_name)
        .unwrap_or_else(|| panic!("{} is not registered", type_name));
    let mut resource = factory();
    let response = resource
        .configure(
            Context::new(),
            ConfigureResourceRequest {
                provider_data: Some(data.clone()),
            },
        )
        .await;
    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    resource
}

pub async fn create<R: Resource + ?Sized>(resource: &R, planned: DynamicValue) -> CreateResourceResponse {
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

pub async fn read<R: Resource + ?Sized>(resource: &R, current: DynamicValue) -> ReadResourceResponse {
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

pub async fn update<R: Resource + ?Sized>(
    resource: &R,
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

pub async fn delete<R: Resource + ?Sized>(resource: &R, prior: DynamicValue) -> DeleteResourceResponse {
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
