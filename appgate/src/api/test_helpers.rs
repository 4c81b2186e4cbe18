//! Test helpers for the Appgate SDP API

use mockito::{Mock, ServerGuard};
use secrecy::SecretString;
use std::time::Duration;

use super::client::{Client, ClientConfig};
use super::error::ApiError;
use super::session::Credentials;
use super::version::ApiRevision;

pub fn login_body(version: Option<&str>) -> String {
    match version {
        Some(v) => format!(
            r#"{{"token":"test-token","expires":"2099-01-01T00:00:00Z","user":{{"name":"admin"}},"version":"{}"}}"#,
            v
        ),
        None => r#"{"token":"test-token","expires":"2099-01-01T00:00:00Z","user":{"name":"admin"}}"#
            .to_string(),
    }
}

/// Accepts any login made at `revision`
pub async fn mock_login(server: &mut ServerGuard, revision: ApiRevision, version: Option<&str>) -> Mock {
    server
        .mock("POST", "/admin/login")
        .match_header("accept", revision.media_type().as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(login_body(version))
        .create_async()
        .await
}

pub fn test_config(server: &ServerGuard, preferred: ApiRevision) -> ClientConfig {
    ClientConfig {
        url: format!("{}/admin", server.url()),
        credentials: Credentials {
            username: "admin".to_string(),
            password: SecretString::from("admin".to_string()),
            provider_name: "local".to_string(),
            device_id: "1a2b3c4d-0000-4000-8000-000000000000".to_string(),
        },
        insecure: true,
        timeout: Duration::from_secs(5),
        preferred_revision: preferred,
    }
}

pub async fn connect(server: &ServerGuard, preferred: ApiRevision) -> Result<Client, ApiError> {
    Client::connect(test_config(server, preferred)).await
}
