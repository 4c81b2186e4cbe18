//! Importing an appliance yields the state create wrote, minus write-only secrets

mod common;

use appgate::resources::appliance;
use common::{configured_provider, create, object, value};
use mockito::{Matcher, Server};
use serde_json::json;
use serial_test::serial;
use tfplug::context::Context;
use tfplug::resource::{ConfigureResourceRequest, ImportResourceStateRequest};
use tfplug::testing::import_state_verify;
use tfplug::types::{AttributePath, ClientCapabilities, Dynamic};
use tfplug::{ResourceWithConfigure, ResourceWithImportState};

const IGNORED: [&str; 3] = [
    "portal.proxy_p12s.content",
    "portal.https_p12.content",
    "seed_file",
];

fn stored_portal() -> String {
    json!({
        "id": "portal-1",
        "name": "portal-1",
        "tags": ["edge"],
        "hostname": "portal.example.com",
        "site": "site-1",
        "siteName": "Default Site",
        "activated": false,
        "clientInterface": {"hostname": "portal.example.com", "httpsPort": 443, "dtlsPort": 443},
        "portal": {
            "enabled": true,
            "httpsP12": {"id": "p12-https", "subjectName": "CN=portal.example.com"},
            "proxyP12s": [{"id": "p12-proxy", "subjectName": "CN=proxy.example.com"}]
        }
    })
    .to_string()
}

fn portal_config() -> tfplug::DynamicValue {
    value(vec![
        ("name", Dynamic::from("portal-1")),
        ("tags", Dynamic::List(vec![Dynamic::from("edge")])),
        ("hostname", Dynamic::from("portal.example.com")),
        ("site", Dynamic::from("site-1")),
        (
            "client_interface",
            object(vec![("hostname", Dynamic::from("portal.example.com"))]),
        ),
        (
            "portal",
            Dynamic::List(vec![object(vec![
                ("enabled", Dynamic::from(true)),
                (
                    "https_p12",
                    Dynamic::List(vec![object(vec![
                        ("id", Dynamic::from("p12-https")),
                        ("content", Dynamic::from("MIIKaQIBAzCCCi8GCSqGSIb3")),
                    ])]),
                ),
                (
                    "proxy_p12s",
                    Dynamic::List(vec![object(vec![
                        ("id", Dynamic::from("p12-proxy")),
                        ("content", Dynamic::from("MIIKbQIBAzCCCjMGCSqGSIb3")),
                    ])]),
                ),
            ])]),
        ),
    ])
}

#[tokio::test(flavor = "multi_thread")]
#[serial]
async fn imported_appliance_matches_created_state_except_secrets() {
    let mut server = Server::new_async().await;
    let (_provider, data) = configured_provider(&mut server, "6.2.1").await;
    let mut portal = appliance();
    let configured = portal
        .configure(
            Context::new(),
            ConfigureResourceRequest {
                provider_data: Some(data),
            },
        )
        .await;
    assert!(configured.diagnostics.is_empty());

    let _post = server
        .mock("POST", "/admin/appliances")
        .match_body(Matcher::PartialJson(json!({
            "portal": {
                "httpsP12": {"content": "MIIKaQIBAzCCCi8GCSqGSIb3"}
            }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(stored_portal())
        .create_async()
        .await;
    let _get = server
        .mock("GET", "/admin/appliances/portal-1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(stored_portal())
        .create_async()
        .await;
    let export = server
        .mock("POST", "/admin/appliances/portal-1/export")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"seed":"portal-1"}"#)
        .expect(2)
        .create_async()
        .await;

    let created = create(&portal, portal_config()).await;
    assert!(created.diagnostics.is_empty(), "{:?}", created.diagnostics);
    assert_eq!(
        created
            .new_state
            .get_string(&AttributePath::new("portal").index(0).attribute("https_p12").index(0).attribute("content"))
            .unwrap(),
        "MIIKaQIBAzCCCi8GCSqGSIb3"
    );

    let imported = portal
        .import_state(
            Context::new(),
            ImportResourceStateRequest {
                type_name: "appgate_appliance".to_string(),
                id: "portal-1".to_string(),
                client_capabilities: ClientCapabilities::default(),
            },
        )
        .await;
    assert!(imported.diagnostics.is_empty(), "{:?}", imported.diagnostics);
    assert_eq!(imported.imported_resources.len(), 1);
    let imported = &imported.imported_resources[0].state;
    export.assert_async().await;

    import_state_verify(&created.new_state, imported, &IGNORED).unwrap();

    let differences = import_state_verify(&created.new_state, imported, &[]).unwrap_err();
    assert_eq!(differences.len(), 2, "{:?}", differences);
    assert!(differences
        .iter()
        .all(|d| d.starts_with("portal.0.") && d.contains(".content: created=MIIK")));
}

#[tokio::test(flavor = "multi_thread")]
#[serial]
async fn importing_a_missing_appliance_fails() {
    let mut server = Server::new_async().await;
    let (_provider, data) = configured_provider(&mut server, "6.2.1").await;
    let mut portal = appliance();
    portal
        .configure(
            Context::new(),
            ConfigureResourceRequest {
                provider_data: Some(data),
            },
        )
        .await;

    let _get = server
        .mock("GET", "/admin/appliances/nope")
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":"not found","message":"Appliance not found"}"#)
        .create_async()
        .await;

    let response = portal
        .import_state(
            Context::new(),
            ImportResourceStateRequest {
                type_name: "appgate_appliance".to_string(),
                id: "nope".to_string(),
                client_capabilities: ClientCapabilities::default(),
            },
        )
        .await;

    assert!(response.imported_resources.is_empty());
    assert_eq!(response.diagnostics.len(), 1);
    assert_eq!(
        response.diagnostics[0].summary,
        "Cannot import non-existent remote object"
    );
}
