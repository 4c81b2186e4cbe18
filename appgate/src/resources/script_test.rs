use super::*;
use crate::resources::state::Attrs;
use crate::resources::test_helpers::{configured, create, delete, read, strings, update, value};
use mockito::{Matcher, Server};
use serde_json::json;
use tfplug::resource::{ResourceSchemaRequest, ValidateResourceConfigRequest};
use tfplug::types::ClientCapabilities;
use tfplug::{Context, Resource};

const SCRIPT_BODY: &str = r#"{
    "id": "script-1",
    "name": "s1",
    "notes": "x",
    "tags": ["b", "a"],
    "expression": "return true;"
}"#;

#[tokio::test]
async fn schema_lists_expression_and_base_attributes() {
    let resource = criteria_script();
    let response = resource.schema(Context::new(), ResourceSchemaRequest).await;

    let attrs = &response.schema.block.attributes;
    assert!(attrs.iter().any(|a| a.name == "id" && a.computed));
    assert!(attrs.iter().any(|a| a.name == "name" && a.required));
    assert!(attrs.iter().any(|a| a.name == "expression" && a.required));
    assert!(!attrs.iter().any(|a| a.name == "type"));
}

#[tokio::test]
async fn entitlement_scripts_validate_their_type() {
    let resource = entitlement_script();
    let config = value(vec![
        ("name", Dynamic::from("hosts")),
        ("expression", Dynamic::from("return [];")),
        ("type", Dynamic::from("url")),
    ]);

    let response = resource
        .validate(
            Context::new(),
            ValidateResourceConfigRequest {
                type_name: "appgate_entitlement_script".to_string(),
                config,
                client_capabilities: ClientCapabilities::default(),
            },
        )
        .await;

    assert_eq!(response.diagnostics.len(), 1);
    assert_eq!(
        response.diagnostics[0].attribute,
        Some(tfplug::AttributePath::new("type"))
    );
}

#[tokio::test]
async fn create_posts_the_script_and_reads_it_back() {
    let mut server = Server::new_async().await;
    let resource = configured(criteria_script(), &mut server, ApiRevision::V18, None).await;

    let post = server
        .mock("POST", "/admin/criteria-scripts")
        .match_body(Matcher::PartialJson(json!({
            "name": "s1",
            "expression": "return true;",
            "notes": "x",
            "tags": ["a", "b"]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(SCRIPT_BODY)
        .create_async()
        .await;
    let get = server
        .mock("GET", "/admin/criteria-scripts/script-1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(SCRIPT_BODY)
        .create_async()
        .await;

    let response = create(
        &resource,
        value(vec![
            ("id", Dynamic::Unknown),
            ("name", Dynamic::from("s1")),
            ("expression", Dynamic::from("return true;")),
            ("notes", Dynamic::from("x")),
            ("tags", strings(&["b", "a"])),
        ]),
    )
    .await;

    post.assert_async().await;
    get.assert_async().await;
    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);

    let state = Attrs::of(&response.new_state);
    assert_eq!(state.string("id").as_deref(), Some("script-1"));
    assert_eq!(state.strings("tags"), vec!["a", "b"]);
}

#[tokio::test]
async fn update_keeps_peer_fields_and_changes_notes() {
    let mut server = Server::new_async().await;
    let resource = configured(criteria_script(), &mut server, ApiRevision::V18, None).await;

    let stored = json!({
        "id": "script-1",
        "name": "s1",
        "notes": "x",
        "tags": ["a", "b"],
        "expression": "return true;",
        "created": "2024-01-01T00:00:00Z"
    });
    let mut updated = stored.clone();
    updated["notes"] = json!("y");

    let _get = server
        .mock("GET", "/admin/criteria-scripts/script-1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(stored.to_string())
        .expect(1)
        .create_async()
        .await;
    let put = server
        .mock("PUT", "/admin/criteria-scripts/script-1")
        .match_body(Matcher::PartialJson(json!({
            "notes": "y",
            "created": "2024-01-01T00:00:00Z"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(updated.to_string())
        .create_async()
        .await;
    let _reread = server
        .mock("GET", "/admin/criteria-scripts/script-1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(updated.to_string())
        .create_async()
        .await;

    let prior = value(vec![
        ("id", Dynamic::from("script-1")),
        ("name", Dynamic::from("s1")),
        ("expression", Dynamic::from("return true;")),
        ("notes", Dynamic::from("x")),
        ("tags", strings(&["a", "b"])),
    ]);
    let planned = value(vec![
        ("id", Dynamic::from("script-1")),
        ("name", Dynamic::from("s1")),
        ("expression", Dynamic::from("return true;")),
        ("notes", Dynamic::from("y")),
        ("tags", strings(&["a", "b"])),
    ]);

    let response = update(&resource, prior, planned).await;

    put.assert_async().await;
    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    assert_eq!(
        Attrs::of(&response.new_state).string("notes").as_deref(),
        Some("y")
    );
}

#[tokio::test]
async fn read_of_a_vanished_script_clears_state() {
    let mut server = Server::new_async().await;
    let resource = configured(criteria_script(), &mut server, ApiRevision::V18, None).await;

    let _get = server
        .mock("GET", "/admin/criteria-scripts/gone")
        .with_status(404)
        .with_body(r#"{"id":"not found","message":"Object not found"}"#)
        .create_async()
        .await;

    let response = read(&resource, value(vec![("id", Dynamic::from("gone"))])).await;

    assert!(response.diagnostics.is_empty());
    assert!(response.new_state.is_none());
}

#[tokio::test]
async fn delete_of_a_missing_script_succeeds() {
    let mut server = Server::new_async().await;
    let resource = configured(criteria_script(), &mut server, ApiRevision::V18, None).await;

    let _get = server
        .mock("GET", "/admin/criteria-scripts/gone")
        .with_status(404)
        .with_body(r#"{"id":"not found","message":"Object not found"}"#)
        .create_async()
        .await;
    let delete_mock = server
        .mock("DELETE", "/admin/criteria-scripts/gone")
        .expect(0)
        .create_async()
        .await;

    let response = delete(&resource, value(vec![("id", Dynamic::from("gone"))])).await;

    assert!(response.diagnostics.is_empty());
    delete_mock.assert_async().await;
}

#[tokio::test]
async fn device_script_file_survives_reads() {
    let mut server = Server::new_async().await;
    let resource = configured(device_script(), &mut server, ApiRevision::V18, None).await;

    let _get = server
        .mock("GET", "/admin/device-scripts/d1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":"d1","name":"probe","filename":"probe.sh","checksum":"abc"}"#)
        .create_async()
        .await;

    let response = read(
        &resource,
        value(vec![
            ("id", Dynamic::from("d1")),
            ("name", Dynamic::from("probe")),
            ("filename", Dynamic::from("probe.sh")),
            ("file", Dynamic::from("IyEvYmluL3NoCg==")),
        ]),
    )
    .await;

    let state = response.new_state.unwrap();
    let state = Attrs::of(&state);
    assert_eq!(state.string("file").as_deref(), Some("IyEvYmluL3NoCg=="));
    assert_eq!(state.string("checksum").as_deref(), Some("abc"));
}

#[tokio::test]
async fn failed_create_keeps_the_assigned_id() {
    let mut server = Server::new_async().await;
    let resource = configured(criteria_script(), &mut server, ApiRevision::V18, None).await;

    let post = server
        .mock("POST", "/admin/criteria-scripts")
        .with_status(503)
        .with_body(r#"{"id":"service unavailable","message":"Controller is busy"}"#)
        .expect(1)
        .create_async()
        .await;

    let response = create(
        &resource,
        value(vec![
            ("id", Dynamic::Unknown),
            ("name", Dynamic::from("s1")),
            ("expression", Dynamic::from("return true;")),
        ]),
    )
    .await;

    post.assert_async().await;
    assert_eq!(response.diagnostics.len(), 1, "{:?}", response.diagnostics);
    let state = Attrs::of(&response.new_state);
    let id = state.string("id").expect("assigned id is kept");
    assert!(uuid::Uuid::parse_str(&id).is_ok(), "{}", id);
    assert_eq!(state.string("name").as_deref(), Some("s1"));
}

#[tokio::test]
async fn cancelled_create_keeps_the_assigned_id() {
    let mut server = Server::new_async().await;
    let resource = configured(criteria_script(), &mut server, ApiRevision::V18, None).await;
    let planned = value(vec![
        ("id", Dynamic::Unknown),
        ("name", Dynamic::from("s1")),
        ("expression", Dynamic::from("return true;")),
    ]);

    let ctx = Context::new();
    ctx.cancel();
    let response = resource
        .create(
            ctx,
            tfplug::resource::CreateResourceRequest {
                type_name: "appgate_criteria_script".to_string(),
                config: planned.clone(),
                planned_state: planned,
                provider_meta: None,
            },
        )
        .await;

    assert!(!response.diagnostics.is_empty());
    let state = Attrs::of(&response.new_state);
    assert!(state.non_empty_string("id").is_some(), "{:?}", response.new_state);
}

#[tokio::test]
async fn rejected_create_records_nothing() {
    let mut server = Server::new_async().await;
    let resource = configured(criteria_script(), &mut server, ApiRevision::V18, None).await;

    let _post = server
        .mock("POST", "/admin/criteria-scripts")
        .with_status(409)
        .with_body(r#"{"id":"conflict","message":"Name already in use"}"#)
        .create_async()
        .await;

    let response = create(
        &resource,
        value(vec![
            ("name", Dynamic::from("s1")),
            ("expression", Dynamic::from("return true;")),
        ]),
    )
    .await;

    assert!(!response.diagnostics.is_empty());
    assert!(response.new_state.is_null());
}
