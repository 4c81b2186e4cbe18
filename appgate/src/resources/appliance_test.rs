use super::*;
use crate::resources::test_helpers::{blocks, configured, create, delete, object, read, strings, value};
use mockito::{Matcher, Server};
use serde_json::json;
use tfplug::AttributePath;

fn client_interface() -> Dynamic {
    object(vec![
        ("hostname", Dynamic::from("gw.example.com")),
        ("https_port", Dynamic::Number(447.0)),
    ])
}

fn gateway_config(extra: Vec<(&'static str, Dynamic)>) -> tfplug::DynamicValue {
    let mut pairs = vec![
        ("name", Dynamic::from("gateway-1")),
        ("hostname", Dynamic::from("gw.example.com")),
        ("site", Dynamic::from("site-1")),
        ("client_interface", client_interface()),
    ];
    pairs.extend(extra);
    value(pairs)
}

fn stored(activated: bool) -> serde_json::Value {
    json!({
        "id": "a1",
        "name": "gateway-1",
        "tags": [],
        "hostname": "gw.example.com",
        "site": "site-1",
        "siteName": "Default Site",
        "activated": activated,
        "clientInterface": {"hostname": "gw.example.com", "httpsPort": 447, "dtlsPort": 443}
    })
}

#[tokio::test]
async fn inactive_appliances_export_a_seed_once() {
    let mut server = Server::new_async().await;
    let resource = configured(appliance(), &mut server, ApiRevision::V18, None).await;

    let post = server
        .mock("POST", "/admin/appliances")
        .match_body(Matcher::PartialJson(json!({
            "hostname": "gw.example.com",
            "clientInterface": {"hostname": "gw.example.com", "httpsPort": 447, "dtlsPort": 443}
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(stored(false).to_string())
        .create_async()
        .await;
    let _get = server
        .mock("GET", "/admin/appliances/a1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(stored(false).to_string())
        .create_async()
        .await;
    let export = server
        .mock("POST", "/admin/appliances/a1/export")
        .match_body(Matcher::PartialJson(json!({
            "provideCloudSSHKey": true,
            "sshPassword": "cz-pass"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"seed":"payload"}"#)
        .expect(1)
        .create_async()
        .await;

    let response = create(
        &resource,
        gateway_config(vec![(
            "seed_options",
            blocks(vec![object(vec![
                ("ssh_password", Dynamic::from("cz-pass")),
                ("provide_cloud_ssh_key", Dynamic::from(true)),
            ])]),
        )]),
    )
    .await;

    post.assert_async().await;
    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    let state = Attrs::of(&response.new_state);
    let seed = state.string("seed_file").unwrap();
    assert_eq!(STANDARD.decode(seed).unwrap(), br#"{"seed":"payload"}"#);
    assert_eq!(state.bool("activated"), Some(false));
    assert_eq!(state.string("site_name").as_deref(), Some("Default Site"));
    assert_eq!(
        state.block("seed_options").unwrap().string("ssh_password").as_deref(),
        Some("cz-pass")
    );

    // a refresh keeps the seed that is already in state
    let refreshed = read(&resource, response.new_state.clone()).await;
    assert!(refreshed.diagnostics.is_empty(), "{:?}", refreshed.diagnostics);
    let refreshed = refreshed.new_state.unwrap();
    assert_eq!(
        Attrs::of(&refreshed).string("seed_file"),
        Attrs::of(&response.new_state).string("seed_file")
    );
    export.assert_async().await;
}

#[tokio::test]
async fn activated_appliances_are_deactivated_before_delete() {
    let mut server = Server::new_async().await;
    let resource = configured(appliance(), &mut server, ApiRevision::V18, None).await;

    let _get = server
        .mock("GET", "/admin/appliances/a1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(stored(true).to_string())
        .create_async()
        .await;
    let deactivate = server
        .mock("POST", "/admin/appliances/a1/deactivate")
        .match_query(Matcher::UrlEncoded("wipe".into(), "true".into()))
        .with_status(204)
        .create_async()
        .await;
    let remove = server
        .mock("DELETE", "/admin/appliances/a1")
        .with_status(204)
        .create_async()
        .await;

    let response = delete(&resource, value(vec![("id", Dynamic::from("a1"))])).await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    deactivate.assert_async().await;
    remove.assert_async().await;
}

#[tokio::test]
async fn prometheus_exporter_needs_six_two() {
    let mut server = Server::new_async().await;
    let resource = configured(appliance(), &mut server, ApiRevision::V17, Some("6.1.2")).await;
    let post = server
        .mock("POST", "/admin/appliances")
        .expect(0)
        .create_async()
        .await;

    let response = create(
        &resource,
        gateway_config(vec![(
            "prometheus_exporter",
            blocks(vec![object(vec![
                ("enabled", Dynamic::from(true)),
                ("use_https", Dynamic::from(true)),
            ])]),
        )]),
    )
    .await;

    post.assert_async().await;
    assert_eq!(response.diagnostics.len(), 1);
    assert_eq!(
        response.diagnostics[0].attribute,
        Some(
            AttributePath::new("prometheus_exporter")
                .index(0)
                .attribute("use_https")
        )
    );
    assert!(response.diagnostics[0].detail.contains("Appgate SDP 6.2"));
}

#[test]
fn log_forwarder_uses_the_wire_spelling_of_kinesis() {
    let reconciler = ApplianceReconciler;
    let schema = reconciler.schema();
    let mut planned = gateway_config(vec![
        (
            "log_forwarder",
            blocks(vec![object(vec![
                ("enabled", Dynamic::from(true)),
                (
                    "aws_kinesis",
                    blocks(vec![object(vec![
                        ("type", Dynamic::from("Stream")),
                        ("region", Dynamic::from("eu-west-1")),
                        ("stream_name", Dynamic::from("sdp-logs")),
                    ])]),
                ),
            ])]),
        ),
        ("hostname_aliases", strings(&["gw"])),
    ]);
    schema.apply_defaults(&mut planned);

    let mut model = Appliance::default();
    reconciler
        .expand(&schema, &planned.value, ApiRevision::V18, &mut model)
        .unwrap();

    let forwarder = &model.extra["logForwarder"];
    assert_eq!(forwarder["awsKineses"][0]["streamName"], "sdp-logs");
    assert!(forwarder.get("awsKinesis").is_none());
    assert!(model.extra.get("seedOptions").is_none());
    assert_eq!(model.hostname_aliases, vec!["gw"]);
}

#[test]
fn allow_sources_sort_by_address_then_nic() {
    let reconciler = ApplianceReconciler;
    let schema = reconciler.schema();
    let mut model: Appliance = serde_json::from_value(stored(true)).unwrap();
    model.extra.insert(
        "clientInterface".into(),
        json!({
            "hostname": "gw.example.com",
            "allowSources": [
                {"address": "10.0.0.0", "netmask": 8, "nic": "eth1"},
                {"address": "0.0.0.0", "netmask": 0, "nic": "eth0"},
                {"address": "10.0.0.0", "netmask": 8, "nic": "eth0"}
            ]
        }),
    );

    let state = reconciler.flatten(&schema, &model, ApiRevision::V18).build();
    let sources: Vec<String> = Attrs::of(&state)
        .block("client_interface")
        .unwrap()
        .blocks("allow_sources")
        .iter()
        .map(|s| format!("{}/{}", s.string("address").unwrap(), s.string("nic").unwrap()))
        .collect();
    assert_eq!(sources, vec!["0.0.0.0/eth0", "10.0.0.0/eth0", "10.0.0.0/eth1"]);
}
