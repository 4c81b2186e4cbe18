use super::*;
use crate::api::identity_providers::IDENTITY_PROVIDER_SHAPE;
use crate::resources::test_helpers::{configured, create, strings, value};
use mockito::{Matcher, Server};
use serde_json::json;

fn ldap_config() -> tfplug::DynamicValue {
    value(vec![
        ("name", Dynamic::from("corp-ldap")),
        ("hostnames", strings(&["dc1.corp.local"])),
        ("admin_distinguished_name", Dynamic::from("CN=svc,OU=corp")),
        ("admin_password", Dynamic::from("hunter2")),
        ("object_class", Dynamic::from("user")),
    ])
}

#[tokio::test]
async fn object_class_becomes_a_user_filter_on_newer_peers() {
    let mut server = Server::new_async().await;
    let resource = configured(
        identity_provider(IdentityProviderKind::Ldap),
        &mut server,
        ApiRevision::V18,
        None,
    )
    .await;

    let stored = json!({
        "id": "idp-1",
        "name": "corp-ldap",
        "type": "Ldap",
        "hostnames": ["dc1.corp.local"],
        "port": 389,
        "sslEnabled": false,
        "adminDistinguishedName": "CN=svc,OU=corp",
        "userFilter": "(objectclass=user)",
        "usernameAttribute": "sAMAccountName",
        "membershipFilter": "(objectCategory=group)"
    });
    let post = server
        .mock("POST", "/admin/identity-providers")
        .match_body(Matcher::PartialJson(json!({
            "type": "Ldap",
            "userFilter": "(objectclass=user)",
            "adminPassword": "hunter2"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(stored.to_string())
        .create_async()
        .await;
    let _get = server
        .mock("GET", "/admin/identity-providers/idp-1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(stored.to_string())
        .create_async()
        .await;

    let response = create(&resource, ldap_config()).await;

    post.assert_async().await;
    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    let state = Attrs::of(&response.new_state);
    assert_eq!(state.string("object_class").as_deref(), Some("user"));
    assert_eq!(
        state.string("user_filter").as_deref(),
        Some("(objectclass=user)")
    );
    assert_eq!(state.string("admin_password").as_deref(), Some("hunter2"));
}

#[tokio::test]
async fn object_class_is_sent_as_is_to_old_peers() {
    let mut server = Server::new_async().await;
    let resource = configured(
        identity_provider(IdentityProviderKind::Ldap),
        &mut server,
        ApiRevision::V15,
        Some("5.5.3"),
    )
    .await;

    let stored = json!({
        "id": "idp-1",
        "name": "corp-ldap",
        "type": "Ldap",
        "hostnames": ["dc1.corp.local"],
        "adminDistinguishedName": "CN=svc,OU=corp",
        "objectClass": "user"
    });
    let post = server
        .mock("POST", "/admin/identity-providers")
        .match_body(Matcher::PartialJson(json!({"objectClass": "user"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(stored.to_string())
        .create_async()
        .await;
    let _get = server
        .mock("GET", "/admin/identity-providers/idp-1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(stored.to_string())
        .create_async()
        .await;

    let response = create(&resource, ldap_config()).await;

    post.assert_async().await;
    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    assert!(Attrs::of(&response.new_state).string("user_filter").is_none());
}

#[test]
fn request_body_carries_one_of_class_and_filter() {
    let reconciler = IdentityProviderReconciler::new(IdentityProviderKind::Ldap);
    let schema = reconciler.schema();
    let mut planned = ldap_config();
    schema.apply_defaults(&mut planned);

    let body = |revision: ApiRevision| {
        let mut model = IdentityProvider::default();
        reconciler
            .expand(&schema, &planned.value, revision, &mut model)
            .unwrap();
        let mut body = serde_json::to_value(&model).unwrap();
        IDENTITY_PROVIDER_SHAPE.encode(revision, &mut body);
        body
    };

    let v15 = body(ApiRevision::V15);
    assert_eq!(v15["objectClass"], "user");
    assert!(v15.get("userFilter").is_none());

    let v18 = body(ApiRevision::V18);
    assert!(v18.get("objectClass").is_none());
    assert_eq!(v18["userFilter"], "(objectclass=user)");
    assert_eq!(v18["usernameAttribute"], "sAMAccountName");
}

#[tokio::test]
async fn oidc_needs_six_two() {
    let mut server = Server::new_async().await;
    let resource = configured(
        identity_provider(IdentityProviderKind::Oidc),
        &mut server,
        ApiRevision::V16,
        None,
    )
    .await;
    let post = server
        .mock("POST", "/admin/identity-providers")
        .expect(0)
        .create_async()
        .await;

    let response = create(
        &resource,
        value(vec![
            ("name", Dynamic::from("google")),
            ("issuer", Dynamic::from("https://accounts.google.com")),
            ("audience", Dynamic::from("client-id")),
        ]),
    )
    .await;

    post.assert_async().await;
    assert_eq!(response.diagnostics.len(), 1);
    assert!(response.diagnostics[0]
        .detail
        .starts_with("appgate_oidc_identity_provider requires Appgate SDP 6.2.0"));
}

#[test]
fn claim_mappings_sort_by_claim_name() {
    let reconciler = IdentityProviderReconciler::new(IdentityProviderKind::Radius);
    let schema = reconciler.schema();
    let model: IdentityProvider = serde_json::from_value(json!({
        "id": "idp-2",
        "name": "radius",
        "type": "Radius",
        "hostnames": ["r1"],
        "claimMappings": [
            {"attributeName": "mail", "claimName": "email"},
            {"attributeName": "uid", "claimName": "username"},
            {"attributeName": "cn", "claimName": "display"}
        ],
        "onDemandClaimMappings": [
            {"command": "fileExists", "claimName": "agent", "platform": "desktop.windows.all",
             "parameters": {"path": "C:\\agent.exe"}}
        ],
        "onBoarding2FA": {"mfaProviderId": "mfa-1", "message": "Enter your code"}
    }))
    .unwrap();

    let state = reconciler.flatten(&schema, &model, ApiRevision::V18).build();
    let state = Attrs::of(&state);

    let claims: Vec<_> = state
        .blocks("claim_mappings")
        .iter()
        .map(|c| c.string("claim_name").unwrap())
        .collect();
    assert_eq!(claims, vec!["display", "email", "username"]);

    let on_demand = &state.blocks("on_demand_claim_mappings")[0];
    assert_eq!(
        on_demand.block("parameters").unwrap().string("path").as_deref(),
        Some("C:\\agent.exe")
    );
    assert_eq!(
        state
            .block("on_boarding_two_factor")
            .unwrap()
            .string("mfa_provider_id")
            .as_deref(),
        Some("mfa-1")
    );
}
