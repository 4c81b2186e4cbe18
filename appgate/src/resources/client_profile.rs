use async_trait::async_trait;
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{Diagnostic, Dynamic};
use tfplug::Context;

use super::common::{base_attributes, base_state, optional_string, required_name, tags};
use super::engine::{ManagedResource, Reconciler};
use super::state::{Attrs, StateBuilder};
use crate::api::client_profiles::ClientProfile;
use crate::api::{ApiError, ApiRevision, Client, Collection};

pub struct ClientProfileReconciler;

pub fn client_profile() -> ManagedResource<ClientProfileReconciler> {
    ManagedResource::new(ClientProfileReconciler)
}

#[async_trait]
impl Reconciler for ClientProfileReconciler {
    type Model = ClientProfile;

    fn type_name(&self) -> &'static str {
        "appgate_client_profile"
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new()
            .description("Enrollment profile that points clients at a collective")
            .attributes(base_attributes("client profile"))
            .attribute(
                AttributeBuilder::new("spa_key_name", AttributeType::String)
                    .description("Name of the SPA key shared with the clients")
                    .required()
                    .force_new()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("identity_provider_name", AttributeType::String)
                    .description("Identity provider the clients sign in with")
                    .required()
                    .build(),
            )
            .attribute(optional_string(
                "hostname",
                "Controller hostname written into the profile",
            ))
            .attribute(
                AttributeBuilder::new("url", AttributeType::String)
                    .description("Enrollment link for the profile")
                    .computed()
                    .build(),
            )
            .build()
    }

    fn min_revision(&self) -> ApiRevision {
        ApiRevision::V16
    }

    fn collection<'a>(&self, client: &'a Client) -> Collection<'a, Self::Model> {
        client.client_profiles().collection()
    }

    fn expand(
        &self,
        _schema: &Schema,
        planned: &Dynamic,
        _revision: ApiRevision,
        model: &mut Self::Model,
    ) -> Result<(), Diagnostic> {
        let config = Attrs::new(planned);
        model.name = required_name(&config)?;
        model.notes = config.string("notes");
        model.tags = tags(&config);
        model.spa_key_name = config.string("spa_key_name").unwrap_or_default();
        model.identity_provider_name = config.string("identity_provider_name").unwrap_or_default();
        model.hostname = config.non_empty_string("hostname");
        Ok(())
    }

    fn flatten(&self, _schema: &Schema, model: &Self::Model, _revision: ApiRevision) -> StateBuilder {
        base_state(&model.id, &model.name, model.notes.as_deref(), &model.tags)
            .string("spa_key_name", &model.spa_key_name)
            .string("identity_provider_name", &model.identity_provider_name)
            .opt_string("hostname", model.hostname.clone())
    }

    async fn after_read(
        &self,
        ctx: &Context,
        client: &Client,
        model: &Self::Model,
        _prior: &Dynamic,
        state: StateBuilder,
    ) -> Result<StateBuilder, ApiError> {
        let url = client.client_profiles().url(ctx, &model.id).await?;
        Ok(state.string("url", url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::test_helpers::{configured, create, read, value};
    use mockito::Server;

    const PROFILE: &str = r#"{"id":"p1","name":"corp","spaKeyName":"corp-key","identityProviderName":"local"}"#;

    #[tokio::test]
    async fn url_is_read_alongside_the_profile() {
        let mut server = Server::new_async().await;
        let resource = configured(client_profile(), &mut server, ApiRevision::V18, None).await;
        let _get = server
            .mock("GET", "/admin/client-profiles/p1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(PROFILE)
            .create_async()
            .await;
        let _url = server
            .mock("GET", "/admin/client-profiles/p1/url")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"url":"appgate://sdp.example.com/eyJhIjoxfQ"}"#)
            .create_async()
            .await;

        let response = read(&resource, value(vec![("id", Dynamic::from("p1"))])).await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        let state = response.new_state.unwrap();
        assert_eq!(
            Attrs::of(&state).string("url").as_deref(),
            Some("appgate://sdp.example.com/eyJhIjoxfQ")
        );
    }

    #[tokio::test]
    async fn older_collectives_have_no_client_profiles() {
        let mut server = Server::new_async().await;
        let resource = configured(client_profile(), &mut server, ApiRevision::V15, None).await;
        let post = server
            .mock("POST", "/admin/client-profiles")
            .expect(0)
            .create_async()
            .await;

        let response = create(
            &resource,
            value(vec![
                ("name", Dynamic::from("corp")),
                ("spa_key_name", Dynamic::from("corp-key")),
                ("identity_provider_name", Dynamic::from("local")),
            ]),
        )
        .await;

        post.assert_async().await;
        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(response.diagnostics[0].summary, "Unsupported Appgate SDP version");
        assert!(response.diagnostics[0].attribute.is_none());
        assert!(response.diagnostics[0]
            .detail
            .contains("appgate_client_profile requires Appgate SDP 6.0.0"));
    }
}
