//! Blacklist entries have no update on the peer; every attribute replaces
//! the entry and the distinguished name doubles as the id.

use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{Diagnostic, Dynamic};

use super::engine::{ManagedResource, Reconciler};
use super::state::{Attrs, StateBuilder};
use crate::api::blacklist::BlacklistEntry;
use crate::api::{ApiRevision, Client, Collection};

pub struct BlacklistUserReconciler;

pub fn blacklist_user() -> ManagedResource<BlacklistUserReconciler> {
    ManagedResource::new(BlacklistUserReconciler)
}

fn replacing(name: &str, description: &str) -> AttributeBuilder {
    AttributeBuilder::new(name, AttributeType::String)
        .description(description)
        .force_new()
}

impl Reconciler for BlacklistUserReconciler {
    type Model = BlacklistEntry;

    fn type_name(&self) -> &'static str {
        "appgate_blacklist_user"
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new()
            .description("User barred from signing in to the collective")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Distinguished name of the user")
                    .computed()
                    .build(),
            )
            .attribute(
                replacing(
                    "user_distinguished_name",
                    "Distinguished name, e.g. CN=bob,OU=local",
                )
                .required()
                .build(),
            )
            .attribute(replacing("username", "Username shown in the admin UI").optional().build())
            .attribute(
                replacing("provider_name", "Identity provider of the user")
                    .optional()
                    .build(),
            )
            .attribute(replacing("reason", "Why the user was blacklisted").optional().build())
            .attribute(
                AttributeBuilder::new("blacklisted_at", AttributeType::String)
                    .description("When the entry was added")
                    .computed()
                    .build(),
            )
            .build()
    }

    fn collection<'a>(&self, client: &'a Client) -> Collection<'a, Self::Model> {
        client.blacklist()
    }

    fn assign_id(&self, _model: &mut Self::Model) {}

    fn expand(
        &self,
        _schema: &Schema,
        planned: &Dynamic,
        _revision: ApiRevision,
        model: &mut Self::Model,
    ) -> Result<(), Diagnostic> {
        let config = Attrs::new(planned);
        model.user_distinguished_name =
            config.non_empty_string("user_distinguished_name").ok_or_else(|| {
                Diagnostic::error(
                    "Missing user_distinguished_name",
                    "A blacklist entry is keyed by the user's distinguished name",
                )
            })?;
        model.username = config.non_empty_string("username");
        model.provider_name = config.non_empty_string("provider_name");
        model.reason = config.non_empty_string("reason");
        Ok(())
    }

    fn flatten(&self, _schema: &Schema, model: &Self::Model, _revision: ApiRevision) -> StateBuilder {
        StateBuilder::new()
            .string("id", &model.user_distinguished_name)
            .string("user_distinguished_name", &model.user_distinguished_name)
            .opt_string("username", model.username.clone())
            .opt_string("provider_name", model.provider_name.clone())
            .opt_string("reason", model.reason.clone())
            .opt_string("blacklisted_at", model.blacklisted_at.clone())
    }
}
