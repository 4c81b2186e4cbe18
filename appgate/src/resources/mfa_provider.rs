use tfplug::defaults::StaticDefault;
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{Diagnostic, Dynamic};
use tfplug::validators::{IntBetween, StringOneOf};

use super::common::{base_attributes, base_state, optional_bool, required_name, secret, string_list, tags};
use super::engine::{ManagedResource, Reconciler};
use super::state::{Attrs, StateBuilder};
use crate::api::mfa_providers::MfaProvider;
use crate::api::{ApiRevision, Client, Collection};

pub struct MfaProviderReconciler;

pub fn mfa_provider() -> ManagedResource<MfaProviderReconciler> {
    ManagedResource::new(MfaProviderReconciler)
}

impl Reconciler for MfaProviderReconciler {
    type Model = MfaProvider;

    fn type_name(&self) -> &'static str {
        "appgate_mfa_provider"
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new()
            .description("Second factor used by identity providers and conditions")
            .attributes(base_attributes("MFA provider"))
            .attribute(
                AttributeBuilder::new("type", AttributeType::String)
                    .description("Radius or DefaultTimeBased")
                    .required()
                    .force_new()
                    .validator(StringOneOf::create(&["Radius", "DefaultTimeBased"]))
                    .build(),
            )
            .attribute(string_list("hostnames", "RADIUS servers, tried in order"))
            .attribute(
                AttributeBuilder::new("port", AttributeType::Number)
                    .description("RADIUS port")
                    .optional()
                    .default(StaticDefault::number(1812.0))
                    .validator(IntBetween::create(1, 65535))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("input_type", AttributeType::String)
                    .description("How the client asks for the code")
                    .optional()
                    .default(StaticDefault::string("Masked"))
                    .validator(StringOneOf::create(&["Masked", "Numeric"]))
                    .build(),
            )
            .attribute(secret("shared_secret", "RADIUS shared secret"))
            .attribute(
                AttributeBuilder::new("authentication_protocol", AttributeType::String)
                    .description("RADIUS authentication protocol")
                    .optional()
                    .default(StaticDefault::string("CHAP"))
                    .validator(StringOneOf::create(&["PAP", "CHAP"]))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("timeout", AttributeType::Number)
                    .description("Seconds to wait for the RADIUS server")
                    .optional()
                    .default(StaticDefault::number(10.0))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("mode", AttributeType::String)
                    .description("OneFactor or Challenge")
                    .optional()
                    .default(StaticDefault::string("OneFactor"))
                    .validator(StringOneOf::create(&["OneFactor", "Challenge"]))
                    .build(),
            )
            .attribute(optional_bool(
                "use_user_password",
                "Send the user's password along with the code",
            ))
            .attribute(secret(
                "challenge_shared_secret",
                "Shared secret of the challenge exchange",
            ))
            .build()
    }

    fn collection<'a>(&self, client: &'a Client) -> Collection<'a, Self::Model> {
        client.mfa_providers()
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
        model.kind = config.string("type").unwrap_or_default();
        model.hostnames = config.strings("hostnames");
        model.port = config.int("port");
        model.input_type = config.string("input_type");
        if let Some(secret) = config.non_empty_string("shared_secret") {
            model.shared_secret = Some(secret);
        }
        model.authentication_protocol = config.string("authentication_protocol");
        model.timeout = config.int("timeout");
        model.mode = config.string("mode");
        model.use_user_password = config.bool("use_user_password");
        if let Some(secret) = config.non_empty_string("challenge_shared_secret") {
            model.challenge_shared_secret = Some(secret);
        }
        Ok(())
    }

    fn flatten(&self, _schema: &Schema, model: &Self::Model, _revision: ApiRevision) -> StateBuilder {
        base_state(&model.id, &model.name, model.notes.as_deref(), &model.tags)
            .string("type", &model.kind)
            .list("hostnames", model.hostnames.iter().cloned())
            .opt_int("port", model.port)
            .opt_string("input_type", model.input_type.clone())
            .opt_string("authentication_protocol", model.authentication_protocol.clone())
            .opt_int("timeout", model.timeout)
            .opt_string("mode", model.mode.clone())
            .opt_bool("use_user_password", model.use_user_password)
    }
}
