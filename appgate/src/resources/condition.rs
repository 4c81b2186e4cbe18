use tfplug::schema::{AttributeBuilder, AttributeType, NestedBlockBuilder, NestingMode, Schema, SchemaBuilder};
use tfplug::types::{Diagnostic, Dynamic};
use tfplug::validators::StringOneOf;

use super::common::{base_attributes, base_state, optional_string, required_name, string_set, tags};
use super::engine::{ManagedResource, Reconciler};
use super::state::{Attrs, StateBuilder};
use crate::api::conditions::{Condition, RemedyMethod};
use crate::api::{ApiRevision, Client, Collection};

pub struct ConditionReconciler;

pub fn condition() -> ManagedResource<ConditionReconciler> {
    ManagedResource::new(ConditionReconciler)
}

const REMEDY_TYPES: &[&str] = &[
    "DisplayMessage",
    "OtpAuthentication",
    "PasswordAuthentication",
    "Reason",
];

impl Reconciler for ConditionReconciler {
    type Model = Condition;

    fn type_name(&self) -> &'static str {
        "appgate_condition"
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new()
            .description("Named expression used by entitlements and policies")
            .attributes(base_attributes("condition"))
            .attribute(
                AttributeBuilder::new("expression", AttributeType::String)
                    .description("Boolean expression in JavaScript")
                    .required()
                    .build(),
            )
            .attribute(string_set(
                "repeat_schedules",
                "When to re-evaluate, e.g. 1h or 13:32",
            ))
            .attribute(
                AttributeBuilder::new("remedy_logic", AttributeType::String)
                    .description("Whether all or any remedy must pass")
                    .optional()
                    .validator(StringOneOf::create(&["and", "or"]))
                    .build(),
            )
            .block(
                NestedBlockBuilder::new("remedy_methods", NestingMode::Set)
                    .description("Actions offered to the user when the condition fails")
                    .attribute(
                        AttributeBuilder::new("type", AttributeType::String)
                            .required()
                            .validator(StringOneOf::create(REMEDY_TYPES))
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("message", AttributeType::String)
                            .required()
                            .build(),
                    )
                    .attribute(optional_string("claim_suffix", "Suffix of the claim set by the remedy"))
                    .attribute(optional_string("provider_id", "MFA provider used by OTP remedies"))
                    .build(),
            )
            .build()
    }

    fn collection<'a>(&self, client: &'a Client) -> Collection<'a, Self::Model> {
        client.conditions()
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
        model.expression = config.string("expression").unwrap_or_default();
        model.repeat_schedules = config.strings("repeat_schedules");
        model.remedy_logic = config.string("remedy_logic");
        model.remedy_methods = config
            .blocks("remedy_methods")
            .iter()
            .map(|m| RemedyMethod {
                kind: m.string("type").unwrap_or_default(),
                message: m.string("message").unwrap_or_default(),
                claim_suffix: m.non_empty_string("claim_suffix"),
                provider_id: m.non_empty_string("provider_id"),
            })
            .collect();
        Ok(())
    }

    fn flatten(&self, _schema: &Schema, model: &Self::Model, _revision: ApiRevision) -> StateBuilder {
        let methods = model
            .remedy_methods
            .iter()
            .map(|m| {
                StateBuilder::new()
                    .string("type", &m.kind)
                    .string("message", &m.message)
                    .opt_string("claim_suffix", m.claim_suffix.clone())
                    .opt_string("provider_id", m.provider_id.clone())
            })
            .collect();

        base_state(&model.id, &model.name, model.notes.as_deref(), &model.tags)
            .string("expression", &model.expression)
            .set("repeat_schedules", model.repeat_schedules.iter().cloned())
            .opt_string("remedy_logic", model.remedy_logic.clone())
            .block_set("remedy_methods", methods, &["type", "message"])
    }
}
