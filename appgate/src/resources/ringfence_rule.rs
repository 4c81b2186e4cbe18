use tfplug::schema::{AttributeBuilder, AttributeType, NestedBlockBuilder, NestingMode, Schema, SchemaBuilder};
use tfplug::types::{Diagnostic, Dynamic};
use tfplug::validators::StringOneOf;

use super::common::{base_attributes, base_state, required_name, string_set, tags};
use super::engine::{ManagedResource, Reconciler};
use super::state::{Attrs, StateBuilder};
use crate::api::ringfence_rules::{RingfenceAction, RingfenceRule};
use crate::api::{ApiRevision, Client, Collection};

pub struct RingfenceRuleReconciler;

pub fn ringfence_rule() -> ManagedResource<RingfenceRuleReconciler> {
    ManagedResource::new(RingfenceRuleReconciler)
}

impl Reconciler for RingfenceRuleReconciler {
    type Model = RingfenceRule;

    fn type_name(&self) -> &'static str {
        "appgate_ringfence_rule"
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new()
            .description("Firewall rules applied on the client once it is admitted")
            .attributes(base_attributes("ringfence rule"))
            .block(
                NestedBlockBuilder::new("actions", NestingMode::Set)
                    .min_items(1)
                    .attribute(
                        AttributeBuilder::new("protocol", AttributeType::String)
                            .required()
                            .validator(StringOneOf::create(&["icmp", "icmpv6", "udp", "tcp"]))
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("direction", AttributeType::String)
                            .required()
                            .validator(StringOneOf::create(&["up", "down"]))
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("action", AttributeType::String)
                            .required()
                            .validator(StringOneOf::create(&["allow", "block"]))
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("hosts", AttributeType::set_of(AttributeType::String))
                            .required()
                            .build(),
                    )
                    .attribute(string_set("ports", "Destination ports or ranges"))
                    .attribute(string_set("types", "ICMP types"))
                    .build(),
            )
            .build()
    }

    fn collection<'a>(&self, client: &'a Client) -> Collection<'a, Self::Model> {
        client.ringfence_rules()
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
        model.actions = config
            .blocks("actions")
            .iter()
            .map(|a| RingfenceAction {
                protocol: a.string("protocol").unwrap_or_default(),
                direction: a.string("direction").unwrap_or_default(),
                action: a.string("action").unwrap_or_default(),
                hosts: a.strings("hosts"),
                ports: a.string_set("ports"),
                types: a.string_set("types"),
            })
            .collect();
        Ok(())
    }

    fn flatten(&self, _schema: &Schema, model: &Self::Model, _revision: ApiRevision) -> StateBuilder {
        let actions = model
            .actions
            .iter()
            .map(|a| {
                StateBuilder::new()
                    .string("protocol", &a.protocol)
                    .string("direction", &a.direction)
                    .string("action", &a.action)
                    .set("hosts", a.hosts.iter().cloned())
                    .set("ports", a.ports.iter().cloned())
                    .set("types", a.types.iter().cloned())
            })
            .collect();

        base_state(&model.id, &model.name, model.notes.as_deref(), &model.tags).block_set(
            "actions",
            actions,
            &["protocol", "direction", "action", "hosts"],
        )
    }
}
