use tfplug::defaults::StaticDefault;
use tfplug::schema::{AttributeBuilder, AttributeType, NestedBlockBuilder, NestingMode, Schema, SchemaBuilder};
use tfplug::types::{Diagnostic, Dynamic};
use tfplug::validators::StringOneOf;

use super::codec::BlockCodec;
use super::common::{
    base_attributes, base_state, optional_bool, optional_string, required_name, string_set, tags,
};
use super::engine::{ManagedResource, Reconciler};
use super::state::{Attrs, StateBuilder};
use crate::api::entitlements::{Entitlement, EntitlementAction};
use crate::api::{ApiRevision, Client, Collection};

pub struct EntitlementReconciler;

pub fn entitlement() -> ManagedResource<EntitlementReconciler> {
    ManagedResource::new(EntitlementReconciler)
}

const BLOCKS: &[&str] = &["app_shortcuts"];

static CODEC: BlockCodec = BlockCodec::new(&[], &[("app_shortcuts", &["name", "url"])]);

const SUBTYPES: &[&str] = &[
    "icmp_up",
    "icmp_down",
    "icmpv6_up",
    "icmpv6_down",
    "udp_up",
    "udp_down",
    "tcp_up",
    "tcp_down",
    "ah_up",
    "ah_down",
    "esp_up",
    "esp_down",
    "gre_up",
    "gre_down",
    "http_up",
];

impl Reconciler for EntitlementReconciler {
    type Model = Entitlement;

    fn type_name(&self) -> &'static str {
        "appgate_entitlement"
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new()
            .description("What a user may reach, through which site and under which conditions")
            .attributes(base_attributes("entitlement"))
            .attribute(
                AttributeBuilder::new("disabled", AttributeType::Bool)
                    .description("Whether the entitlement is turned off")
                    .optional()
                    .default(StaticDefault::bool(false))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("site", AttributeType::String)
                    .description("ID of the site the traffic goes through")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("site_name", AttributeType::String)
                    .description("Name of the site")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("condition_logic", AttributeType::String)
                    .description("Whether all or any condition must pass")
                    .optional()
                    .default(StaticDefault::string("and"))
                    .validator(StringOneOf::create(&["and", "or"]))
                    .build(),
            )
            .attribute(string_set("conditions", "IDs of the conditions"))
            .attribute(
                AttributeBuilder::new("risk_sensitivity", AttributeType::String)
                    .description("Device risk level that blocks access")
                    .optional()
                    .validator(StringOneOf::create(&["Low", "Medium", "High", "Critical"]))
                    .build(),
            )
            .block(
                NestedBlockBuilder::new("actions", NestingMode::Set)
                    .min_items(1)
                    .attribute(
                        AttributeBuilder::new("subtype", AttributeType::String)
                            .required()
                            .validator(StringOneOf::create(SUBTYPES))
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("action", AttributeType::String)
                            .required()
                            .validator(StringOneOf::create(&["allow", "block", "alert"]))
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
            .block(
                NestedBlockBuilder::new("app_shortcuts", NestingMode::Set)
                    .description("Shortcuts shown on the client")
                    .attribute(
                        AttributeBuilder::new("name", AttributeType::String)
                            .required()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("url", AttributeType::String)
                            .required()
                            .build(),
                    )
                    .attribute(optional_string("description", "Description shown on the client"))
                    .attribute(optional_string("color_code", "Color of the shortcut"))
                    .attribute(optional_bool("always_show", "Show even when unavailable"))
                    .build(),
            )
            .build()
    }

    fn collection<'a>(&self, client: &'a Client) -> Collection<'a, Self::Model> {
        client.entitlements()
    }

    fn expand(
        &self,
        schema: &Schema,
        planned: &Dynamic,
        _revision: ApiRevision,
        model: &mut Self::Model,
    ) -> Result<(), Diagnostic> {
        let config = Attrs::new(planned);
        model.name = required_name(&config)?;
        model.notes = config.string("notes");
        model.tags = tags(&config);
        model.disabled = config.bool("disabled").unwrap_or(false);
        model.site = config.string("site").unwrap_or_default();
        model.condition_logic = config.string("condition_logic");
        model.conditions = config.string_set("conditions");
        model.risk_sensitivity = config.string("risk_sensitivity");
        model.actions = config
            .blocks("actions")
            .iter()
            .map(|a| EntitlementAction {
                subtype: a.string("subtype").unwrap_or_default(),
                action: a.string("action").unwrap_or_default(),
                hosts: a.strings("hosts"),
                ports: a.string_set("ports"),
                types: a.string_set("types"),
            })
            .collect();
        CODEC.encode(schema, BLOCKS, planned, &mut model.extra);
        Ok(())
    }

    fn flatten(&self, schema: &Schema, model: &Self::Model, _revision: ApiRevision) -> StateBuilder {
        let actions = model
            .actions
            .iter()
            .map(|a| {
                StateBuilder::new()
                    .string("subtype", &a.subtype)
                    .string("action", &a.action)
                    .set("hosts", a.hosts.iter().cloned())
                    .set("ports", a.ports.iter().cloned())
                    .set("types", a.types.iter().cloned())
            })
            .collect();

        let state = base_state(&model.id, &model.name, model.notes.as_deref(), &model.tags)
            .bool("disabled", model.disabled)
            .string("site", &model.site)
            .opt_string("site_name", model.site_name.clone())
            .opt_string("condition_logic", model.condition_logic.clone())
            .set("conditions", model.conditions.iter().cloned())
            .opt_string("risk_sensitivity", model.risk_sensitivity.clone())
            .block_set("actions", actions, &["subtype", "action", "hosts"]);
        CODEC.decode(schema, BLOCKS, &model.extra, state)
    }
}
