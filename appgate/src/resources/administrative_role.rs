use tfplug::schema::{AttributeBuilder, AttributeType, NestedBlockBuilder, NestingMode, Schema, SchemaBuilder};
use tfplug::types::{Diagnostic, Dynamic};

use super::common::{base_attributes, base_state, optional_bool, required_name, string_set, tags};
use super::engine::{ManagedResource, Reconciler};
use super::state::{Attrs, StateBuilder};
use crate::api::administrative_roles::{AdministrativeRole, Privilege, PrivilegeScope};
use crate::api::{ApiRevision, Client, Collection};

pub struct AdministrativeRoleReconciler;

pub fn administrative_role() -> ManagedResource<AdministrativeRoleReconciler> {
    ManagedResource::new(AdministrativeRoleReconciler)
}

fn privilege(block: &Attrs<'_>) -> Privilege {
    Privilege {
        kind: block.string("type").unwrap_or_default(),
        target: block.string("target").unwrap_or_default(),
        scope: block.block("scope").map(|scope| PrivilegeScope {
            all: scope.bool("all").unwrap_or(false),
            ids: scope.string_set("ids"),
            tags: scope.string_set("tags"),
        }),
        default_tags: block.strings("default_tags"),
        functions: block.string_set("functions"),
    }
}

impl Reconciler for AdministrativeRoleReconciler {
    type Model = AdministrativeRole;

    fn type_name(&self) -> &'static str {
        "appgate_administrative_role"
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new()
            .description("Set of admin UI and API privileges granted through admin policies")
            .attributes(base_attributes("administrative role"))
            .block(
                NestedBlockBuilder::new("privileges", NestingMode::Set)
                    .min_items(1)
                    .attribute(
                        AttributeBuilder::new("type", AttributeType::String)
                            .description("What the privilege allows, e.g. View or Edit")
                            .required()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("target", AttributeType::String)
                            .description("Object type the privilege applies to")
                            .required()
                            .build(),
                    )
                    .attribute(string_set(
                        "default_tags",
                        "Tags added to objects created with this privilege",
                    ))
                    .attribute(string_set("functions", "Appliance functions, for Appliance targets"))
                    .block(
                        NestedBlockBuilder::single_list("scope")
                            .description("Objects the privilege is limited to")
                            .attribute(optional_bool("all", "Applies to every object"))
                            .attribute(string_set("ids", "Object IDs in scope"))
                            .attribute(string_set("tags", "Object tags in scope"))
                            .build(),
                    )
                    .build(),
            )
            .build()
    }

    fn collection<'a>(&self, client: &'a Client) -> Collection<'a, Self::Model> {
        client.administrative_roles()
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
        model.privileges = config.blocks("privileges").iter().map(privilege).collect();
        Ok(())
    }

    fn flatten(&self, _schema: &Schema, model: &Self::Model, _revision: ApiRevision) -> StateBuilder {
        let privileges = model
            .privileges
            .iter()
            .map(|p| {
                let scope = p.scope.as_ref().map(|s| {
                    StateBuilder::new()
                        .bool("all", s.all)
                        .set("ids", s.ids.iter().cloned())
                        .set("tags", s.tags.iter().cloned())
                });
                StateBuilder::new()
                    .string("type", &p.kind)
                    .string("target", &p.target)
                    .set("default_tags", p.default_tags.iter().cloned())
                    .set("functions", p.functions.iter().cloned())
                    .block("scope", scope)
            })
            .collect();

        base_state(&model.id, &model.name, model.notes.as_deref(), &model.tags).block_set(
            "privileges",
            privileges,
            &["target", "type"],
        )
    }
}
