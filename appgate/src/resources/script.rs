//! Criteria, entitlement, user claim and device scripts

use std::marker::PhantomData;
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{Diagnostic, Dynamic};
use tfplug::validators::StringOneOf;

use super::common::{base_attributes, base_state, required_name, secret, tags};
use super::engine::{ManagedResource, Reconciler};
use super::state::{Attrs, StateBuilder};
use crate::api::scripts::{
    Criteria, DeviceScript, EntitlementScriptKind, ExpressionScript, ScriptKind, UserClaim,
};
use crate::api::{ApiRevision, Client, Collection};

/// Scripts that hold a JavaScript expression
pub struct ExpressionScriptReconciler<K: ScriptKind> {
    type_name: &'static str,
    description: &'static str,
    /// Entitlement scripts also carry a `type`
    typed: bool,
    _kind: PhantomData<K>,
}

pub fn criteria_script() -> ManagedResource<ExpressionScriptReconciler<Criteria>> {
    ManagedResource::new(ExpressionScriptReconciler {
        type_name: "appgate_criteria_script",
        description: "Criteria script evaluated against user claims",
        typed: false,
        _kind: PhantomData,
    })
}

pub fn entitlement_script() -> ManagedResource<ExpressionScriptReconciler<EntitlementScriptKind>> {
    ManagedResource::new(ExpressionScriptReconciler {
        type_name: "appgate_entitlement_script",
        description: "Script that computes entitlement hosts, ports or app shortcuts",
        typed: true,
        _kind: PhantomData,
    })
}

pub fn user_claim_script() -> ManagedResource<ExpressionScriptReconciler<UserClaim>> {
    ManagedResource::new(ExpressionScriptReconciler {
        type_name: "appgate_user_claim_script",
        description: "Script that computes additional user claims",
        typed: false,
        _kind: PhantomData,
    })
}

impl<K: ScriptKind> Reconciler for ExpressionScriptReconciler<K> {
    type Model = ExpressionScript<K>;

    fn type_name(&self) -> &'static str {
        self.type_name
    }

    fn schema(&self) -> Schema {
        let mut builder = SchemaBuilder::new()
            .description(self.description)
            .attributes(base_attributes("script"))
            .attribute(
                AttributeBuilder::new("expression", AttributeType::String)
                    .description("A JavaScript expression that returns a result")
                    .required()
                    .build(),
            );
        if self.typed {
            builder = builder.attribute(
                AttributeBuilder::new("type", AttributeType::String)
                    .description("What the script computes")
                    .required()
                    .validator(StringOneOf::create(&["host", "portOrType", "appShortcut"]))
                    .build(),
            );
        }
        builder.build()
    }

    fn collection<'a>(&self, client: &'a Client) -> Collection<'a, Self::Model> {
        client.expression_scripts()
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
        model.expression = config.string("expression").ok_or_else(|| {
            Diagnostic::error("Missing expression", "The 'expression' attribute is required")
        })?;
        if self.typed {
            model.script_type = config.string("type");
        }
        Ok(())
    }

    fn flatten(&self, _schema: &Schema, model: &Self::Model, _revision: ApiRevision) -> StateBuilder {
        let state = base_state(&model.id, &model.name, model.notes.as_deref(), &model.tags)
            .string("expression", &model.expression);
        if self.typed {
            state.opt_string("type", model.script_type.clone())
        } else {
            state
        }
    }
}

/// Files pushed to clients to compute device claims
pub struct DeviceScriptReconciler;

pub fn device_script() -> ManagedResource<DeviceScriptReconciler> {
    ManagedResource::new(DeviceScriptReconciler)
}

impl Reconciler for DeviceScriptReconciler {
    type Model = DeviceScript;

    fn type_name(&self) -> &'static str {
        "appgate_device_script"
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new()
            .description("Script file distributed to clients for device claims")
            .attributes(base_attributes("device script"))
            .attribute(
                AttributeBuilder::new("filename", AttributeType::String)
                    .description("Name the file is stored under on the client")
                    .required()
                    .build(),
            )
            .attribute(secret("file", "Base64 encoded file content"))
            .attribute(
                AttributeBuilder::new("checksum", AttributeType::String)
                    .description("SHA256 checksum of the file")
                    .computed()
                    .build(),
            )
            .build()
    }

    fn collection<'a>(&self, client: &'a Client) -> Collection<'a, Self::Model> {
        client.device_scripts()
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
        model.filename = config.string("filename").unwrap_or_default();
        model.file = config.string("file");
        Ok(())
    }

    fn flatten(&self, _schema: &Schema, model: &Self::Model, _revision: ApiRevision) -> StateBuilder {
        base_state(&model.id, &model.name, model.notes.as_deref(), &model.tags)
            .string("filename", &model.filename)
            .raw("file", Dynamic::Null)
            .opt_string("checksum", model.checksum.clone())
    }
}

#[cfg(test)]
#[path = "./script_test.rs"]
mod script_test;
