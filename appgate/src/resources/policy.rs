//! The four policy resources
//!
//! Every policy type lives in `/policies` and shares name, expression and
//! override site. The type picks which mix-in attributes and settings blocks
//! the schema carries; settings blocks travel through the block codec.

use tfplug::defaults::StaticDefault;
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType, NestedBlock, NestedBlockBuilder, NestingMode, Schema, SchemaBuilder};
use tfplug::types::{Diagnostic, Dynamic};
use tfplug::validators::StringOneOf;

use super::codec::BlockCodec;
use super::common::{
    base_attributes, base_state, optional_bool, optional_string, required_name, string_set, tags,
};
use super::engine::{ManagedResource, Reconciler};
use super::state::{Attrs, StateBuilder};
use crate::api::policies::{Policy, PolicyKind};
use crate::api::{ApiRevision, Client, Collection};

pub struct PolicyReconciler {
    kind: PolicyKind,
}

pub fn access_policy() -> ManagedResource<PolicyReconciler> {
    ManagedResource::new(PolicyReconciler {
        kind: PolicyKind::Access,
    })
}

pub fn device_policy() -> ManagedResource<PolicyReconciler> {
    ManagedResource::new(PolicyReconciler {
        kind: PolicyKind::Device,
    })
}

pub fn dhcp_policy() -> ManagedResource<PolicyReconciler> {
    ManagedResource::new(PolicyReconciler {
        kind: PolicyKind::Dhcp,
    })
}

pub fn admin_policy() -> ManagedResource<PolicyReconciler> {
    ManagedResource::new(PolicyReconciler {
        kind: PolicyKind::Admin,
    })
}

static CODEC: BlockCodec = BlockCodec::PLAIN;

const ATTENTION_LEVELS: &[&str] = &["Low", "Medium", "High"];

const SHOW_OR_HIDE: &[&str] = &["Show", "Hide"];

fn show_or_hide(name: &str, description: &str) -> Attribute {
    AttributeBuilder::new(name, AttributeType::String)
        .description(description)
        .optional()
        .validator(StringOneOf::create(SHOW_OR_HIDE))
        .build()
}

fn enabled() -> Attribute {
    AttributeBuilder::new("enabled", AttributeType::Bool)
        .description("Whether the settings apply")
        .optional()
        .default(StaticDefault::bool(false))
        .build()
}

fn proxy_auto_config() -> NestedBlock {
    NestedBlockBuilder::single_list("proxy_auto_config")
        .description("PAC file pushed to clients")
        .attribute(enabled())
        .attribute(optional_string("url", "Location of the PAC file"))
        .attribute(optional_bool("persist", "Keep the PAC file after sign-out"))
        .build()
}

fn trusted_network_check() -> NestedBlock {
    NestedBlockBuilder::single_list("trusted_network_check")
        .description("Stop tunnels on trusted networks")
        .attribute(enabled())
        .attribute(optional_string("dns_suffix", "DNS suffix of the trusted network"))
        .build()
}

fn client_settings() -> NestedBlock {
    NestedBlockBuilder::single_list("client_settings")
        .description("Client UI settings")
        .attribute(enabled())
        .attribute(show_or_hide("entitlements_list", "Entitlement list in the client"))
        .attribute(
            AttributeBuilder::new("attention_level", AttributeType::String)
                .optional()
                .validator(StringOneOf::create(ATTENTION_LEVELS))
                .build(),
        )
        .attribute(show_or_hide("auto_start", "Start client on login"))
        .attribute(show_or_hide("add_remove_profiles", "Profile management menu"))
        .attribute(show_or_hide("keep_me_signed_in", "Keep me signed in option"))
        .attribute(show_or_hide("saml_auto_sign_in", "SAML automatic sign-in"))
        .attribute(show_or_hide("quit", "Quit menu item"))
        .attribute(show_or_hide("sign_out", "Sign out menu item"))
        .attribute(show_or_hide("suspend", "Suspend menu item"))
        .build()
}

fn client_profile_settings() -> NestedBlock {
    NestedBlockBuilder::single_list("client_profile_settings")
        .description("Client profiles added to matching clients")
        .attribute(enabled())
        .attribute(string_set("profiles", "Client profile names"))
        .build()
}

fn device_settings() -> NestedBlock {
    NestedBlockBuilder::single_list("device_settings")
        .description("Settings enforced on matching devices")
        .attribute(optional_bool("tamper_proofing", "Protect the client from being stopped"))
        .block(proxy_auto_config())
        .block(trusted_network_check())
        .block(
            NestedBlockBuilder::new("dns_settings", NestingMode::Set)
                .description("Per-domain DNS servers")
                .attribute(
                    AttributeBuilder::new("domain", AttributeType::String)
                        .required()
                        .build(),
                )
                .attribute(string_set("servers", "DNS servers for the domain"))
                .build(),
        )
        .build()
}

fn dhcp_settings() -> NestedBlock {
    NestedBlockBuilder::single_list("dhcp_settings")
        .description("DHCP options relayed to clients")
        .attribute(enabled())
        .attribute(optional_bool("dns", "Relay DNS servers"))
        .attribute(optional_bool("routers", "Relay routers"))
        .attribute(optional_bool("domain_name", "Relay the domain name"))
        .attribute(optional_bool("ntp", "Relay NTP servers"))
        .attribute(optional_bool("mtu", "Relay the MTU"))
        .build()
}

impl PolicyReconciler {
    /// Settings blocks and untyped attributes carried in the peer object's
    /// extra fields
    fn settings(&self) -> &'static [&'static str] {
        match self.kind {
            PolicyKind::Access => &[
                "tamper_proofing",
                "proxy_auto_config",
                "trusted_network_check",
                "client_settings",
                "client_profile_settings",
            ],
            PolicyKind::Device => &["device_settings"],
            PolicyKind::Dhcp => &["dhcp_settings"],
            PolicyKind::Admin => &[],
        }
    }
}

impl Reconciler for PolicyReconciler {
    type Model = Policy;

    fn type_name(&self) -> &'static str {
        match self.kind {
            PolicyKind::Access => "appgate_policy",
            PolicyKind::Device => "appgate_device_policy",
            PolicyKind::Dhcp => "appgate_dhcp_policy",
            PolicyKind::Admin => "appgate_admin_policy",
        }
    }

    fn schema(&self) -> Schema {
        let mut builder = SchemaBuilder::new()
            .description(&format!("Policy of type {}", self.kind))
            .attributes(base_attributes("policy"))
            .attribute(
                AttributeBuilder::new("disabled", AttributeType::Bool)
                    .description("Whether the policy is turned off")
                    .optional()
                    .default(StaticDefault::bool(false))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("expression", AttributeType::String)
                    .description("JavaScript deciding whether the policy applies")
                    .required()
                    .build(),
            )
            .attribute(optional_string(
                "override_site",
                "Site that takes over from the one chosen by the client",
            ));

        builder = match self.kind {
            PolicyKind::Access => builder
                .attribute(string_set("entitlements", "IDs of the entitlements"))
                .attribute(string_set("entitlement_links", "Tags of linked entitlements"))
                .attribute(string_set("ringfence_rules", "IDs of the ringfence rules"))
                .attribute(string_set("ringfence_rule_links", "Tags of linked ringfence rules"))
                .attribute(optional_bool(
                    "tamper_proofing",
                    "Protect the client from being stopped",
                ))
                .block(proxy_auto_config())
                .block(trusted_network_check())
                .block(client_settings())
                .block(client_profile_settings()),
            PolicyKind::Device => builder.block(device_settings()),
            PolicyKind::Dhcp => builder.block(dhcp_settings()),
            PolicyKind::Admin => builder.attribute(string_set(
                "administrative_roles",
                "IDs of the administrative roles",
            )),
        };
        builder.build()
    }

    fn min_revision(&self) -> ApiRevision {
        self.kind.min_revision()
    }

    fn collection<'a>(&self, client: &'a Client) -> Collection<'a, Self::Model> {
        client.policies()
    }

    fn expand(
        &self,
        schema: &Schema,
        planned: &Dynamic,
        _revision: ApiRevision,
        model: &mut Self::Model,
    ) -> Result<(), Diagnostic> {
        let config = Attrs::new(planned);
        model.kind = self.kind;
        model.name = required_name(&config)?;
        model.notes = config.string("notes");
        model.tags = tags(&config);
        model.disabled = config.bool("disabled").unwrap_or(false);
        model.expression = config.string("expression").unwrap_or_default();
        model.override_site = config.non_empty_string("override_site");

        match self.kind {
            PolicyKind::Access => {
                model.entitlements = config.string_set("entitlements");
                model.entitlement_links = config.string_set("entitlement_links");
                model.ringfence_rules = config.string_set("ringfence_rules");
                model.ringfence_rule_links = config.string_set("ringfence_rule_links");
            }
            PolicyKind::Admin => {
                model.administrative_roles = config.strings("administrative_roles");
            }
            PolicyKind::Device | PolicyKind::Dhcp => {}
        }

        CODEC.encode(schema, self.settings(), planned, &mut model.extra);
        Ok(())
    }

    fn flatten(&self, schema: &Schema, model: &Self::Model, _revision: ApiRevision) -> StateBuilder {
        let mut state = base_state(&model.id, &model.name, model.notes.as_deref(), &model.tags)
            .bool("disabled", model.disabled)
            .string("expression", &model.expression)
            .opt_string("override_site", model.override_site.clone());

        state = match self.kind {
            PolicyKind::Access => state
                .set("entitlements", model.entitlements.iter().cloned())
                .set("entitlement_links", model.entitlement_links.iter().cloned())
                .set("ringfence_rules", model.ringfence_rules.iter().cloned())
                .set("ringfence_rule_links", model.ringfence_rule_links.iter().cloned()),
            PolicyKind::Admin => {
                state.set("administrative_roles", model.administrative_roles.iter().cloned())
            }
            PolicyKind::Device | PolicyKind::Dhcp => state,
        };

        CODEC.decode(schema, self.settings(), &model.extra, state)
    }
}

#[cfg(test)]
#[path = "./policy_test.rs"]
mod policy_test;
