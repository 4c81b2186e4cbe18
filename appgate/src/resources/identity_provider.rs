//! Identity provider resources, one per provider type
//!
//! LDAP providers name their user object through `object_class` on 5.5 and
//! through `user_filter` from 6.0 on. A configuration written for the old
//! peer keeps working: the class becomes `(objectclass=<class>)` when no
//! filter is declared.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tfplug::defaults::StaticDefault;
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType, NestedBlock, NestedBlockBuilder, NestingMode, Schema, SchemaBuilder};
use tfplug::types::{Diagnostic, Dynamic};
use tfplug::validators::{IntBetween, StringOneOf};
use tfplug::Context;

use super::codec::BlockCodec;
use super::common::{
    base_attributes, base_state, optional_bool, optional_number, optional_string, required_name,
    secret, string_list, string_set, tags,
};
use super::engine::{ManagedResource, Reconciler};
use super::state::{Attrs, StateBuilder};
use crate::api::identity_providers::{
    ClaimMapping, IdentityProvider, IdentityProviderKind, OnDemandClaimMapping,
};
use crate::api::{ApiError, ApiRevision, Client, Collection};

pub struct IdentityProviderReconciler {
    kind: IdentityProviderKind,
}

impl IdentityProviderReconciler {
    pub fn new(kind: IdentityProviderKind) -> Self {
        Self { kind }
    }

    fn is_ldap(&self) -> bool {
        matches!(
            self.kind,
            IdentityProviderKind::Ldap | IdentityProviderKind::LdapCertificate
        )
    }

    fn codec_names(&self) -> &'static [&'static str] {
        if self.is_ldap() {
            &["on_boarding_two_factor", "password_warning"]
        } else {
            &["on_boarding_two_factor"]
        }
    }
}

pub fn identity_provider(kind: IdentityProviderKind) -> ManagedResource<IdentityProviderReconciler> {
    ManagedResource::new(IdentityProviderReconciler::new(kind))
}

static CODEC: BlockCodec = BlockCodec::new(&[("on_boarding_two_factor", "onBoarding2FA")], &[]);

const COMMANDS: &[&str] = &[
    "fileSize",
    "fileExists",
    "fileCreated",
    "fileUpdated",
    "fileVersion",
    "fileSha512",
    "processRunning",
    "processList",
    "serviceRunning",
    "serviceList",
    "regExists",
    "regQuery",
    "runScript",
];

const PLATFORMS: &[&str] = &[
    "desktop.windows.all",
    "desktop.macos.all",
    "desktop.linux.all",
    "desktop.all",
    "mobile.android.all",
    "mobile.ios.all",
    "mobile.all",
    "all",
];

fn number_with_default(name: &str, description: &str, default: f64) -> Attribute {
    AttributeBuilder::new(name, AttributeType::Number)
        .description(description)
        .optional()
        .default(StaticDefault::number(default))
        .build()
}

fn common_attributes() -> Vec<Attribute> {
    vec![
        AttributeBuilder::new("admin_provider", AttributeType::Bool)
            .description("Whether admins sign in through this provider")
            .optional()
            .default(StaticDefault::bool(false))
            .build(),
        optional_string("on_boarding_type", "Require or Automatic device on-boarding"),
        optional_number(
            "inactivity_timeout_minutes",
            "Sign users out after this many idle minutes",
        ),
        optional_string("ip_pool_v4", "IPv4 pool handed to users"),
        optional_string("ip_pool_v6", "IPv6 pool handed to users"),
        string_set("dns_servers", "DNS servers pushed to the client"),
        string_set("dns_search_domains", "DNS search domains pushed to the client"),
        optional_bool(
            "block_local_dns_requests",
            "Block DNS requests to the local resolver",
        ),
        optional_number("device_limit_per_user", "Devices a user may register"),
    ]
}

fn common_blocks() -> Vec<NestedBlock> {
    vec![
        NestedBlockBuilder::single_list("on_boarding_two_factor")
            .description("Second factor asked when a new device on-boards")
            .attribute(
                AttributeBuilder::new("mfa_provider_id", AttributeType::String)
                    .required()
                    .build(),
            )
            .attribute(optional_string("message", "Message shown with the prompt"))
            .attribute(optional_string("claim_suffix", "Suffix of the claim set on success"))
            .attribute(optional_bool("always_required", "Ask on every sign-in"))
            .attribute(optional_number("device_limit_per_user", "Devices a user may register"))
            .build(),
        NestedBlockBuilder::new("claim_mappings", NestingMode::Set)
            .description("Provider attributes exposed as user claims")
            .attribute(
                AttributeBuilder::new("attribute_name", AttributeType::String)
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("claim_name", AttributeType::String)
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("list", AttributeType::Bool)
                    .optional()
                    .default(StaticDefault::bool(false))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("encrypt", AttributeType::Bool)
                    .optional()
                    .default(StaticDefault::bool(false))
                    .build(),
            )
            .build(),
        NestedBlockBuilder::new("on_demand_claim_mappings", NestingMode::Set)
            .description("Claims computed on the client device")
            .attribute(
                AttributeBuilder::new("command", AttributeType::String)
                    .required()
                    .validator(StringOneOf::create(COMMANDS))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("claim_name", AttributeType::String)
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("platform", AttributeType::String)
                    .required()
                    .validator(StringOneOf::create(PLATFORMS))
                    .build(),
            )
            .block(
                NestedBlockBuilder::single_list("parameters")
                    .attribute(optional_string("name", "Name of the file, process or service"))
                    .attribute(optional_string("path", "Path of the file or registry key"))
                    .attribute(optional_string("args", "Arguments of the script"))
                    .build(),
            )
            .build(),
    ]
}

fn ldap_attributes() -> Vec<Attribute> {
    vec![
        AttributeBuilder::new("hostnames", AttributeType::list_of(AttributeType::String))
            .description("LDAP servers, tried in order")
            .required()
            .build(),
        number_with_default("port", "LDAP port", 389.0),
        AttributeBuilder::new("ssl_enabled", AttributeType::Bool)
            .description("Use LDAPS")
            .optional()
            .default(StaticDefault::bool(false))
            .build(),
        AttributeBuilder::new("admin_distinguished_name", AttributeType::String)
            .description("Bind DN used for lookups")
            .required()
            .build(),
        secret("admin_password", "Password of the bind DN"),
        optional_string("base_dn", "Where user lookups start"),
        optional_string("object_class", "Object class of users, for 5.5 collectives"),
        AttributeBuilder::new("user_filter", AttributeType::String)
            .description("LDAP filter selecting users")
            .optional()
            .computed()
            .build(),
        AttributeBuilder::new("username_attribute", AttributeType::String)
            .description("Attribute holding the username")
            .optional()
            .default(StaticDefault::string("sAMAccountName"))
            .build(),
        AttributeBuilder::new("membership_filter", AttributeType::String)
            .description("LDAP filter selecting groups")
            .optional()
            .default(StaticDefault::string("(objectCategory=group)"))
            .build(),
        optional_string("membership_base_dn", "Where group lookups start"),
    ]
}

fn password_warning() -> NestedBlock {
    NestedBlockBuilder::single_list("password_warning")
        .description("Warn users before their password expires")
        .attribute(optional_bool("enabled", "Whether the warning is shown"))
        .attribute(optional_number("threshold_days", "Days before expiry"))
        .attribute(optional_string("message", "Warning text"))
        .build()
}

fn ldap_from(config: &Attrs<'_>, revision: ApiRevision, model: &mut IdentityProvider) {
    model.hostnames = config.strings("hostnames");
    model.port = config.int("port");
    model.ssl_enabled = config.bool("ssl_enabled");
    model.admin_distinguished_name = config.string("admin_distinguished_name");
    if let Some(password) = config.non_empty_string("admin_password") {
        model.admin_password = Some(password);
    }
    model.base_dn = config.non_empty_string("base_dn");
    model.object_class = config.non_empty_string("object_class");
    model.user_filter = config.non_empty_string("user_filter");
    if revision >= ApiRevision::V16 && model.user_filter.is_none() {
        model.user_filter = model
            .object_class
            .as_ref()
            .map(|class| format!("(objectclass={})", class));
    }
    model.username_attribute = config.string("username_attribute");
    model.membership_filter = config.string("membership_filter");
    model.membership_base_dn = config.non_empty_string("membership_base_dn");
}

fn ldap_state(model: &IdentityProvider, state: StateBuilder) -> StateBuilder {
    state
        .list("hostnames", model.hostnames.iter().cloned())
        .opt_int("port", model.port)
        .opt_bool("ssl_enabled", model.ssl_enabled)
        .opt_string("admin_distinguished_name", model.admin_distinguished_name.clone())
        .opt_string("base_dn", model.base_dn.clone())
        .opt_string("object_class", model.object_class.clone())
        .opt_string("user_filter", model.user_filter.clone())
        .opt_string("username_attribute", model.username_attribute.clone())
        .opt_string("membership_filter", model.membership_filter.clone())
        .opt_string("membership_base_dn", model.membership_base_dn.clone())
}

fn parameters_to_wire(block: Option<Attrs<'_>>) -> Option<Value> {
    let block = block?;
    let mut out = Map::new();
    for key in ["name", "path", "args"] {
        if let Some(value) = block.non_empty_string(key) {
            out.insert(key.to_string(), Value::String(value));
        }
    }
    (!out.is_empty()).then_some(Value::Object(out))
}

fn parameters_state(parameters: Option<&Value>) -> Option<StateBuilder> {
    let object = parameters?.as_object()?;
    let field = |key: &str| object.get(key).and_then(Value::as_str).map(str::to_string);
    Some(
        StateBuilder::new()
            .opt_string("name", field("name"))
            .opt_string("path", field("path"))
            .opt_string("args", field("args")),
    )
}

#[async_trait]
impl Reconciler for IdentityProviderReconciler {
    type Model = IdentityProvider;

    fn type_name(&self) -> &'static str {
        match self.kind {
            IdentityProviderKind::LocalDatabase => "appgate_local_database_identity_provider",
            IdentityProviderKind::Ldap => "appgate_ldap_identity_provider",
            IdentityProviderKind::LdapCertificate => "appgate_ldap_certificate_identity_provider",
            IdentityProviderKind::Radius => "appgate_radius_identity_provider",
            IdentityProviderKind::Oidc => "appgate_oidc_identity_provider",
            IdentityProviderKind::Connector => "appgate_connector_identity_provider",
        }
    }

    fn schema(&self) -> Schema {
        let builder = SchemaBuilder::new()
            .description(&format!("{} identity provider", self.kind))
            .attributes(base_attributes("identity provider"))
            .attributes(common_attributes())
            .blocks(common_blocks());

        let builder = match self.kind {
            IdentityProviderKind::LocalDatabase => builder
                .attribute(number_with_default(
                    "user_lockout_threshold",
                    "Failed sign-ins before the account locks",
                    5.0,
                ))
                .attribute(number_with_default(
                    "user_lockout_duration_minutes",
                    "Minutes an account stays locked",
                    1.0,
                ))
                .attribute(
                    AttributeBuilder::new("min_password_length", AttributeType::Number)
                        .description("Shortest password accepted")
                        .optional()
                        .default(StaticDefault::number(0.0))
                        .validator(IntBetween::create(0, 1024))
                        .build(),
                ),
            IdentityProviderKind::Ldap => builder
                .attributes(ldap_attributes())
                .block(password_warning()),
            IdentityProviderKind::LdapCertificate => builder
                .attributes(ldap_attributes())
                .block(password_warning())
                .attribute(optional_string(
                    "certificate_user_attribute",
                    "Certificate field matched against the username",
                ))
                .attribute(string_list("ca_certificates", "PEM CA certificates"))
                .attribute(optional_bool(
                    "skip_x509_external_checks",
                    "Skip revocation checks of client certificates",
                )),
            IdentityProviderKind::Radius => builder
                .attribute(
                    AttributeBuilder::new("hostnames", AttributeType::list_of(AttributeType::String))
                        .description("RADIUS servers, tried in order")
                        .required()
                        .build(),
                )
                .attribute(number_with_default("port", "RADIUS port", 1812.0))
                .attribute(secret("shared_secret", "RADIUS shared secret"))
                .attribute(
                    AttributeBuilder::new("authentication_protocol", AttributeType::String)
                        .description("RADIUS authentication protocol")
                        .optional()
                        .default(StaticDefault::string("CHAP"))
                        .validator(StringOneOf::create(&["PAP", "CHAP"]))
                        .build(),
                ),
            IdentityProviderKind::Oidc => builder
                .attribute(
                    AttributeBuilder::new("issuer", AttributeType::String)
                        .description("OIDC issuer URL")
                        .required()
                        .build(),
                )
                .attribute(
                    AttributeBuilder::new("audience", AttributeType::String)
                        .description("Client ID registered at the issuer")
                        .required()
                        .build(),
                )
                .attribute(optional_string("scope", "Extra scopes requested"))
                .attribute(optional_bool("google", "Issuer is Google")),
            IdentityProviderKind::Connector => builder,
        };
        builder.build()
    }

    fn min_revision(&self) -> ApiRevision {
        self.kind.min_revision()
    }

    fn collection<'a>(&self, client: &'a Client) -> Collection<'a, Self::Model> {
        client.identity_providers()
    }

    fn expand(
        &self,
        schema: &Schema,
        planned: &Dynamic,
        revision: ApiRevision,
        model: &mut Self::Model,
    ) -> Result<(), Diagnostic> {
        let config = Attrs::new(planned);
        model.kind = self.kind;
        model.name = required_name(&config)?;
        model.notes = config.string("notes");
        model.tags = tags(&config);

        model.admin_provider = config.bool("admin_provider");
        model.on_boarding_type = config.non_empty_string("on_boarding_type");
        model.inactivity_timeout_minutes = config.int("inactivity_timeout_minutes");
        model.ip_pool_v4 = config.non_empty_string("ip_pool_v4");
        model.ip_pool_v6 = config.non_empty_string("ip_pool_v6");
        model.dns_servers = config.string_set("dns_servers");
        model.dns_search_domains = config.string_set("dns_search_domains");
        model.block_local_dns_requests = config.bool("block_local_dns_requests");
        model.device_limit_per_user = config.int("device_limit_per_user");
        model.claim_mappings = config
            .blocks("claim_mappings")
            .iter()
            .map(|m| ClaimMapping {
                attribute_name: m.string("attribute_name").unwrap_or_default(),
                claim_name: m.string("claim_name").unwrap_or_default(),
                list: m.bool("list").unwrap_or(false),
                encrypt: m.bool("encrypt").unwrap_or(false),
            })
            .collect();
        model.on_demand_claim_mappings = config
            .blocks("on_demand_claim_mappings")
            .iter()
            .map(|m| OnDemandClaimMapping {
                command: m.string("command").unwrap_or_default(),
                claim_name: m.string("claim_name").unwrap_or_default(),
                parameters: parameters_to_wire(m.block("parameters")),
                platform: m.string("platform").unwrap_or_default(),
            })
            .collect();

        match self.kind {
            IdentityProviderKind::LocalDatabase => {
                model.user_lockout_threshold = config.int("user_lockout_threshold");
                model.user_lockout_duration_minutes = config.int("user_lockout_duration_minutes");
                model.min_password_length = config.int("min_password_length");
            }
            IdentityProviderKind::Ldap => ldap_from(&config, revision, model),
            IdentityProviderKind::LdapCertificate => {
                ldap_from(&config, revision, model);
                model.certificate_user_attribute =
                    config.non_empty_string("certificate_user_attribute");
                model.ca_certificates = config.strings("ca_certificates");
                model.skip_x509_external_checks = config.bool("skip_x509_external_checks");
            }
            IdentityProviderKind::Radius => {
                model.hostnames = config.strings("hostnames");
                model.port = config.int("port");
                if let Some(secret) = config.non_empty_string("shared_secret") {
                    model.shared_secret = Some(secret);
                }
                model.authentication_protocol = config.string("authentication_protocol");
            }
            IdentityProviderKind::Oidc => {
                model.issuer = config.string("issuer");
                model.audience = config.string("audience");
                model.scope = config.non_empty_string("scope");
                model.google = config.bool("google");
            }
            IdentityProviderKind::Connector => {}
        }

        CODEC.encode(schema, self.codec_names(), planned, &mut model.extra);
        Ok(())
    }

    fn flatten(&self, schema: &Schema, model: &Self::Model, _revision: ApiRevision) -> StateBuilder {
        let claims = model
            .claim_mappings
            .iter()
            .map(|m| {
                StateBuilder::new()
                    .string("attribute_name", &m.attribute_name)
                    .string("claim_name", &m.claim_name)
                    .bool("list", m.list)
                    .bool("encrypt", m.encrypt)
            })
            .collect();
        let on_demand = model
            .on_demand_claim_mappings
            .iter()
            .map(|m| {
                StateBuilder::new()
                    .string("command", &m.command)
                    .string("claim_name", &m.claim_name)
                    .string("platform", &m.platform)
                    .block("parameters", parameters_state(m.parameters.as_ref()))
            })
            .collect();

        let state = base_state(&model.id, &model.name, model.notes.as_deref(), &model.tags)
            .opt_bool("admin_provider", model.admin_provider)
            .opt_string("on_boarding_type", model.on_boarding_type.clone())
            .opt_int("inactivity_timeout_minutes", model.inactivity_timeout_minutes)
            .opt_string("ip_pool_v4", model.ip_pool_v4.clone())
            .opt_string("ip_pool_v6", model.ip_pool_v6.clone())
            .set("dns_servers", model.dns_servers.iter().cloned())
            .set("dns_search_domains", model.dns_search_domains.iter().cloned())
            .opt_bool("block_local_dns_requests", model.block_local_dns_requests)
            .opt_int("device_limit_per_user", model.device_limit_per_user)
            .block_set("claim_mappings", claims, &["claim_name"])
            .block_set("on_demand_claim_mappings", on_demand, &["claim_name"]);

        let state = match self.kind {
            IdentityProviderKind::LocalDatabase => state
                .opt_int("user_lockout_threshold", model.user_lockout_threshold)
                .opt_int(
                    "user_lockout_duration_minutes",
                    model.user_lockout_duration_minutes,
                )
                .opt_int("min_password_length", model.min_password_length),
            IdentityProviderKind::Ldap => ldap_state(model, state),
            IdentityProviderKind::LdapCertificate => ldap_state(model, state)
                .opt_string(
                    "certificate_user_attribute",
                    model.certificate_user_attribute.clone(),
                )
                .list("ca_certificates", model.ca_certificates.iter().cloned())
                .opt_bool("skip_x509_external_checks", model.skip_x509_external_checks),
            IdentityProviderKind::Radius => state
                .list("hostnames", model.hostnames.iter().cloned())
                .opt_int("port", model.port)
                .opt_string("authentication_protocol", model.authentication_protocol.clone()),
            IdentityProviderKind::Oidc => state
                .opt_string("issuer", model.issuer.clone())
                .opt_string("audience", model.audience.clone())
                .opt_string("scope", model.scope.clone())
                .opt_bool("google", model.google),
            IdentityProviderKind::Connector => state,
        };

        CODEC.decode(schema, self.codec_names(), &model.extra, state)
    }

    /// Newer peers drop `object_class`; the declared class stays in state
    async fn after_read(
        &self,
        _ctx: &Context,
        _client: &Client,
        model: &Self::Model,
        prior: &Dynamic,
        state: StateBuilder,
    ) -> Result<StateBuilder, ApiError> {
        if !self.is_ldap() || model.object_class.is_some() {
            return Ok(state);
        }
        Ok(state.opt_string("object_class", Attrs::new(prior).non_empty_string("object_class")))
    }
}

#[cfg(test)]
#[path = "./identity_provider_test.rs"]
mod identity_provider_test;
