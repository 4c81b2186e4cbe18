//! Appliances
//!
//! Most of an appliance is nested configuration that the block codec moves
//! between state and the peer object. An appliance that has not been
//! activated yet gets a seed exported once and kept in `seed_file`;
//! deleting an activated appliance deactivates and wipes it first.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
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
use crate::api::appliances::{Appliance, SeedRequest};
use crate::api::{ApiError, ApiRevision, Client, Collection};

pub struct ApplianceReconciler;

pub fn appliance() -> ManagedResource<ApplianceReconciler> {
    ManagedResource::new(ApplianceReconciler)
}

const BLOCKS: &[&str] = &[
    "client_interface",
    "peer_interface",
    "admin_interface",
    "networking",
    "ntp",
    "ssh_server",
    "snmp_server",
    "healthcheck_server",
    "prometheus_exporter",
    "ping",
    "log_server",
    "log_forwarder",
    "metrics_aggregator",
    "gateway",
    "controller",
    "connector",
    "portal",
    "rsyslog_destinations",
];

static CODEC: BlockCodec = BlockCodec::new(
    &[("aws_kinesis", "awsKineses")],
    &[
        ("allow_sources", &["address", "nic"]),
        ("hosts", &["hostname"]),
        ("tcp_clients", &["name"]),
    ],
);

const NTP_KEY_TYPES: &[&str] = &["MD5", "SHA", "SHA1", "SHA256", "SHA512", "RMD160"];

fn required(name: &str, kind: AttributeType) -> Attribute {
    AttributeBuilder::new(name, kind).required().build()
}

fn port(name: &str, description: &str, default: f64) -> Attribute {
    AttributeBuilder::new(name, AttributeType::Number)
        .description(description)
        .optional()
        .default(StaticDefault::number(default))
        .validator(IntBetween::create(1, 65535))
        .build()
}

fn enabled() -> Attribute {
    AttributeBuilder::new("enabled", AttributeType::Bool)
        .optional()
        .default(StaticDefault::bool(false))
        .build()
}

fn allow_sources() -> NestedBlock {
    NestedBlockBuilder::new("allow_sources", NestingMode::Set)
        .description("Source networks allowed to connect")
        .attribute(required("address", AttributeType::String))
        .attribute(optional_number("netmask", "Prefix length"))
        .attribute(optional_string("nic", "Interface the rule applies to"))
        .build()
}

/// PKCS#12 bundle; the peer returns only the subject
fn p12(name: &str) -> NestedBlock {
    NestedBlockBuilder::single_list(name)
        .attribute(optional_string("id", "ID of the bundle"))
        .attribute(secret("content", "PKCS#12 content, base64"))
        .attribute(secret("password", "Password of the bundle"))
        .attribute(
            AttributeBuilder::new("subject_name", AttributeType::String)
                .computed()
                .build(),
        )
        .build()
}

fn client_interface() -> NestedBlock {
    NestedBlockBuilder::new("client_interface", NestingMode::Single)
        .description("Interface clients and SPA packets arrive on")
        .required()
        .attribute(optional_bool("proxy_protocol", "Expect PROXY protocol headers"))
        .attribute(required("hostname", AttributeType::String))
        .attribute(port("https_port", "HTTPS port", 443.0))
        .attribute(port("dtls_port", "DTLS port", 443.0))
        .attribute(
            AttributeBuilder::new("override_spa_mode", AttributeType::String)
                .description("SPA mode of this appliance")
                .optional()
                .validator(StringOneOf::create(&["Disabled", "TCP", "UDP-TCP"]))
                .build(),
        )
        .block(allow_sources())
        .build()
}

fn peer_interface() -> NestedBlock {
    NestedBlockBuilder::single_list("peer_interface")
        .description("Interface other appliances connect to")
        .attribute(required("hostname", AttributeType::String))
        .attribute(port("https_port", "HTTPS port", 444.0))
        .block(allow_sources())
        .build()
}

fn admin_interface() -> NestedBlock {
    NestedBlockBuilder::single_list("admin_interface")
        .description("Interface of the admin UI and API")
        .attribute(required("hostname", AttributeType::String))
        .attribute(port("https_port", "HTTPS port", 8443.0))
        .attribute(string_list("https_ciphers", "Allowed TLS ciphers"))
        .block(allow_sources())
        .build()
}

fn ip_config(name: &str) -> NestedBlock {
    NestedBlockBuilder::single_list(name)
        .block(
            NestedBlockBuilder::single_list("dhcp")
                .attribute(enabled())
                .attribute(optional_bool("dns", "Take DNS servers from DHCP"))
                .attribute(optional_bool("routers", "Take routes from DHCP"))
                .attribute(optional_bool("ntp", "Take NTP servers from DHCP"))
                .attribute(optional_bool("mtu", "Take the MTU from DHCP"))
                .build(),
        )
        .block(
            NestedBlockBuilder::new("static", NestingMode::Set)
                .attribute(required("address", AttributeType::String))
                .attribute(required("netmask", AttributeType::Number))
                .attribute(optional_string("hostname", "Hostname of the address"))
                .attribute(optional_bool("snat", "Source NAT through this address"))
                .build(),
        )
        .attribute(optional_string("virtual_ip", "Shared address of an HA pair"))
        .build()
}

fn networking() -> NestedBlock {
    NestedBlockBuilder::single_list("networking")
        .description("Interfaces, routes and name resolution of the appliance")
        .attribute(string_list("dns_servers", "DNS servers"))
        .attribute(string_list("dns_domains", "DNS search domains"))
        .block(
            NestedBlockBuilder::new("hosts", NestingMode::Set)
                .description("Entries of /etc/hosts")
                .attribute(required("hostname", AttributeType::String))
                .attribute(required("address", AttributeType::String))
                .build(),
        )
        .block(
            NestedBlockBuilder::new("nics", NestingMode::List)
                .attribute(enabled())
                .attribute(required("name", AttributeType::String))
                .attribute(optional_number("mtu", "MTU of the interface"))
                .block(ip_config("ipv4"))
                .block(ip_config("ipv6"))
                .build(),
        )
        .block(
            NestedBlockBuilder::new("routes", NestingMode::Set)
                .attribute(required("address", AttributeType::String))
                .attribute(required("netmask", AttributeType::Number))
                .attribute(optional_string("gateway", "Next hop"))
                .attribute(optional_string("nic", "Outgoing interface"))
                .build(),
        )
        .build()
}

fn ntp() -> NestedBlock {
    NestedBlockBuilder::single_list("ntp")
        .block(
            NestedBlockBuilder::new("servers", NestingMode::Set)
                .attribute(required("hostname", AttributeType::String))
                .attribute(
                    AttributeBuilder::new("key_type", AttributeType::String)
                        .optional()
                        .validator(StringOneOf::create(NTP_KEY_TYPES))
                        .build(),
                )
                .attribute(secret("key", "NTP key"))
                .build(),
        )
        .build()
}

fn ssh_server() -> NestedBlock {
    NestedBlockBuilder::single_list("ssh_server")
        .attribute(enabled())
        .attribute(port("port", "SSH port", 22.0))
        .attribute(optional_bool("password_authentication", "Allow password logins"))
        .block(allow_sources())
        .build()
}

fn snmp_server() -> NestedBlock {
    NestedBlockBuilder::single_list("snmp_server")
        .attribute(enabled())
        .attribute(optional_number("tcp_port", "SNMP TCP port"))
        .attribute(optional_number("udp_port", "SNMP UDP port"))
        .attribute(optional_string("snmpd_conf", "Raw snmpd.conf"))
        .block(allow_sources())
        .build()
}

fn healthcheck_server() -> NestedBlock {
    NestedBlockBuilder::single_list("healthcheck_server")
        .attribute(enabled())
        .attribute(port("port", "Health check port", 5555.0))
        .block(allow_sources())
        .build()
}

fn prometheus_exporter() -> NestedBlock {
    NestedBlockBuilder::single_list("prometheus_exporter")
        .attribute(enabled())
        .attribute(port("port", "Exporter port", 5556.0))
        .attribute(optional_bool("use_https", "Serve metrics over HTTPS"))
        .attribute(optional_bool("basic_auth", "Require basic authentication"))
        .attribute(string_list("labels_disabled", "Labels left out of the metrics"))
        .block(p12("https_p12"))
        .block(
            NestedBlockBuilder::new("allowed_users", NestingMode::Set)
                .attribute(required("username", AttributeType::String))
                .attribute(secret("password", "Password of the user"))
                .build(),
        )
        .block(allow_sources())
        .build()
}

fn log_forwarder() -> NestedBlock {
    NestedBlockBuilder::single_list("log_forwarder")
        .attribute(enabled())
        .attribute(string_set("sites", "Sites whose logs are forwarded"))
        .block(
            NestedBlockBuilder::single_list("elasticsearch")
                .attribute(required("url", AttributeType::String))
                .attribute(optional_string("aws_id", "AWS access key"))
                .attribute(secret("aws_secret", "AWS secret key"))
                .attribute(optional_string("aws_region", "AWS region"))
                .attribute(optional_bool("use_instance_credentials", "Use the instance role"))
                .attribute(optional_number("retention_days", "Days the index is kept"))
                .block(
                    NestedBlockBuilder::single_list("authentication")
                        .attribute(required("type", AttributeType::String))
                        .attribute(secret("token", "Authentication token"))
                        .build(),
                )
                .build(),
        )
        .block(
            NestedBlockBuilder::new("tcp_clients", NestingMode::Set)
                .attribute(required("name", AttributeType::String))
                .attribute(required("host", AttributeType::String))
                .attribute(required("port", AttributeType::Number))
                .attribute(
                    AttributeBuilder::new("format", AttributeType::String)
                        .optional()
                        .validator(StringOneOf::create(&["json", "syslog"]))
                        .build(),
                )
                .attribute(optional_bool("use_tls", "Connect over TLS"))
                .attribute(optional_string("filter", "Which events to forward"))
                .build(),
        )
        .block(
            NestedBlockBuilder::new("aws_kinesis", NestingMode::Set)
                .attribute(required("type", AttributeType::String))
                .attribute(required("region", AttributeType::String))
                .attribute(required("stream_name", AttributeType::String))
                .attribute(optional_string("aws_id", "AWS access key"))
                .attribute(secret("aws_secret", "AWS secret key"))
                .attribute(optional_bool("use_instance_credentials", "Use the instance role"))
                .attribute(optional_number("batch_size", "Records per batch"))
                .attribute(optional_number("number_of_partition_keys", "Partition keys"))
                .attribute(optional_string("filter", "Which events to forward"))
                .build(),
        )
        .block(
            NestedBlockBuilder::new("sumo_logic_clients", NestingMode::Set)
                .attribute(required("url", AttributeType::String))
                .build(),
        )
        .block(
            NestedBlockBuilder::new("splunk_clients", NestingMode::Set)
                .attribute(required("url", AttributeType::String))
                .attribute(secret("token", "HEC token"))
                .build(),
        )
        .block(
            NestedBlockBuilder::new("azure_monitors", NestingMode::Set)
                .attribute(required("app_id", AttributeType::String))
                .attribute(secret("app_secret", "Application secret"))
                .attribute(required("token_request_url", AttributeType::String))
                .attribute(required("log_destination_url", AttributeType::String))
                .attribute(optional_string("scope", "OAuth scope"))
                .build(),
        )
        .block(
            NestedBlockBuilder::new("falcon_log_scales", NestingMode::Set)
                .attribute(required("collector_url", AttributeType::String))
                .attribute(secret("token", "Ingest token"))
                .attribute(optional_string("index", "Repository index"))
                .attribute(optional_string("source_type", "Source type"))
                .attribute(optional_string("source", "Source"))
                .build(),
        )
        .block(
            NestedBlockBuilder::new("datadogs", NestingMode::Set)
                .attribute(optional_string("site", "Datadog site"))
                .attribute(secret("api_key", "Datadog API key"))
                .attribute(optional_string("source", "Source"))
                .attribute(string_set("tags", "Tags added to events"))
                .build(),
        )
        .block(
            NestedBlockBuilder::new("coralogixs", NestingMode::Set)
                .attribute(required("url", AttributeType::String))
                .attribute(secret("private_key", "Coralogix private key"))
                .attribute(optional_string("uuid", "Coralogix UUID"))
                .attribute(optional_string("application_name", "Application name"))
                .attribute(optional_string("subsystem_name", "Subsystem name"))
                .build(),
        )
        .build()
}

fn connector_clients(name: &str) -> NestedBlock {
    NestedBlockBuilder::new(name, NestingMode::Set)
        .attribute(required("name", AttributeType::String))
        .attribute(required("device_id", AttributeType::String))
        .attribute(optional_bool("snat_to_resources", "Source NAT towards resources"))
        .attribute(optional_bool("dnat_to_resource", "Destination NAT to the resource"))
        .block(
            NestedBlockBuilder::new("allow_resources", NestingMode::Set)
                .attribute(required("address", AttributeType::String))
                .attribute(optional_number("netmask", "Prefix length"))
                .build(),
        )
        .build()
}

fn portal() -> NestedBlock {
    NestedBlockBuilder::single_list("portal")
        .attribute(enabled())
        .attribute(string_set("profiles", "Client profiles offered by the portal"))
        .attribute(string_set("external_profiles", "External client profiles"))
        .block(p12("https_p12"))
        .block(
            NestedBlockBuilder::new("proxy_p12s", NestingMode::Set)
                .attribute(optional_string("id", "ID of the bundle"))
                .attribute(secret("content", "PKCS#12 content, base64"))
                .attribute(secret("password", "Password of the bundle"))
                .attribute(
                    AttributeBuilder::new("subject_name", AttributeType::String)
                        .computed()
                        .build(),
                )
                .build(),
        )
        .block(
            NestedBlockBuilder::single_list("sign_in_customization")
                .attribute(optional_string("background_color", "Hex color"))
                .attribute(optional_string("background_image", "Image, base64"))
                .attribute(optional_string("logo", "Logo, base64"))
                .attribute(optional_string("text", "Sign-in text"))
                .attribute(optional_string("text_color", "Hex color"))
                .attribute(optional_bool("auto_redirect", "Skip the sign-in page"))
                .build(),
        )
        .build()
}

fn seed_options() -> NestedBlock {
    NestedBlockBuilder::single_list("seed_options")
        .description("How the seed of an inactive appliance is exported")
        .attribute(secret("ssh_password", "Password of the cz user"))
        .attribute(
            AttributeBuilder::new("provide_cloud_ssh_key", AttributeType::Bool)
                .optional()
                .default(StaticDefault::bool(false))
                .build(),
        )
        .attribute(
            AttributeBuilder::new("allow_customization", AttributeType::Bool)
                .optional()
                .default(StaticDefault::bool(false))
                .build(),
        )
        .attribute(optional_number("validity_days", "Days the seed stays valid"))
        .build()
}

pub(crate) fn seed_request(options: Option<Attrs<'_>>) -> SeedRequest {
    let Some(options) = options else {
        return SeedRequest::default();
    };
    SeedRequest {
        provide_cloud_ssh_key: options.bool("provide_cloud_ssh_key").unwrap_or(false),
        ssh_password: options.non_empty_string("ssh_password"),
        allow_customization: options.bool("allow_customization").unwrap_or(false),
        validity_days: options.int("validity_days"),
    }
}

#[async_trait]
impl Reconciler for ApplianceReconciler {
    type Model = Appliance;

    fn type_name(&self) -> &'static str {
        "appgate_appliance"
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new()
            .description("Appliance of the collective and the roles it runs")
            .attributes(base_attributes("appliance"))
            .attribute(
                AttributeBuilder::new("appliance_id", AttributeType::String)
                    .description("ID of the appliance")
                    .computed()
                    .build(),
            )
            .attribute(required("hostname", AttributeType::String))
            .attribute(optional_string("site", "ID of the site the appliance serves"))
            .attribute(
                AttributeBuilder::new("site_name", AttributeType::String)
                    .computed()
                    .build(),
            )
            .attribute(optional_string("customization", "ID of the appliance customization"))
            .attribute(optional_bool(
                "connect_to_peers_using_client_port_with_spa",
                "Reach peers through the client port with SPA",
            ))
            .attribute(string_set("hostname_aliases", "Other names of the appliance"))
            .attribute(
                AttributeBuilder::new("activated", AttributeType::Bool)
                    .description("Whether the appliance has joined the collective")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("seed_file", AttributeType::String)
                    .description("Seed of the inactive appliance, base64")
                    .computed()
                    .sensitive()
                    .build(),
            )
            .block(client_interface())
            .block(peer_interface())
            .block(admin_interface())
            .block(networking())
            .block(ntp())
            .block(ssh_server())
            .block(snmp_server())
            .block(healthcheck_server())
            .block(prometheus_exporter())
            .block(
                NestedBlockBuilder::single_list("ping")
                    .block(allow_sources())
                    .build(),
            )
            .block(
                NestedBlockBuilder::single_list("log_server")
                    .attribute(enabled())
                    .attribute(optional_number("retention_days", "Days logs are kept"))
                    .build(),
            )
            .block(log_forwarder())
            .block(
                NestedBlockBuilder::single_list("metrics_aggregator")
                    .attribute(enabled())
                    .attribute(string_set("sites", "Sites whose metrics are aggregated"))
                    .build(),
            )
            .block(
                NestedBlockBuilder::single_list("gateway")
                    .attribute(enabled())
                    .attribute(optional_bool("suspended", "Stop taking new tunnels"))
                    .block(
                        NestedBlockBuilder::single_list("vpn")
                            .attribute(
                                AttributeBuilder::new("weight", AttributeType::Number)
                                    .optional()
                                    .default(StaticDefault::number(100.0))
                                    .build(),
                            )
                            .block(
                                NestedBlockBuilder::new("allow_destinations", NestingMode::Set)
                                    .attribute(required("address", AttributeType::String))
                                    .attribute(optional_number("netmask", "Prefix length"))
                                    .attribute(optional_string("nic", "Outgoing interface"))
                                    .build(),
                            )
                            .build(),
                    )
                    .build(),
            )
            .block(
                NestedBlockBuilder::single_list("controller")
                    .attribute(enabled())
                    .build(),
            )
            .block(
                NestedBlockBuilder::single_list("connector")
                    .attribute(enabled())
                    .block(connector_clients("express_clients"))
                    .block(connector_clients("advanced_clients"))
                    .build(),
            )
            .block(portal())
            .block(
                NestedBlockBuilder::new("rsyslog_destinations", NestingMode::Set)
                    .attribute(optional_string("selector", "rsyslog selector"))
                    .attribute(optional_string("template", "rsyslog template"))
                    .attribute(required("destination", AttributeType::String))
                    .build(),
            )
            .block(seed_options())
            .build()
    }

    fn collection<'a>(&self, client: &'a Client) -> Collection<'a, Self::Model> {
        client.appliances().collection()
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
        model.hostname = config.string("hostname").unwrap_or_default();
        model.site = config.non_empty_string("site");
        model.customization = config.non_empty_string("customization");
        model.connect_to_peers_using_client_port_with_spa =
            config.bool("connect_to_peers_using_client_port_with_spa");
        model.hostname_aliases = config.string_set("hostname_aliases");
        CODEC.encode(schema, BLOCKS, planned, &mut model.extra);
        Ok(())
    }

    fn flatten(&self, schema: &Schema, model: &Self::Model, _revision: ApiRevision) -> StateBuilder {
        let state = base_state(&model.id, &model.name, model.notes.as_deref(), &model.tags)
            .string("appliance_id", &model.id)
            .string("hostname", &model.hostname)
            .opt_string("site", model.site.clone())
            .opt_string("site_name", model.site_name.clone())
            .opt_string("customization", model.customization.clone())
            .opt_bool(
                "connect_to_peers_using_client_port_with_spa",
                model.connect_to_peers_using_client_port_with_spa,
            )
            .set("hostname_aliases", model.hostname_aliases.iter().cloned())
            .bool("activated", model.activated);
        CODEC.decode(schema, BLOCKS, &model.extra, state)
    }

    /// Seed options never reach the peer and the seed is exported once
    async fn after_read(
        &self,
        ctx: &Context,
        client: &Client,
        model: &Self::Model,
        prior: &Dynamic,
        state: StateBuilder,
    ) -> Result<StateBuilder, ApiError> {
        let prior = Attrs::new(prior);
        let mut state = state.raw(
            "seed_options",
            prior.raw("seed_options").cloned().unwrap_or(Dynamic::List(Vec::new())),
        );

        if let Some(seed) = prior.non_empty_string("seed_file") {
            return Ok(state.string("seed_file", seed));
        }
        if model.activated {
            return Ok(state);
        }

        let request = seed_request(prior.block("seed_options"));
        let seed = client
            .appliances()
            .export_seed(ctx, &model.id, &request)
            .await?;
        let raw = serde_json::to_vec(&seed).map_err(|e| ApiError::Parse(e.to_string()))?;
        state.insert("seed_file", Dynamic::String(STANDARD.encode(raw)));
        Ok(state)
    }

    async fn before_delete(
        &self,
        ctx: &Context,
        client: &Client,
        model: &Self::Model,
    ) -> Result<(), ApiError> {
        if !model.activated {
            return Ok(());
        }
        tracing::info!("Deactivating appliance {} before delete", model.id);
        client.appliances().deactivate(ctx, &model.id).await
    }
}

#[cfg(test)]
#[path = "./appliance_test.rs"]
mod appliance_test;
