use tfplug::defaults::StaticDefault;
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType, NestedBlock, NestedBlockBuilder, NestingMode, Schema, SchemaBuilder};
use tfplug::types::{Diagnostic, Dynamic};
use tfplug::validators::IsCidr;

use super::codec::BlockCodec;
use super::common::{
    base_attributes, base_state, optional_bool, optional_number, optional_string, required_name,
    secret, string_set, tags,
};
use super::engine::{ManagedResource, Reconciler};
use super::state::{Attrs, StateBuilder};
use crate::api::sites::Site;
use crate::api::{ApiRevision, Client, Collection};

pub struct SiteReconciler;

pub fn site() -> ManagedResource<SiteReconciler> {
    ManagedResource::new(SiteReconciler)
}

const BLOCKS: &[&str] = &["ip_pool_mappings", "default_gateway", "vpn", "name_resolution"];

static CODEC: BlockCodec = BlockCodec::new(
    &[],
    &[
        ("ip_pool_mappings", &["from", "to"]),
        ("dns_resolvers", &["name"]),
        ("aws_resolvers", &["name"]),
        ("azure_resolvers", &["name"]),
        ("esx_resolvers", &["name"]),
        ("gcp_resolvers", &["name"]),
        ("assumed_roles", &["account_id", "role_name"]),
        ("allow_destinations", &["address", "netmask"]),
    ],
);

fn required_string(name: &str) -> Attribute {
    AttributeBuilder::new(name, AttributeType::String)
        .required()
        .build()
}

fn update_interval() -> Attribute {
    AttributeBuilder::new("update_interval", AttributeType::Number)
        .description("Seconds between lookups")
        .optional()
        .default(StaticDefault::number(13.0))
        .build()
}

fn resolver(name: &str) -> NestedBlockBuilder {
    NestedBlockBuilder::new(name, NestingMode::Set)
        .attribute(required_string("name"))
        .attribute(update_interval())
}

fn enabled_block(name: &str, description: &str) -> NestedBlock {
    NestedBlockBuilder::single_list(name)
        .description(description)
        .attribute(optional_bool("enabled", "Whether the protocol is used"))
        .build()
}

fn vpn() -> NestedBlock {
    NestedBlockBuilder::single_list("vpn")
        .description("Tunnel settings of the site")
        .attribute(optional_bool("state_sharing", "Share tunnel state between gateways"))
        .attribute(optional_bool("snat", "Source NAT tunnel traffic"))
        .attribute(optional_bool("web_proxy_enabled", "Run the HTTP proxy"))
        .attribute(secret("web_proxy_key_store", "PKCS12 key store of the proxy, base64"))
        .attribute(
            AttributeBuilder::new("web_proxy_certificate_subject_name", AttributeType::String)
                .description("Subject of the proxy certificate")
                .computed()
                .build(),
        )
        .attribute(optional_number(
            "ip_access_log_interval_seconds",
            "Seconds between IP access log entries",
        ))
        .block(enabled_block("tls", "TLS tunnels"))
        .block(enabled_block("dtls", "DTLS tunnels"))
        .block(
            NestedBlockBuilder::single_list("route_via")
                .description("Gateway routes for tunnel traffic")
                .attribute(optional_string("ipv4", "IPv4 next hop"))
                .attribute(optional_string("ipv6", "IPv6 next hop"))
                .build(),
        )
        .build()
}

fn name_resolution() -> NestedBlock {
    NestedBlockBuilder::single_list("name_resolution")
        .description("How gateways resolve names for entitlements")
        .attribute(optional_bool("use_hosts_file", "Resolve through /etc/hosts"))
        .block(
            resolver("dns_resolvers")
                .attribute(string_set("servers", "DNS servers"))
                .attribute(string_set("search_domains", "Search domains"))
                .build(),
        )
        .block(
            resolver("aws_resolvers")
                .attribute(string_set("vpcs", "VPC IDs"))
                .attribute(optional_bool("vpc_auto_discovery", "Find VPCs automatically"))
                .attribute(string_set("regions", "AWS regions"))
                .attribute(optional_bool("use_iam_role", "Use the instance role"))
                .attribute(optional_string("access_key_id", "AWS access key"))
                .attribute(secret("secret_access_key", "AWS secret key"))
                .attribute(optional_string("https_proxy", "Proxy for AWS API calls"))
                .attribute(optional_bool(
                    "resolve_with_master_credentials",
                    "Resolve with the main account as well",
                ))
                .block(
                    NestedBlockBuilder::new("assumed_roles", NestingMode::Set)
                        .attribute(required_string("account_id"))
                        .attribute(required_string("role_name"))
                        .attribute(optional_string("external_id", "External ID of the role"))
                        .attribute(string_set("regions", "AWS regions"))
                        .build(),
                )
                .build(),
        )
        .block(
            resolver("azure_resolvers")
                .attribute(optional_bool("use_managed_identities", "Use managed identities"))
                .attribute(optional_string("subscription_id", "Azure subscription"))
                .attribute(optional_string("tenant_id", "Azure tenant"))
                .attribute(optional_string("client_id", "Azure client"))
                .attribute(secret("secret", "Azure client secret"))
                .build(),
        )
        .block(
            resolver("esx_resolvers")
                .attribute(required_string("hostname"))
                .attribute(required_string("username"))
                .attribute(secret("password", "vCenter password"))
                .build(),
        )
        .block(
            resolver("gcp_resolvers")
                .attribute(optional_string("project_filter", "Project filter"))
                .attribute(optional_string("instance_filter", "Instance filter"))
                .build(),
        )
        .block(
            NestedBlockBuilder::single_list("dns_forwarding")
                .description("DNS forwarding to the site")
                .attribute(optional_string("site_ipv4", "IPv4 address of the forwarder"))
                .attribute(optional_string("site_ipv6", "IPv6 address of the forwarder"))
                .attribute(string_set("dns_servers", "Upstream servers"))
                .block(
                    NestedBlockBuilder::new("allow_destinations", NestingMode::Set)
                        .attribute(required_string("address"))
                        .attribute(optional_number("netmask", "Prefix length"))
                        .build(),
                )
                .build(),
        )
        .build()
}

impl Reconciler for SiteReconciler {
    type Model = Site;

    fn type_name(&self) -> &'static str {
        "appgate_site"
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new()
            .description("Protected network reached through a group of gateways")
            .attributes(base_attributes("site"))
            .attribute(optional_string("short_name", "Short name shown on the client"))
            .attribute(
                AttributeBuilder::new("network_subnets", AttributeType::set_of(AttributeType::String))
                    .description("Subnets of the protected network")
                    .optional()
                    .validator(IsCidr::create())
                    .build(),
            )
            .attribute(optional_bool(
                "entitlement_based_routing",
                "Route by entitlement instead of by subnet",
            ))
            .block(
                NestedBlockBuilder::new("ip_pool_mappings", NestingMode::Set)
                    .description("Translate an identity provider pool to a site pool")
                    .attribute(required_string("from"))
                    .attribute(required_string("to"))
                    .build(),
            )
            .block(
                NestedBlockBuilder::single_list("default_gateway")
                    .description("Send all client traffic through the site")
                    .attribute(optional_bool("enabled_v4", "IPv4 default route"))
                    .attribute(optional_bool("enabled_v6", "IPv6 default route"))
                    .attribute(string_set("excluded_subnets", "Subnets kept local"))
                    .build(),
            )
            .block(vpn())
            .block(name_resolution())
            .build()
    }

    fn collection<'a>(&self, client: &'a Client) -> Collection<'a, Self::Model> {
        client.sites()
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
        model.short_name = config.non_empty_string("short_name");
        model.network_subnets = config.strings("network_subnets");
        model.entitlement_based_routing = config.bool("entitlement_based_routing");
        CODEC.encode(schema, BLOCKS, planned, &mut model.extra);
        Ok(())
    }

    fn flatten(&self, schema: &Schema, model: &Self::Model, _revision: ApiRevision) -> StateBuilder {
        let state = base_state(&model.id, &model.name, model.notes.as_deref(), &model.tags)
            .opt_string("short_name", model.short_name.clone())
            .set("network_subnets", model.network_subnets.iter().cloned())
            .opt_bool("entitlement_based_routing", model.entitlement_based_routing);
        CODEC.decode(schema, BLOCKS, &model.extra, state)
    }
}
