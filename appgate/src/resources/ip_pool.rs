use tfplug::defaults::StaticDefault;
use tfplug::schema::{AttributeBuilder, AttributeType, NestedBlockBuilder, NestingMode, Schema, SchemaBuilder};
use tfplug::types::{Diagnostic, Dynamic};
use tfplug::validators::{IntBetween, IsIpAddress};

use super::common::{base_attributes, base_state, required_name, tags};
use super::engine::{ManagedResource, Reconciler};
use super::state::{Attrs, StateBuilder};
use crate::api::ip_pools::{IpPool, IpRange};
use crate::api::{ApiRevision, Client, Collection};

pub struct IpPoolReconciler;

pub fn ip_pool() -> ManagedResource<IpPoolReconciler> {
    ManagedResource::new(IpPoolReconciler)
}

impl Reconciler for IpPoolReconciler {
    type Model = IpPool;

    fn type_name(&self) -> &'static str {
        "appgate_ip_pool"
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new()
            .description("Pool of addresses handed to clients by identity providers")
            .attributes(base_attributes("IP pool"))
            .attribute(
                AttributeBuilder::new("ip_version6", AttributeType::Bool)
                    .description("Whether the pool holds IPv6 addresses")
                    .optional()
                    .default(StaticDefault::bool(false))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("lease_time_days", AttributeType::Number)
                    .description("Days an allocation stays reserved for a user")
                    .optional()
                    .default(StaticDefault::number(30.0))
                    .validator(IntBetween::create(1, 3650))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("total", AttributeType::String)
                    .description("Number of addresses in the pool")
                    .computed()
                    .build(),
            )
            .block(
                NestedBlockBuilder::new("ranges", NestingMode::List)
                    .description("Address ranges, first and last included")
                    .min_items(1)
                    .attribute(
                        AttributeBuilder::new("first", AttributeType::String)
                            .required()
                            .validator(IsIpAddress::create())
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("last", AttributeType::String)
                            .required()
                            .validator(IsIpAddress::create())
                            .build(),
                    )
                    .build(),
            )
            .build()
    }

    fn collection<'a>(&self, client: &'a Client) -> Collection<'a, Self::Model> {
        client.ip_pools()
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
        model.ip_version6 = config.bool("ip_version6").unwrap_or(false);
        model.lease_time_days = config.int("lease_time_days");
        model.ranges = config
            .blocks("ranges")
            .iter()
            .map(|range| IpRange {
                first: range.string("first").unwrap_or_default(),
                last: range.string("last").unwrap_or_default(),
            })
            .collect();
        Ok(())
    }

    fn flatten(&self, _schema: &Schema, model: &Self::Model, _revision: ApiRevision) -> StateBuilder {
        let ranges = model
            .ranges
            .iter()
            .map(|r| {
                StateBuilder::new()
                    .string("first", &r.first)
                    .string("last", &r.last)
            })
            .collect();

        base_state(&model.id, &model.name, model.notes.as_deref(), &model.tags)
            .bool("ip_version6", model.ip_version6)
            .opt_int("lease_time_days", model.lease_time_days)
            .opt_string("total", model.total_display())
            .blocks("ranges", ranges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::test_helpers::{blocks, configured, create, object, value};
    use mockito::{Matcher, Server};
    use serde_json::json;

    #[tokio::test]
    async fn lease_time_defaults_to_thirty_days() {
        let mut server = Server::new_async().await;
        let resource = configured(ip_pool(), &mut server, ApiRevision::V18, None).await;

        let body = json!({
            "id": "pool-1",
            "name": "v4",
            "tags": [],
            "ipVersion6": false,
            "leaseTimeDays": 30,
            "ranges": [{"first": "10.0.0.1", "last": "10.0.0.254"}],
            "total": 254
        });
        let post = server
            .mock("POST", "/admin/ip-pools")
            .match_body(Matcher::PartialJson(json!({"leaseTimeDays": 30, "ipVersion6": false})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;
        let _get = server
            .mock("GET", "/admin/ip-pools/pool-1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;

        let response = create(
            &resource,
            value(vec![
                ("name", Dynamic::from("v4")),
                (
                    "ranges",
                    blocks(vec![object(vec![
                        ("first", Dynamic::from("10.0.0.1")),
                        ("last", Dynamic::from("10.0.0.254")),
                    ])]),
                ),
            ]),
        )
        .await;

        post.assert_async().await;
        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        let state = Attrs::of(&response.new_state);
        assert_eq!(state.int("lease_time_days"), Some(30));
        assert_eq!(state.string("total").as_deref(), Some("254"));
    }
}
