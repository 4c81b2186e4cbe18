//! Reading host values into models and writing models back as state

use std::cmp::Ordering;
use std::collections::HashMap;
use tfplug::schema::{AttributeType, Block, NestingMode};
use tfplug::types::{Dynamic, DynamicValue};

/// Read-only view over one object of a configuration or plan.
///
/// Null and unknown values read as absent. A nested block stored as a list
/// with one element reads the same as a single block.
#[derive(Debug, Clone, Copy)]
pub struct Attrs<'a> {
    map: Option<&'a HashMap<String, Dynamic>>,
}

impl<'a> Attrs<'a> {
    pub fn new(value: &'a Dynamic) -> Self {
        let map = match value {
            Dynamic::Map(map) => Some(map),
            Dynamic::List(items) => items.first().and_then(Dynamic::as_map),
            _ => None,
        };
        Self { map }
    }

    pub fn of(value: &'a DynamicValue) -> Self {
        Self::new(&value.value)
    }

    pub fn empty() -> Self {
        Self { map: None }
    }

    pub fn raw(&self, name: &str) -> Option<&'a Dynamic> {
        self.map
            .and_then(|m| m.get(name))
            .filter(|v| v.is_present())
    }

    /// True when the attribute carries a value; empty lists and maps count as unset
    pub fn is_set(&self, name: &str) -> bool {
        match self.raw(name) {
            Some(Dynamic::List(items)) => !items.is_empty(),
            Some(Dynamic::Map(map)) => !map.is_empty(),
            Some(_) => true,
            None => false,
        }
    }

    pub fn string(&self, name: &str) -> Option<String> {
        self.raw(name).and_then(Dynamic::as_str).map(str::to_string)
    }

    /// Empty strings read as absent
    pub fn non_empty_string(&self, name: &str) -> Option<String> {
        self.string(name).filter(|s| !s.is_empty())
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.raw(name)
            .and_then(Dynamic::as_number)
            .map(|n| n as i64)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.raw(name).and_then(Dynamic::as_bool)
    }

    pub fn strings(&self, name: &str) -> Vec<String> {
        self.raw(name)
            .and_then(Dynamic::as_list)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Dynamic::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Set-typed strings, sorted and deduplicated
    pub fn string_set(&self, name: &str) -> Vec<String> {
        let mut values = self.strings(name);
        values.sort();
        values.dedup();
        values
    }

    pub fn block(&self, name: &str) -> Option<Attrs<'a>> {
        match self.raw(name)? {
            Dynamic::List(items) if items.is_empty() => None,
            value => Some(Attrs::new(value)),
        }
    }

    pub fn blocks(&self, name: &str) -> Vec<Attrs<'a>> {
        match self.raw(name) {
            Some(Dynamic::List(items)) => items.iter().map(Attrs::new).collect(),
            Some(value @ Dynamic::Map(_)) => vec![Attrs::new(value)],
            _ => Vec::new(),
        }
    }
}

/// Builds the state object of one resource or nested block
#[derive(Debug, Clone, Default)]
pub struct StateBuilder {
    values: HashMap<String, Dynamic>,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(mut self, name: &str, value: Dynamic) -> Self {
        self.values.insert(name.to_string(), value);
        self
    }

    pub fn insert(&mut self, name: &str, value: Dynamic) {
        self.values.insert(name.to_string(), value);
    }

    pub fn string(self, name: &str, value: impl Into<String>) -> Self {
        self.raw(name, Dynamic::String(value.into()))
    }

    pub fn opt_string<S: Into<String>>(self, name: &str, value: Option<S>) -> Self {
        let value = value.map_or(Dynamic::Null, |s| Dynamic::String(s.into()));
        self.raw(name, value)
    }

    pub fn int(self, name: &str, value: i64) -> Self {
        self.raw(name, Dynamic::from(value))
    }

    pub fn opt_int(self, name: &str, value: Option<i64>) -> Self {
        self.raw(name, value.map_or(Dynamic::Null, Dynamic::from))
    }

    pub fn bool(self, name: &str, value: bool) -> Self {
        self.raw(name, Dynamic::Bool(value))
    }

    pub fn opt_bool(self, name: &str, value: Option<bool>) -> Self {
        self.raw(name, value.map_or(Dynamic::Null, Dynamic::Bool))
    }

    /// Order-indifferent strings, written sorted and deduplicated
    pub fn set<I, S>(self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut values: Vec<String> = values.into_iter().map(Into::into).collect();
        values.sort();
        values.dedup();
        self.raw(
            name,
            Dynamic::List(values.into_iter().map(Dynamic::String).collect()),
        )
    }

    pub fn list<I, S>(self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.raw(
            name,
            Dynamic::List(
                values
                    .into_iter()
                    .map(|s| Dynamic::String(s.into()))
                    .collect(),
            ),
        )
    }

    /// A block with at most one element, stored as a list
    pub fn block(self, name: &str, block: Option<StateBuilder>) -> Self {
        let items = block.map(|b| vec![b.into_dynamic()]).unwrap_or_default();
        self.raw(name, Dynamic::List(items))
    }

    pub fn blocks(self, name: &str, blocks: Vec<StateBuilder>) -> Self {
        self.raw(
            name,
            Dynamic::List(blocks.into_iter().map(StateBuilder::into_dynamic).collect()),
        )
    }

    /// Order-indifferent blocks, written in the canonical order of `keys`
    pub fn block_set(self, name: &str, blocks: Vec<StateBuilder>, keys: &[&str]) -> Self {
        let mut items: Vec<Dynamic> = blocks.into_iter().map(StateBuilder::into_dynamic).collect();
        canonical_order(&mut items, keys);
        self.raw(name, Dynamic::List(items))
    }

    pub fn into_dynamic(self) -> Dynamic {
        Dynamic::Map(self.values)
    }

    pub fn build(self) -> DynamicValue {
        DynamicValue::new(self.into_dynamic())
    }
}

/// Sorts block elements by the rendered values of `keys`, in key order
pub fn canonical_order(items: &mut [Dynamic], keys: &[&str]) {
    items.sort_by(|a, b| compare_by_keys(a, b, keys));
}

fn compare_by_keys(a: &Dynamic, b: &Dynamic, keys: &[&str]) -> Ordering {
    for key in keys {
        let left = a.as_map().and_then(|m| m.get(*key)).map(render);
        let right = b.as_map().and_then(|m| m.get(*key)).map(render);
        match left.cmp(&right) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// Stable text form of a value, used for ordering only
pub fn render(value: &Dynamic) -> String {
    match value {
        Dynamic::Null | Dynamic::Unknown => String::new(),
        Dynamic::Bool(b) => b.to_string(),
        Dynamic::Number(n) => format!("{:020.6}", n),
        Dynamic::String(s) => s.clone(),
        Dynamic::List(items) => items.iter().map(render).collect::<Vec<_>>().join(","),
        Dynamic::Map(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            keys.into_iter()
                .map(|k| format!("{}={}", k, render(&map[k])))
                .collect::<Vec<_>>()
                .join(";")
        }
    }
}

/// Copies sensitive values from `prior` into `current` wherever the peer
/// returned nothing for them. List elements are paired by position, set
/// elements by their non-sensitive scalar attributes.
pub fn preserve_sensitive(block: &Block, prior: &Dynamic, current: &mut Dynamic) {
    let (Dynamic::Map(prior), Dynamic::Map(current)) = (prior, current) else {
        return;
    };

    for attr in block.attributes.iter().filter(|a| a.sensitive) {
        let missing = current.get(&attr.name).map_or(true, |v| !v.is_present());
        if !missing {
            continue;
        }
        if let Some(value) = prior.get(&attr.name).filter(|v| v.is_present()) {
            current.insert(attr.name.clone(), value.clone());
        }
    }

    for nested in &block.block_types {
        let (Some(before), Some(after)) = (prior.get(&nested.type_name), current.get_mut(&nested.type_name)) else {
            continue;
        };
        match (nested.nesting, before, after) {
            (NestingMode::Single, before, after) => {
                preserve_sensitive(&nested.block, before, after)
            }
            (NestingMode::Set, Dynamic::List(before), Dynamic::List(after)) => {
                let keys = identity_keys(&nested.block);
                let mut unpaired: Vec<&Dynamic> = before.iter().collect();
                for a in after.iter_mut() {
                    if let Some(at) = unpaired.iter().position(|b| same_element(b, a, &keys)) {
                        let b = unpaired.remove(at);
                        preserve_sensitive(&nested.block, b, a);
                    }
                }
            }
            (_, Dynamic::List(before), Dynamic::List(after)) => {
                for (b, a) in before.iter().zip(after.iter_mut()) {
                    preserve_sensitive(&nested.block, b, a);
                }
            }
            _ => {}
        }
    }
}

fn identity_keys(block: &Block) -> Vec<&str> {
    block
        .attributes
        .iter()
        .filter(|a| !a.sensitive)
        .filter(|a| {
            matches!(
                a.r#type,
                AttributeType::String | AttributeType::Number | AttributeType::Bool
            )
        })
        .map(|a| a.name.as_str())
        .collect()
}

/// Elements agree on every key both of them carry; computed keys that only
/// the peer filled in do not count against a match.
fn same_element(prior: &Dynamic, current: &Dynamic, keys: &[&str]) -> bool {
    let (Some(prior), Some(current)) = (prior.as_map(), current.as_map()) else {
        return false;
    };
    keys.iter().all(|key| {
        match (
            prior.get(*key).filter(|v| v.is_present()),
            current.get(*key).filter(|v| v.is_present()),
        ) {
            (Some(left), Some(right)) => render(left) == render(right),
            _ => true,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfplug::schema::{AttributeBuilder, AttributeType, NestedBlockBuilder, SchemaBuilder};

    fn map(pairs: Vec<(&str, Dynamic)>) -> Dynamic {
        Dynamic::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    #[test]
    fn attrs_treat_null_and_unknown_as_absent() {
        let value = map(vec![
            ("name", Dynamic::from("site")),
            ("notes", Dynamic::Null),
            ("id", Dynamic::Unknown),
            ("port", Dynamic::Number(389.0)),
        ]);
        let attrs = Attrs::new(&value);

        assert_eq!(attrs.string("name").as_deref(), Some("site"));
        assert_eq!(attrs.string("notes"), None);
        assert_eq!(attrs.string("id"), None);
        assert_eq!(attrs.int("port"), Some(389));
        assert!(!attrs.is_set("tags"));
    }

    #[test]
    fn single_element_lists_read_as_blocks() {
        let value = map(vec![(
            "client_interface",
            Dynamic::List(vec![map(vec![("https_port", Dynamic::Number(443.0))])]),
        )]);
        let attrs = Attrs::new(&value);

        let block = attrs.block("client_interface").unwrap();
        assert_eq!(block.int("https_port"), Some(443));
        assert!(attrs.block("portal").is_none());
    }

    #[test]
    fn sets_are_written_sorted() {
        let state = StateBuilder::new()
            .set("tags", vec!["b", "a", "b"])
            .into_dynamic();

        let tags = state.as_map().unwrap()["tags"].as_list().unwrap().to_vec();
        assert_eq!(tags, vec![Dynamic::from("a"), Dynamic::from("b")]);
    }

    #[test]
    fn block_sets_follow_the_key_order() {
        let state = StateBuilder::new()
            .block_set(
                "privileges",
                vec![
                    StateBuilder::new().string("target", "Site").string("type", "View"),
                    StateBuilder::new().string("target", "Appliance").string("type", "View"),
                    StateBuilder::new().string("target", "Appliance").string("type", "Edit"),
                ],
                &["target", "type"],
            )
            .into_dynamic();

        let items = state.as_map().unwrap()["privileges"].as_list().unwrap().to_vec();
        let order: Vec<String> = items
            .iter()
            .map(|i| {
                let m = i.as_map().unwrap();
                format!("{}/{}", m["target"].as_str().unwrap(), m["type"].as_str().unwrap())
            })
            .collect();
        assert_eq!(order, vec!["Appliance/Edit", "Appliance/View", "Site/View"]);
    }

    #[test]
    fn sensitive_values_survive_from_prior_state() {
        let schema = SchemaBuilder::new()
            .attribute(
                AttributeBuilder::new("admin_password", AttributeType::String)
                    .sensitive()
                    .build(),
            )
            .block(
                NestedBlockBuilder::single_list("https_p12")
                    .attribute(
                        AttributeBuilder::new("content", AttributeType::String)
                            .sensitive()
                            .build(),
                    )
                    .build(),
            )
            .build();

        let prior = map(vec![
            ("admin_password", Dynamic::from("s3cret")),
            (
                "https_p12",
                Dynamic::List(vec![map(vec![("content", Dynamic::from("/tmp/cert.p12"))])]),
            ),
        ]);
        let mut current = map(vec![
            ("admin_password", Dynamic::Null),
            (
                "https_p12",
                Dynamic::List(vec![map(vec![("content", Dynamic::Null)])]),
            ),
        ]);

        preserve_sensitive(&schema.block, &prior, &mut current);

        let current = Attrs::new(&current);
        assert_eq!(current.string("admin_password").as_deref(), Some("s3cret"));
        assert_eq!(
            current.block("https_p12").unwrap().string("content").as_deref(),
            Some("/tmp/cert.p12")
        );
    }

    #[test]
    fn set_secrets_follow_their_element_not_their_position() {
        let schema = SchemaBuilder::new()
            .block(
                NestedBlockBuilder::new("allowed_users", NestingMode::Set)
                    .attribute(
                        AttributeBuilder::new("username", AttributeType::String)
                            .required()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("password", AttributeType::String)
                            .sensitive()
                            .build(),
                    )
                    .build(),
            )
            .build();
        let user = |name: &str, password: Dynamic| {
            map(vec![("username", Dynamic::from(name)), ("password", password)])
        };

        let prior = map(vec![(
            "allowed_users",
            Dynamic::List(vec![
                user("bob", Dynamic::from("pw-bob")),
                user("alice", Dynamic::from("pw-alice")),
            ]),
        )]);
        let mut current = map(vec![(
            "allowed_users",
            Dynamic::List(vec![user("alice", Dynamic::Null), user("bob", Dynamic::Null)]),
        )]);

        preserve_sensitive(&schema.block, &prior, &mut current);

        let users = current.as_map().unwrap()["allowed_users"].as_list().unwrap().to_vec();
        let pairs: Vec<(String, String)> = users
            .iter()
            .map(|u| {
                let u = Attrs::new(u);
                (u.string("username").unwrap(), u.string("password").unwrap())
            })
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("alice".to_string(), "pw-alice".to_string()),
                ("bob".to_string(), "pw-bob".to_string()),
            ]
        );
    }
}
