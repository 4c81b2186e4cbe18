//! Schema-driven translation of nested blocks
//!
//! Large resources (appliances, sites, policy settings) carry deep nested
//! configuration that the peer stores as camelCase JSON. Rather than a typed
//! struct per block, the schema itself drives the translation: attribute
//! names map from snake_case to camelCase, a block with at most one element
//! is a JSON object and any other block is a JSON array.

use serde_json::{Map, Number, Value};
use std::collections::HashMap;
use tfplug::schema::{AttributeType, Block, NestedBlock, NestingMode, Schema};
use tfplug::types::Dynamic;

use super::state::{canonical_order, StateBuilder};

/// Attribute name to wire name, for names that do not follow camelCase
pub type Renames = &'static [(&'static str, &'static str)];

/// Block name to the attributes that order its elements
pub type SortKeys = &'static [(&'static str, &'static [&'static str])];

pub struct BlockCodec {
    renames: Renames,
    sort_keys: SortKeys,
}

impl BlockCodec {
    pub const PLAIN: BlockCodec = BlockCodec {
        renames: &[],
        sort_keys: &[],
    };

    pub const fn new(renames: Renames, sort_keys: SortKeys) -> Self {
        Self {
            renames,
            sort_keys,
        }
    }

    pub fn wire_name(&self, attribute: &str) -> String {
        self.renames
            .iter()
            .find(|(name, _)| *name == attribute)
            .map(|(_, wire)| wire.to_string())
            .unwrap_or_else(|| camel_case(attribute))
    }

    /// Writes the top-level attributes and blocks named in `names` from
    /// `config` into `body`. Names that are unset in `config` are removed
    /// from `body`, so a block the user dropped is dropped on the peer too.
    pub fn encode(
        &self,
        schema: &Schema,
        names: &[&str],
        config: &Dynamic,
        body: &mut Map<String, Value>,
    ) {
        let empty = HashMap::new();
        let values = config.as_map().unwrap_or(&empty);

        for name in names {
            let key = self.wire_name(name);
            let value = values.get(*name).unwrap_or(&Dynamic::Null);
            let wire = if let Some(nested) = schema.block.nested_block(name) {
                self.nested_to_wire(nested, value)
            } else if let Some(attr) = schema.block.attribute(name) {
                attribute_to_wire(&attr.r#type, value)
            } else {
                None
            };

            match wire {
                Some(wire) => {
                    body.insert(key, wire);
                }
                None => {
                    body.remove(&key);
                }
            }
        }
    }

    /// Reads the top-level attributes and blocks named in `names` from the
    /// peer object into `state`
    pub fn decode(
        &self,
        schema: &Schema,
        names: &[&str],
        body: &Map<String, Value>,
        mut state: StateBuilder,
    ) -> StateBuilder {
        for name in names {
            let wire = body.get(&self.wire_name(name));
            if let Some(nested) = schema.block.nested_block(name) {
                state.insert(name, self.nested_from_wire(nested, wire));
            } else if let Some(attr) = schema.block.attribute(name) {
                let value = match wire {
                    Some(wire) if !attr.sensitive => attribute_from_wire(&attr.r#type, wire),
                    _ => Dynamic::Null,
                };
                state.insert(name, value);
            }
        }
        state
    }

    fn block_to_wire(&self, block: &Block, value: &Dynamic) -> Value {
        let mut out = Map::new();
        let Some(values) = value.as_map() else {
            return Value::Object(out);
        };

        for attr in &block.attributes {
            if attr.computed && !attr.optional && !attr.required {
                continue;
            }
            if let Some(wire) = values
                .get(&attr.name)
                .and_then(|v| attribute_to_wire(&attr.r#type, v))
            {
                out.insert(self.wire_name(&attr.name), wire);
            }
        }

        for nested in &block.block_types {
            if let Some(wire) = values
                .get(&nested.type_name)
                .and_then(|v| self.nested_to_wire(nested, v))
            {
                out.insert(self.wire_name(&nested.type_name), wire);
            }
        }

        Value::Object(out)
    }

    fn nested_to_wire(&self, nested: &NestedBlock, value: &Dynamic) -> Option<Value> {
        match (nested.nesting, value) {
            (_, Dynamic::Null) | (_, Dynamic::Unknown) => None,
            (NestingMode::Single, value) => Some(self.block_to_wire(&nested.block, value)),
            (_, Dynamic::List(items)) if nested.max_items == 1 => items
                .first()
                .map(|item| self.block_to_wire(&nested.block, item)),
            (_, Dynamic::List(items)) => Some(Value::Array(
                items
                    .iter()
                    .map(|item| self.block_to_wire(&nested.block, item))
                    .collect(),
            )),
            (_, value @ Dynamic::Map(_)) => Some(self.block_to_wire(&nested.block, value)),
            _ => None,
        }
    }

    fn block_from_wire(&self, block: &Block, wire: &Value) -> Dynamic {
        let empty = Map::new();
        let object = wire.as_object().unwrap_or(&empty);
        let mut out = HashMap::new();

        for attr in &block.attributes {
            let value = match object.get(&self.wire_name(&attr.name)) {
                Some(wire) if !attr.sensitive => attribute_from_wire(&attr.r#type, wire),
                _ => Dynamic::Null,
            };
            out.insert(attr.name.clone(), value);
        }

        for nested in &block.block_types {
            let wire = object.get(&self.wire_name(&nested.type_name));
            out.insert(nested.type_name.clone(), self.nested_from_wire(nested, wire));
        }

        Dynamic::Map(out)
    }

    fn nested_from_wire(&self, nested: &NestedBlock, wire: Option<&Value>) -> Dynamic {
        let wire = wire.filter(|w| !w.is_null());
        match (nested.nesting, wire) {
            (NestingMode::Single, None) => Dynamic::Null,
            (NestingMode::Single, Some(wire)) => self.block_from_wire(&nested.block, wire),
            (_, None) => Dynamic::List(Vec::new()),
            (mode, Some(Value::Array(items))) => {
                let mut items: Vec<Dynamic> = items
                    .iter()
                    .map(|item| self.block_from_wire(&nested.block, item))
                    .collect();
                if mode == NestingMode::Set {
                    canonical_order(&mut items, &self.keys_for(nested));
                }
                Dynamic::List(items)
            }
            (_, Some(wire)) => Dynamic::List(vec![self.block_from_wire(&nested.block, wire)]),
        }
    }

    fn keys_for<'b>(&self, nested: &'b NestedBlock) -> Vec<&'b str> {
        if let Some((_, keys)) = self
            .sort_keys
            .iter()
            .find(|(name, _)| *name == nested.type_name)
        {
            return keys.to_vec();
        }

        nested
            .block
            .attributes
            .iter()
            .filter(|a| {
                matches!(
                    a.r#type,
                    AttributeType::String | AttributeType::Number | AttributeType::Bool
                )
            })
            .map(|a| a.name.as_str())
            .collect()
    }
}

fn number_to_wire(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::Number(Number::from(n as i64))
    } else {
        Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

/// Host value to JSON. Null and unknown values are omitted.
pub fn attribute_to_wire(kind: &AttributeType, value: &Dynamic) -> Option<Value> {
    match (kind, value) {
        (_, Dynamic::Null) | (_, Dynamic::Unknown) => None,
        (_, Dynamic::String(s)) => Some(Value::String(s.clone())),
        (_, Dynamic::Bool(b)) => Some(Value::Bool(*b)),
        (_, Dynamic::Number(n)) => Some(number_to_wire(*n)),
        (AttributeType::List(inner), Dynamic::List(items))
        | (AttributeType::Set(inner), Dynamic::List(items)) => Some(Value::Array(
            items
                .iter()
                .filter_map(|item| attribute_to_wire(inner, item))
                .collect(),
        )),
        (AttributeType::Map(inner), Dynamic::Map(map)) => Some(Value::Object(
            map.iter()
                .filter_map(|(k, v)| attribute_to_wire(inner, v).map(|v| (k.clone(), v)))
                .collect(),
        )),
        (AttributeType::Object(fields), Dynamic::Map(map)) => Some(Value::Object(
            map.iter()
                .filter_map(|(k, v)| {
                    let field = fields.get(k).unwrap_or(&AttributeType::String);
                    attribute_to_wire(field, v).map(|v| (k.clone(), v))
                })
                .collect(),
        )),
        (_, Dynamic::List(items)) => Some(Value::Array(
            items
                .iter()
                .filter_map(|item| attribute_to_wire(&AttributeType::String, item))
                .collect(),
        )),
        (_, Dynamic::Map(_)) => None,
    }
}

/// JSON to host value, coerced to the attribute type
pub fn attribute_from_wire(kind: &AttributeType, wire: &Value) -> Dynamic {
    match (kind, wire) {
        (_, Value::Null) => Dynamic::Null,
        (AttributeType::String, Value::String(s)) => Dynamic::String(s.clone()),
        (AttributeType::String, Value::Number(n)) => Dynamic::String(n.to_string()),
        (AttributeType::String, Value::Bool(b)) => Dynamic::String(b.to_string()),
        (AttributeType::Number, Value::Number(n)) => n.as_f64().map_or(Dynamic::Null, Dynamic::Number),
        (AttributeType::Number, Value::String(s)) => {
            s.parse::<f64>().map_or(Dynamic::Null, Dynamic::Number)
        }
        (AttributeType::Bool, Value::Bool(b)) => Dynamic::Bool(*b),
        (AttributeType::List(inner), Value::Array(items)) => Dynamic::List(
            items
                .iter()
                .map(|item| attribute_from_wire(inner, item))
                .collect(),
        ),
        (AttributeType::Set(inner), Value::Array(items)) => {
            let mut items: Vec<Dynamic> = items
                .iter()
                .map(|item| attribute_from_wire(inner, item))
                .collect();
            canonical_order_scalars(&mut items);
            items.dedup();
            Dynamic::List(items)
        }
        (AttributeType::Map(inner), Value::Object(map)) => Dynamic::Map(
            map.iter()
                .map(|(k, v)| (k.clone(), attribute_from_wire(inner, v)))
                .collect(),
        ),
        (AttributeType::Object(fields), Value::Object(map)) => Dynamic::Map(
            fields
                .iter()
                .map(|(k, field)| {
                    let value = map
                        .get(k)
                        .map_or(Dynamic::Null, |v| attribute_from_wire(field, v));
                    (k.clone(), value)
                })
                .collect(),
        ),
        _ => Dynamic::Null,
    }
}

fn canonical_order_scalars(items: &mut [Dynamic]) {
    items.sort_by_key(super::state::render);
}

pub fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

pub fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if c.is_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.extend(c.to_lowercase());
            prev_lower = false;
        } else {
            out.push(c);
            prev_lower = c.is_lowercase() || c.is_ascii_digit();
        }
    }
    out
}
