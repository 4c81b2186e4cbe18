//! Schema types and builders for tfplug
//!
//! A schema is a tree of attributes and nested blocks. Besides describing the
//! shape to the host, the schema can check a configuration against its
//! required flags, block cardinality and validators, and fill in defaults.

use crate::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use std::collections::HashMap;
use std::sync::Arc;

/// AttributeType defines the semantic type of an attribute
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeType {
    String,
    /// Integers are numbers too
    Number,
    Bool,
    /// Ordered, allows duplicates
    List(Box<AttributeType>),
    /// Order-indifferent, no duplicates
    Set(Box<AttributeType>),
    /// String keys only
    Map(Box<AttributeType>),
    Object(HashMap<String, AttributeType>),
}

impl AttributeType {
    pub fn list_of(inner: AttributeType) -> Self {
        AttributeType::List(Box::new(inner))
    }

    pub fn set_of(inner: AttributeType) -> Self {
        AttributeType::Set(Box::new(inner))
    }

    pub fn map_of(inner: AttributeType) -> Self {
        AttributeType::Map(Box::new(inner))
    }

    fn is_collection(&self) -> bool {
        matches!(self, AttributeType::List(_) | AttributeType::Set(_))
    }
}

/// Schema is returned by providers, resources and data sources.
/// Version is used for state migration.
#[derive(Debug, Clone)]
pub struct Schema {
    pub version: i64,
    pub block: Block,
}

/// Block represents a configuration block
#[derive(Debug, Clone, Default)]
pub struct Block {
    pub attributes: Vec<Attribute>,
    pub block_types: Vec<NestedBlock>,
    pub description: String,
    pub deprecated: bool,
}

impl Block {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn nested_block(&self, name: &str) -> Option<&NestedBlock> {
        self.block_types.iter().find(|b| b.type_name == name)
    }

    /// True when `name` is an attribute or a nested block of this block
    pub fn contains(&self, name: &str) -> bool {
        self.attribute(name).is_some() || self.nested_block(name).is_some()
    }

    fn validate(&self, value: &Dynamic, path: &AttributePath, diags: &mut Vec<Diagnostic>) {
        let empty = HashMap::new();
        let map = value.as_map().unwrap_or(&empty);

        for attr in &self.attributes {
            let attr_path = child_path(path, &attr.name);
            match map.get(&attr.name) {
                None | Some(Dynamic::Null) => {
                    if attr.required && attr.default.is_none() {
                        diags.push(
                            Diagnostic::error(
                                "Missing required argument",
                                format!("The argument \"{}\" is required, but no definition was found.", attr.name),
                            )
                            .with_attribute(attr_path),
                        );
                    }
                }
                Some(Dynamic::Unknown) => {}
                Some(v) => attr.run_validators(v, &attr_path, diags),
            }
        }

        for nested in &self.block_types {
            let block_path = child_path(path, &nested.type_name);
            nested.validate(map.get(&nested.type_name), &block_path, diags);
        }
    }

    fn apply_defaults(&self, value: &mut Dynamic, path: &AttributePath) {
        let Dynamic::Map(map) = value else {
            return;
        };

        for attr in &self.attributes {
            let Some(default) = &attr.default else {
                continue;
            };
            let absent = matches!(map.get(&attr.name), None | Some(Dynamic::Null));
            if absent {
                let response = default.default_value(DefaultRequest {
                    path: child_path(path, &attr.name),
                });
                if !response.value.is_null() {
                    map.insert(attr.name.clone(), response.value.value);
                }
            }
        }

        for nested in &self.block_types {
            let block_path = child_path(path, &nested.type_name);
            match map.get_mut(&nested.type_name) {
                Some(Dynamic::List(items)) => {
                    for (i, item) in items.iter_mut().enumerate() {
                        nested
                            .block
                            .apply_defaults(item, &block_path.clone().index(i as i64));
                    }
                }
                Some(item @ Dynamic::Map(_)) => nested.block.apply_defaults(item, &block_path),
                _ => {}
            }
        }
    }
}

fn child_path(parent: &AttributePath, name: &str) -> AttributePath {
    parent.clone().attribute(name)
}

/// Attribute represents a single configuration attribute
#[derive(Clone)]
pub struct Attribute {
    pub name: String,
    pub r#type: AttributeType,
    pub description: String,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    /// Changing the value replaces the resource instead of updating it
    pub force_new: bool,
    pub validators: Vec<Arc<dyn Validator>>,
    pub default: Option<Arc<dyn Default>>,
    pub deprecated: bool,
}

impl Attribute {
    fn run_validators(&self, value: &Dynamic, path: &AttributePath, diags: &mut Vec<Diagnostic>) {
        if self.validators.is_empty() {
            return;
        }

        // Collections of scalars are validated element by element
        let elements: Vec<(AttributePath, &Dynamic)> = match (value, self.r#type.is_collection()) {
            (Dynamic::List(items), true) => items
                .iter()
                .enumerate()
                .map(|(i, v)| (path.clone().index(i as i64), v))
                .collect(),
            _ => vec![(path.clone(), value)],
        };

        for (element_path, element) in elements {
            if !element.is_present() {
                continue;
            }
            for validator in &self.validators {
                let response = validator.validate(ValidatorRequest {
                    config_value: DynamicValue::new(element.clone()),
                    path: element_path.clone(),
                });
                diags.extend(response.diagnostics);
            }
        }
    }
}

impl std::fmt::Debug for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("type", &self.r#type)
            .field("required", &self.required)
            .field("optional", &self.optional)
            .field("computed", &self.computed)
            .field("sensitive", &self.sensitive)
            .field("force_new", &self.force_new)
            .field(
                "validators",
                &format!("{} validators", self.validators.len()),
            )
            .field("default", &self.default.is_some())
            .finish()
    }
}

/// NestedBlock represents a nested configuration block
#[derive(Debug, Clone)]
pub struct NestedBlock {
    pub type_name: String,
    pub block: Block,
    pub nesting: NestingMode,
    pub min_items: i64,
    pub max_items: i64,
}

impl NestedBlock {
    fn validate(&self, value: Option<&Dynamic>, path: &AttributePath, diags: &mut Vec<Diagnostic>) {
        let items: Vec<(AttributePath, &Dynamic)> = match (self.nesting, value) {
            (_, None) | (_, Some(Dynamic::Null)) => Vec::new(),
            (_, Some(Dynamic::Unknown)) => return,
            (NestingMode::Single, Some(v)) => vec![(path.clone(), v)],
            (_, Some(Dynamic::List(list))) => list
                .iter()
                .enumerate()
                .map(|(i, v)| (path.clone().index(i as i64), v))
                .collect(),
            (_, Some(v)) => vec![(path.clone(), v)],
        };

        let count = items.len() as i64;
        if count < self.min_items {
            let summary = if self.min_items == 1 && self.max_items == 1 {
                "Missing required block".to_string()
            } else {
                "Insufficient blocks".to_string()
            };
            diags.push(
                Diagnostic::error(
                    summary,
                    format!(
                        "At least {} \"{}\" blocks are required.",
                        self.min_items, self.type_name
                    ),
                )
                .with_attribute(path.clone()),
            );
        }
        if self.max_items > 0 && count > self.max_items {
            diags.push(
                Diagnostic::error(
                    "Too many blocks",
                    format!(
                        "No more than {} \"{}\" blocks are allowed.",
                        self.max_items, self.type_name
                    ),
                )
                .with_attribute(path.clone()),
            );
        }

        for (item_path, item) in items {
            self.block.validate(item, &item_path, diags);
        }
    }
}

/// NestingMode defines how nested blocks are structured
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NestingMode {
    /// Exactly one object, stored as a map
    Single,
    /// Ordered blocks, stored as a list
    List,
    /// Order-indifferent blocks, stored as a list in canonical order
    Set,
}

/// Validator performs validation on attribute values during planning
pub trait Validator: Send + Sync {
    fn description(&self) -> String;
    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse;
}

pub struct ValidatorRequest {
    pub config_value: DynamicValue,
    pub path: AttributePath,
}

pub struct ValidatorResponse {
    pub diagnostics: Vec<Diagnostic>,
}

/// Default provides values for optional attributes absent from configuration
pub trait Default: Send + Sync {
    fn description(&self) -> String;
    fn default_value(&self, request: DefaultRequest) -> DefaultResponse;
}

pub struct DefaultRequest {
    pub path: AttributePath,
}

pub struct DefaultResponse {
    pub value: DynamicValue,
}

/// AttributeBuilder provides a fluent API for building attributes
pub struct AttributeBuilder {
    attribute: Attribute,
}

impl AttributeBuilder {
    pub fn new(name: &str, type_: AttributeType) -> Self {
        Self {
            attribute: Attribute {
                name: name.to_string(),
                r#type: type_,
                description: String::new(),
                required: false,
                optional: false,
                computed: false,
                sensitive: false,
                force_new: false,
                validators: Vec::new(),
                default: None,
                deprecated: false,
            },
        }
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.attribute.description = desc.to_string();
        self
    }

    pub fn required(mut self) -> Self {
        self.attribute.required = true;
        self.attribute.optional = false;
        self
    }

    pub fn optional(mut self) -> Self {
        self.attribute.optional = true;
        self.attribute.required = false;
        self
    }

    /// Computed attributes are derived by the peer. Combined with `optional`
    /// the user may set them, and the peer fills them in otherwise.
    pub fn computed(mut self) -> Self {
        self.attribute.computed = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.attribute.sensitive = true;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.attribute.force_new = true;
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.attribute.deprecated = true;
        self
    }

    pub fn validator(mut self, validator: Box<dyn Validator>) -> Self {
        self.attribute.validators.push(Arc::from(validator));
        self
    }

    pub fn default(mut self, default: Box<dyn Default>) -> Self {
        self.attribute.default = Some(Arc::from(default));
        self
    }

    pub fn build(self) -> Attribute {
        self.attribute
    }
}

/// NestedBlockBuilder provides a fluent API for nested blocks
pub struct NestedBlockBuilder {
    nested: NestedBlock,
}

impl NestedBlockBuilder {
    pub fn new(type_name: &str, nesting: NestingMode) -> Self {
        Self {
            nested: NestedBlock {
                type_name: type_name.to_string(),
                block: Block::default(),
                nesting,
                min_items: 0,
                max_items: 0,
            },
        }
    }

    /// A list block holding at most one element
    pub fn single_list(type_name: &str) -> Self {
        Self::new(type_name, NestingMode::List).max_items(1)
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.nested.block.description = desc.to_string();
        self
    }

    pub fn min_items(mut self, min: i64) -> Self {
        self.nested.min_items = min;
        self
    }

    pub fn max_items(mut self, max: i64) -> Self {
        self.nested.max_items = max;
        self
    }

    /// Requires exactly one occurrence
    pub fn required(self) -> Self {
        self.min_items(1).max_items(1)
    }

    pub fn attribute(mut self, attr: Attribute) -> Self {
        self.nested.block.attributes.push(attr);
        self
    }

    pub fn block(mut self, block: NestedBlock) -> Self {
        self.nested.block.block_types.push(block);
        self
    }

    pub fn build(self) -> NestedBlock {
        self.nested
    }
}

/// SchemaBuilder provides a fluent API for building schemas
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self {
            schema: Schema {
                version: 0,
                block: Block::default(),
            },
        }
    }

    pub fn version(mut self, version: i64) -> Self {
        self.schema.version = version;
        self
    }

    pub fn attribute(mut self, attr: Attribute) -> Self {
        self.schema.block.attributes.push(attr);
        self
    }

    pub fn attributes(mut self, attrs: impl IntoIterator<Item = Attribute>) -> Self {
        self.schema.block.attributes.extend(attrs);
        self
    }

    pub fn block(mut self, block: NestedBlock) -> Self {
        self.schema.block.block_types.push(block);
        self
    }

    pub fn blocks(mut self, blocks: impl IntoIterator<Item = NestedBlock>) -> Self {
        self.schema.block.block_types.extend(blocks);
        self
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.schema.block.description = desc.to_string();
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.schema.block.deprecated = true;
        self
    }

    pub fn build(self) -> Schema {
        self.schema
    }
}

impl std::default::Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Schema {
    /// Checks required attributes, block cardinality and validators
    pub fn validate_config(&self, config: &DynamicValue) -> Vec<Diagnostic> {
        let mut diags = Vec::new();
        if config.is_null() || config.is_unknown() {
            return diags;
        }
        self.block
            .validate(&config.value, &AttributePath::root(), &mut diags);
        diags
    }

    /// Fills absent optional attributes with their defaults, recursing into
    /// nested blocks. Values already present are left alone.
    pub fn apply_defaults(&self, value: &mut DynamicValue) {
        self.block
            .apply_defaults(&mut value.value, &AttributePath::root());
    }

    /// Dotted paths of every sensitive attribute, e.g. `portal.https_p12.content`
    pub fn sensitive_paths(&self) -> Vec<String> {
        fn walk(block: &Block, prefix: &str, out: &mut Vec<String>) {
            for attr in block.attributes.iter().filter(|a| a.sensitive) {
                out.push(format!("{}{}", prefix, attr.name));
            }
            for nested in &block.block_types {
                walk(
                    &nested.block,
                    &format!("{}{}.", prefix, nested.type_name),
                    out,
                );
            }
        }

        let mut out = Vec::new();
        walk(&self.block, "", &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::StaticDefault;
    use crate::validators::StringOneOf;

    fn site_like_schema() -> Schema {
        SchemaBuilder::new()
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .required()
                    .build(),
            )
            .block(
                NestedBlockBuilder::new("client_interface", NestingMode::Single)
                    .required()
                    .attribute(
                        AttributeBuilder::new("https_port", AttributeType::Number)
                            .optional()
                            .default(StaticDefault::number(443.0))
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("override_spa_mode", AttributeType::String)
                            .optional()
                            .validator(StringOneOf::create(&["Disabled", "TCP", "UDP-TCP"]))
                            .build(),
                    )
                    .build(),
            )
            .build()
    }

    #[test]
    fn attribute_builder_creates_required_string() {
        let attr = AttributeBuilder::new("name", AttributeType::String)
            .description("The name of the resource")
            .required()
            .build();

        assert_eq!(attr.name, "name");
        assert!(matches!(attr.r#type, AttributeType::String));
        assert!(attr.required);
        assert!(!attr.optional);
        assert_eq!(attr.description, "The name of the resource");
    }

    #[test]
    fn cloned_attributes_keep_validators() {
        let attr = AttributeBuilder::new("mode", AttributeType::String)
            .validator(StringOneOf::create(&["a"]))
            .build();
        assert_eq!(attr.clone().validators.len(), 1);
    }

    #[test]
    fn missing_required_attribute_and_block_are_reported() {
        let schema = site_like_schema();
        let config = DynamicValue::object();

        let diags = schema.validate_config(&config);
        assert_eq!(diags.len(), 2);
        assert!(diags.iter().any(|d| d.summary == "Missing required argument"
            && d.attribute == Some(AttributePath::new("name"))));
        assert!(diags.iter().any(|d| d.summary == "Missing required block"));
    }

    #[test]
    fn validators_run_inside_nested_blocks() {
        let schema = site_like_schema();
        let mut config = DynamicValue::object();
        config
            .set_string(&AttributePath::new("name"), "gw".to_string())
            .unwrap();
        config
            .set_string(
                &AttributePath::new("client_interface").attribute("override_spa_mode"),
                "UDP".to_string(),
            )
            .unwrap();

        let diags = schema.validate_config(&config);
        assert_eq!(diags.len(), 1);
        assert_eq!(
            diags[0].attribute,
            Some(AttributePath::new("client_interface").attribute("override_spa_mode"))
        );
    }

    #[test]
    fn defaults_fill_nested_blocks() {
        let schema = site_like_schema();
        let mut config = DynamicValue::object();
        config
            .set_map(&AttributePath::new("client_interface"), HashMap::new())
            .unwrap();

        schema.apply_defaults(&mut config);

        assert_eq!(
            config
                .get_number(&AttributePath::new("client_interface").attribute("https_port"))
                .unwrap(),
            443.0
        );
    }

    #[test]
    fn sensitive_paths_walk_blocks() {
        let schema = SchemaBuilder::new()
            .block(
                NestedBlockBuilder::single_list("portal")
                    .block(
                        NestedBlockBuilder::single_list("https_p12")
                            .attribute(
                                AttributeBuilder::new("content", AttributeType::String)
                                    .sensitive()
                                    .build(),
                            )
                            .build(),
                    )
                    .build(),
            )
            .build();

        assert_eq!(schema.sensitive_paths(), vec!["portal.https_p12.content"]);
    }
}
