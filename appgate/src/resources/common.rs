//! Schema pieces shared by most resources

use tfplug::schema::{Attribute, AttributeBuilder, AttributeType};
use tfplug::types::Diagnostic;

use super::state::{Attrs, StateBuilder};
use crate::api::common::sorted_tags;

/// `id`, `name`, `notes` and `tags`
pub fn base_attributes(kind: &str) -> Vec<Attribute> {
    vec![
        AttributeBuilder::new("id", AttributeType::String)
            .description(&format!("ID of the {}", kind))
            .computed()
            .build(),
        AttributeBuilder::new("name", AttributeType::String)
            .description(&format!("Name of the {}", kind))
            .required()
            .build(),
        AttributeBuilder::new("notes", AttributeType::String)
            .description("Notes for administrators")
            .optional()
            .build(),
        string_set("tags", "Array of tags"),
    ]
}

/// Reads `name`, which every base schema requires
pub fn required_name(config: &Attrs<'_>) -> Result<String, Diagnostic> {
    config
        .non_empty_string("name")
        .ok_or_else(|| Diagnostic::error("Missing name", "The 'name' attribute is required"))
}

pub fn tags(config: &Attrs<'_>) -> Vec<String> {
    sorted_tags(config.strings("tags"))
}

pub fn base_state(id: &str, name: &str, notes: Option<&str>, tags: &[String]) -> StateBuilder {
    StateBuilder::new()
        .string("id", id)
        .string("name", name)
        .opt_string("notes", notes)
        .set("tags", tags.iter().cloned())
}

pub fn optional_string(name: &str, description: &str) -> Attribute {
    AttributeBuilder::new(name, AttributeType::String)
        .description(description)
        .optional()
        .build()
}

pub fn optional_number(name: &str, description: &str) -> Attribute {
    AttributeBuilder::new(name, AttributeType::Number)
        .description(description)
        .optional()
        .build()
}

pub fn optional_bool(name: &str, description: &str) -> Attribute {
    AttributeBuilder::new(name, AttributeType::Bool)
        .description(description)
        .optional()
        .build()
}

pub fn string_set(name: &str, description: &str) -> Attribute {
    AttributeBuilder::new(name, AttributeType::set_of(AttributeType::String))
        .description(description)
        .optional()
        .build()
}

pub fn string_list(name: &str, description: &str) -> Attribute {
    AttributeBuilder::new(name, AttributeType::list_of(AttributeType::String))
        .description(description)
        .optional()
        .build()
}

pub fn secret(name: &str, description: &str) -> Attribute {
    AttributeBuilder::new(name, AttributeType::String)
        .description(description)
        .optional()
        .sensitive()
        .build()
}
