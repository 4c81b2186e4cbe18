//! Turning API errors into host diagnostics

use tfplug::schema::Schema;
use tfplug::types::{AttributePath, Diagnostic};

use super::codec::snake_case;
use crate::api::shape::UnmetGate;
use crate::api::version::ApiRevision;
use crate::api::ApiError;

/// One diagnostic for the error, plus one per validation field that names
/// a top-level attribute of `schema`
pub fn api_error(summary: &str, error: &ApiError, schema: &Schema) -> Vec<Diagnostic> {
    match error {
        ApiError::Validation { envelope, .. } => {
            let mut diags = vec![Diagnostic::error(summary, format!("API error: {}", error))];
            for field in &envelope.errors {
                if let Some(path) = attribute_for_field(&field.field, schema) {
                    diags.push(
                        Diagnostic::error(
                            format!("Invalid value for {}", path),
                            field.message.clone(),
                        )
                        .with_attribute(path),
                    );
                }
            }
            diags
        }
        ApiError::VersionMismatch { attribute, .. } => {
            let diag = Diagnostic::error("Unsupported Appgate SDP version", error.to_string());
            let declared = attribute
                .split('.')
                .next()
                .is_some_and(|name| schema.block.contains(name));
            if declared {
                vec![diag.with_attribute(AttributePath::from_dotted(attribute))]
            } else {
                vec![diag]
            }
        }
        _ => vec![Diagnostic::error(summary, format!("API error: {}", error))],
    }
}

/// `clientInterface.httpsPort` and `privileges[0].scope` name the top-level
/// attributes `client_interface` and `privileges`
fn attribute_for_field(field: &str, schema: &Schema) -> Option<AttributePath> {
    let first = field.split(['.', '[']).next()?;
    let name = snake_case(first);
    schema.block.contains(&name).then(|| AttributePath::new(&name))
}

/// Version-mismatch diagnostics for declared attributes the active revision
/// cannot carry
pub fn unmet_gates(unmet: &[UnmetGate], active: ApiRevision) -> Vec<Diagnostic> {
    unmet
        .iter()
        .map(|u| {
            let error = ApiError::VersionMismatch {
                attribute: u.path.to_string(),
                required: u.gate.since,
                active,
            };
            Diagnostic::error("Unsupported Appgate SDP version", error.to_string())
                .with_attribute(u.path.clone())
        })
        .collect()
}

pub fn not_configured() -> Diagnostic {
    Diagnostic::error(
        "Provider not configured",
        "Provider data was not properly configured",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ErrorEnvelope, FieldError};
    use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};

    fn schema() -> Schema {
        SchemaBuilder::new()
            .attribute(
                AttributeBuilder::new("privileges", AttributeType::String)
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("ip_pool_v4", AttributeType::String)
                    .optional()
                    .build(),
            )
            .build()
    }

    #[test]
    fn validation_fields_map_to_attribute_paths() {
        let error = ApiError::Validation {
            status: 422,
            envelope: ErrorEnvelope {
                id: "unprocessable entity".to_string(),
                message: "Request validation failed".to_string(),
                errors: vec![
                    FieldError {
                        field: "privileges[0].scope".to_string(),
                        message: "scope is not allowed with type View and target Ztp".to_string(),
                    },
                    FieldError {
                        field: "ipPoolV4".to_string(),
                        message: "unknown pool".to_string(),
                    },
                    FieldError {
                        field: "somethingElse".to_string(),
                        message: "ignored".to_string(),
                    },
                ],
            },
        };

        let diags = api_error("Failed to create appgate_administrative_role", &error, &schema());

        assert_eq!(diags.len(), 3);
        assert!(diags[0].detail.contains("scope is not allowed with type View and target Ztp"));
        assert_eq!(diags[1].attribute, Some(AttributePath::new("privileges")));
        assert_eq!(diags[2].attribute, Some(AttributePath::new("ip_pool_v4")));
    }

    #[test]
    fn other_errors_keep_the_summary() {
        let error = ApiError::Server {
            status: 503,
            message: "maintenance".to_string(),
        };

        let diags = api_error("Failed to read appgate_site", &error, &schema());

        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].summary, "Failed to read appgate_site");
        assert!(diags[0].detail.contains("maintenance"));
    }
}
