//! Provider configuration
//!
//! Connection settings come from the provider block first, then from the
//! `APPGATE_*` environment variables, then from built-in defaults.

use secrecy::SecretString;
use std::collections::HashMap;
use std::time::Duration;
use tfplug::defaults::EnvDefault;
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use tfplug::validators::IntBetween;
use uuid::Uuid;

use crate::api::{ApiRevision, ClientConfig, Credentials};
use crate::resources::state::Attrs;

pub const ENV_ADDRESS: &str = "APPGATE_ADDRESS";
pub const ENV_USERNAME: &str = "APPGATE_USERNAME";
pub const ENV_PASSWORD: &str = "APPGATE_PASSWORD";
pub const ENV_PROVIDER: &str = "APPGATE_PROVIDER";
pub const ENV_INSECURE: &str = "APPGATE_INSECURE";
pub const ENV_TIMEOUT: &str = "APPGATE_TIMEOUT";
pub const ENV_API_VERSION: &str = "APPGATE_API_VERSION";
pub const ENV_DEVICE_ID: &str = "APPGATE_DEVICE_ID";

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 20;

/// Resolved connection settings
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub url: String,
    pub username: String,
    pub password: SecretString,
    pub provider_name: String,
    pub insecure: bool,
    pub timeout: Duration,
    pub preferred_revision: ApiRevision,
    pub device_id: String,
}

impl ProviderConfig {
    pub fn schema() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Manages the configuration of an Appgate SDP collective")
            .attribute(
                AttributeBuilder::new("url", AttributeType::String)
                    .description("Admin API URL, e.g. https://controller.example.com:8443/admin")
                    .optional()
                    .default(EnvDefault::create_required(ENV_ADDRESS))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("username", AttributeType::String)
                    .description("Admin username")
                    .optional()
                    .default(EnvDefault::create_required(ENV_USERNAME))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("password", AttributeType::String)
                    .description("Admin password")
                    .optional()
                    .sensitive()
                    .default(EnvDefault::create_required(ENV_PASSWORD))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("provider", AttributeType::String)
                    .description("Identity provider the admin signs in with")
                    .optional()
                    .default(EnvDefault::create(ENV_PROVIDER, "local"))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("insecure", AttributeType::Bool)
                    .description("Skip TLS certificate verification")
                    .optional()
                    .default(EnvDefault::bool(ENV_INSECURE, true))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("timeout", AttributeType::Number)
                    .description("Timeout of one HTTP request, in seconds")
                    .optional()
                    .validator(IntBetween::create(1, 3600))
                    .default(EnvDefault::number(
                        ENV_TIMEOUT,
                        Some(DEFAULT_TIMEOUT_SECONDS as f64),
                    ))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("preferred_api_version", AttributeType::Number)
                    .description("Highest API revision to negotiate; defaults to the newest known")
                    .optional()
                    .default(EnvDefault::number(ENV_API_VERSION, None))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("device_id", AttributeType::String)
                    .description("UUID identifying this client to the collective")
                    .optional()
                    .default(EnvDefault::create_required(ENV_DEVICE_ID))
                    .build(),
            )
            .build()
    }

    /// Resolves the provider block against the environment. Every problem is
    /// reported, not just the first.
    pub fn from_config(config: &DynamicValue) -> Result<Self, Vec<Diagnostic>> {
        let mut resolved = match &config.value {
            Dynamic::Map(_) => config.clone(),
            _ => DynamicValue::new(Dynamic::Map(HashMap::new())),
        };
        Self::schema().apply_defaults(&mut resolved);
        let attrs = Attrs::of(&resolved);

        let mut diagnostics = vec![];
        let mut required = |name: &str, env: &str| {
            let value = attrs.non_empty_string(name);
            if value.is_none() {
                diagnostics.push(
                    Diagnostic::error(
                        format!("Missing {}", name),
                        format!("Set {} in the provider block or the {} environment variable", name, env),
                    )
                    .with_attribute(AttributePath::new(name)),
                );
            }
            value.unwrap_or_default()
        };
        let url = required("url", ENV_ADDRESS);
        let username = required("username", ENV_USERNAME);
        let password = required("password", ENV_PASSWORD);

        let preferred_revision = match attrs.int("preferred_api_version") {
            None => ApiRevision::MAX,
            Some(number) => match u32::try_from(number).ok().and_then(ApiRevision::from_number) {
                Some(revision) => revision,
                None => {
                    diagnostics.push(
                        Diagnostic::error(
                            "Unsupported API version",
                            format!(
                                "preferred_api_version {} is not between {} and {} (set through the provider block or {})",
                                number,
                                ApiRevision::MIN.number(),
                                ApiRevision::MAX.number(),
                                ENV_API_VERSION
                            ),
                        )
                        .with_attribute(AttributePath::new("preferred_api_version")),
                    );
                    ApiRevision::MAX
                }
            },
        };

        let timeout = attrs
            .int("timeout")
            .filter(|t| *t > 0)
            .map_or(DEFAULT_TIMEOUT_SECONDS, |t| t as u64);

        if !diagnostics.is_empty() {
            return Err(diagnostics);
        }

        Ok(Self {
            url,
            username,
            password: SecretString::from(password),
            provider_name: attrs
                .non_empty_string("provider")
                .unwrap_or_else(|| "local".to_string()),
            insecure: attrs.bool("insecure").unwrap_or(true),
            timeout: Duration::from_secs(timeout),
            preferred_revision,
            device_id: attrs
                .non_empty_string("device_id")
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
        })
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            url: self.url.clone(),
            credentials: Credentials {
                username: self.username.clone(),
                password: self.password.clone(),
                provider_name: self.provider_name.clone(),
                device_id: self.device_id.clone(),
            },
            insecure: self.insecure,
            timeout: self.timeout,
            preferred_revision: self.preferred_revision,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serial_test::serial;
    use std::env;
    use tokio_test::{assert_err, assert_ok};

    const ALL_VARS: [&str; 8] = [
        ENV_ADDRESS,
        ENV_USERNAME,
        ENV_PASSWORD,
        ENV_PROVIDER,
        ENV_INSECURE,
        ENV_TIMEOUT,
        ENV_API_VERSION,
        ENV_DEVICE_ID,
    ];

    fn clear_env() {
        for var in ALL_VARS {
            env::remove_var(var);
        }
    }

    fn block(pairs: Vec<(&str, Dynamic)>) -> DynamicValue {
        DynamicValue::new(Dynamic::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        ))
    }

    #[test]
    #[serial]
    fn environment_fills_the_gaps() {
        clear_env();
        env::set_var(ENV_ADDRESS, "https://ctrl.example.com:8443/admin");
        env::set_var(ENV_USERNAME, "admin");
        env::set_var(ENV_PASSWORD, "from-env");
        env::set_var(ENV_INSECURE, "false");
        env::set_var(ENV_TIMEOUT, "45");
        env::set_var(ENV_API_VERSION, "17");

        let config = assert_ok!(ProviderConfig::from_config(&block(vec![(
            "username",
            Dynamic::from("operator"),
        )])));

        assert_eq!(config.url, "https://ctrl.example.com:8443/admin");
        assert_eq!(config.username, "operator");
        assert_eq!(config.password.expose_secret(), "from-env");
        assert_eq!(config.provider_name, "local");
        assert!(!config.insecure);
        assert_eq!(config.timeout, Duration::from_secs(45));
        assert_eq!(config.preferred_revision, ApiRevision::V17);
        assert!(Uuid::parse_str(&config.device_id).is_ok());
        clear_env();
    }

    #[test]
    #[serial]
    fn defaults_apply_without_environment() {
        clear_env();
        let config = assert_ok!(ProviderConfig::from_config(&block(vec![
            ("url", Dynamic::from("https://ctrl.example.com/admin")),
            ("username", Dynamic::from("admin")),
            ("password", Dynamic::from("admin")),
        ])));

        assert!(config.insecure);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECONDS));
        assert_eq!(config.preferred_revision, ApiRevision::MAX);
    }

    #[test]
    #[serial]
    fn missing_credentials_name_their_variables() {
        clear_env();
        let errors = assert_err!(ProviderConfig::from_config(&DynamicValue::null()));

        assert_eq!(errors.len(), 3);
        assert!(errors[0].detail.contains(ENV_ADDRESS));
        assert!(errors[1].detail.contains(ENV_USERNAME));
        assert!(errors[2].detail.contains(ENV_PASSWORD));
        assert_eq!(errors[2].attribute, Some(AttributePath::new("password")));
    }

    #[test]
    #[serial]
    fn unknown_api_version_is_rejected() {
        clear_env();
        let errors = assert_err!(ProviderConfig::from_config(&block(vec![
            ("url", Dynamic::from("https://ctrl.example.com/admin")),
            ("username", Dynamic::from("admin")),
            ("password", Dynamic::from("admin")),
            ("preferred_api_version", Dynamic::Number(12.0)),
        ])));

        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].attribute,
            Some(AttributePath::new("preferred_api_version"))
        );
    }
}
