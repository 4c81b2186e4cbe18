//! Default value providers for attributes
//!
//! Defaults are evaluated when an attribute is absent from configuration.
//! `EnvDefault` is how provider-level connection settings fall back to the
//! environment.
//!
//! ```no_run
//! use tfplug::schema::{AttributeBuilder, AttributeType};
//! use tfplug::defaults::{StaticDefault, EnvDefault};
//!
//! let timeout = AttributeBuilder::new("timeout", AttributeType::Number)
//!     .optional()
//!     .default(StaticDefault::number(20.0))
//!     .build();
//!
//! let url = AttributeBuilder::new("url", AttributeType::String)
//!     .optional()
//!     .default(EnvDefault::create_required("APPGATE_ADDRESS"))
//!     .build();
//! ```

use crate::schema::{Default, DefaultRequest, DefaultResponse};
use crate::types::{Dynamic, DynamicValue};
use std::env;

/// StaticDefault provides a static default value
pub struct StaticDefault {
    value: Dynamic,
}

impl StaticDefault {
    pub fn create(value: Dynamic) -> Box<dyn Default> {
        Box::new(Self { value })
    }

    pub fn string(value: &str) -> Box<dyn Default> {
        Self::create(Dynamic::String(value.to_string()))
    }

    pub fn number(value: f64) -> Box<dyn Default> {
        Self::create(Dynamic::Number(value))
    }

    pub fn bool(value: bool) -> Box<dyn Default> {
        Self::create(Dynamic::Bool(value))
    }

    pub fn list(values: Vec<Dynamic>) -> Box<dyn Default> {
        Self::create(Dynamic::List(values))
    }
}

impl Default for StaticDefault {
    fn description(&self) -> String {
        format!("static default value: {:?}", self.value)
    }

    fn default_value(&self, _request: DefaultRequest) -> DefaultResponse {
        DefaultResponse {
            value: DynamicValue::new(self.value.clone()),
        }
    }
}

/// How an environment variable is interpreted
#[derive(Debug, Clone, Copy, PartialEq)]
enum EnvKind {
    String,
    Bool,
    Number,
}

/// EnvDefault reads the default value from an environment variable
pub struct EnvDefault {
    env_var: String,
    kind: EnvKind,
    fallback: Dynamic,
}

impl EnvDefault {
    /// String variable with a fallback when unset
    pub fn create(env_var: &str, fallback: &str) -> Box<dyn Default> {
        Box::new(Self {
            env_var: env_var.to_string(),
            kind: EnvKind::String,
            fallback: Dynamic::String(fallback.to_string()),
        })
    }

    /// String variable without a fallback; unset yields null
    pub fn create_required(env_var: &str) -> Box<dyn Default> {
        Box::new(Self {
            env_var: env_var.to_string(),
            kind: EnvKind::String,
            fallback: Dynamic::Null,
        })
    }

    /// Boolean variable; accepts `true`/`false`/`1`/`0`
    pub fn bool(env_var: &str, fallback: bool) -> Box<dyn Default> {
        Box::new(Self {
            env_var: env_var.to_string(),
            kind: EnvKind::Bool,
            fallback: Dynamic::Bool(fallback),
        })
    }

    /// Numeric variable
    pub fn number(env_var: &str, fallback: Option<f64>) -> Box<dyn Default> {
        Box::new(Self {
            env_var: env_var.to_string(),
            kind: EnvKind::Number,
            fallback: fallback.map(Dynamic::Number).unwrap_or(Dynamic::Null),
        })
    }

    fn parse(&self, raw: &str) -> Option<Dynamic> {
        let raw = raw.trim();
        match self.kind {
            EnvKind::String => Some(Dynamic::String(raw.to_string())),
            EnvKind::Bool => match raw.to_ascii_lowercase().as_str() {
                "true" | "1" => Some(Dynamic::Bool(true)),
                "false" | "0" => Some(Dynamic::Bool(false)),
                _ => None,
            },
            EnvKind::Number => raw.parse::<f64>().ok().map(Dynamic::Number),
        }
    }
}

impl Default for EnvDefault {
    fn description(&self) -> String {
        match &self.fallback {
            Dynamic::Null => format!("default from environment variable {}", self.env_var),
            fallback => format!(
                "default from environment variable {} (fallback: {:?})",
                self.env_var, fallback
            ),
        }
    }

    fn default_value(&self, _request: DefaultRequest) -> DefaultResponse {
        let value = env::var(&self.env_var)
            .ok()
            .filter(|v| !v.is_empty())
            .and_then(|v| {
                let parsed = self.parse(&v);
                if parsed.is_none() {
                    tracing::warn!(
                        "ignoring unparseable value of environment variable {}",
                        self.env_var
                    );
                }
                parsed
            })
            .unwrap_or_else(|| self.fallback.clone());

        DefaultResponse {
            value: DynamicValue::new(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AttributePath;

    fn value_of(default: Box<dyn Default>) -> Dynamic {
        default
            .default_value(DefaultRequest {
                path: AttributePath::new("test"),
            })
            .value
            .value
    }

    #[test]
    fn static_defaults() {
        assert_eq!(
            value_of(StaticDefault::string("local")),
            Dynamic::String("local".to_string())
        );
        assert_eq!(value_of(StaticDefault::number(443.0)), Dynamic::Number(443.0));
        assert_eq!(value_of(StaticDefault::bool(true)), Dynamic::Bool(true));
        assert_eq!(
            value_of(StaticDefault::list(vec![Dynamic::from("a")])),
            Dynamic::List(vec![Dynamic::from("a")])
        );
    }

    #[test]
    fn env_default_with_fallback() {
        let default = EnvDefault::create("TFPLUG_TEST_NONEXISTENT", "fallback-value");
        assert_eq!(
            value_of(default),
            Dynamic::String("fallback-value".to_string())
        );
    }

    #[test]
    fn env_default_with_value() {
        env::set_var("TFPLUG_TEST_VAR", "env-value");
        let default = EnvDefault::create("TFPLUG_TEST_VAR", "fallback");
        assert_eq!(value_of(default), Dynamic::String("env-value".to_string()));
        env::remove_var("TFPLUG_TEST_VAR");
    }

    #[test]
    fn env_default_required_missing() {
        let default = EnvDefault::create_required("TFPLUG_TEST_MISSING");
        assert_eq!(value_of(default), Dynamic::Null);
    }

    #[test]
    fn env_default_parses_bools_and_numbers() {
        env::set_var("TFPLUG_TEST_BOOL", "FALSE");
        env::set_var("TFPLUG_TEST_NUMBER", "45");
        env::set_var("TFPLUG_TEST_BAD_BOOL", "maybe");

        assert_eq!(
            value_of(EnvDefault::bool("TFPLUG_TEST_BOOL", true)),
            Dynamic::Bool(false)
        );
        assert_eq!(
            value_of(EnvDefault::number("TFPLUG_TEST_NUMBER", Some(20.0))),
            Dynamic::Number(45.0)
        );
        assert_eq!(
            value_of(EnvDefault::bool("TFPLUG_TEST_BAD_BOOL", true)),
            Dynamic::Bool(true)
        );

        env::remove_var("TFPLUG_TEST_BOOL");
        env::remove_var("TFPLUG_TEST_NUMBER");
        env::remove_var("TFPLUG_TEST_BAD_BOOL");
    }
}
