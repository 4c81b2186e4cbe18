//! Built-in attribute validators
//!
//! Validators receive one scalar value at a time; collection attributes are
//! validated element by element by the schema walker.

use crate::schema::{Validator, ValidatorRequest, ValidatorResponse};
use crate::types::{AttributePath, Diagnostic, Dynamic};
use regex::Regex;
use std::net::IpAddr;

fn invalid(path: &AttributePath, summary: &str, detail: String) -> ValidatorResponse {
    ValidatorResponse {
        diagnostics: vec![Diagnostic::error(summary, detail).with_attribute(path.clone())],
    }
}

fn ok() -> ValidatorResponse {
    ValidatorResponse {
        diagnostics: Vec::new(),
    }
}

/// Accepts only one of a fixed set of strings
pub struct StringOneOf {
    allowed: Vec<String>,
}

impl StringOneOf {
    pub fn create(allowed: &[&str]) -> Box<dyn Validator> {
        Box::new(Self {
            allowed: allowed.iter().map(|s| s.to_string()).collect(),
        })
    }
}

impl Validator for StringOneOf {
    fn description(&self) -> String {
        format!("value must be one of: {}", self.allowed.join(", "))
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        match &request.config_value.value {
            Dynamic::String(s) if !self.allowed.iter().any(|a| a == s) => invalid(
                &request.path,
                "Invalid attribute value",
                format!(
                    "{} must be one of [{}], got \"{}\"",
                    request.path,
                    self.allowed.join(", "),
                    s
                ),
            ),
            _ => ok(),
        }
    }
}

/// Bounds the length of a string
pub struct StringLength {
    min: Option<usize>,
    max: Option<usize>,
}

impl StringLength {
    pub fn create(min: Option<usize>, max: Option<usize>) -> Box<dyn Validator> {
        Box::new(Self { min, max })
    }
}

impl Validator for StringLength {
    fn description(&self) -> String {
        format!("string length must be within {:?}..{:?}", self.min, self.max)
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let Dynamic::String(s) = &request.config_value.value else {
            return ok();
        };
        let len = s.chars().count();
        if let Some(min) = self.min {
            if len < min {
                return invalid(
                    &request.path,
                    "Invalid attribute value length",
                    format!("{} must have minimum length of {}, got {}", request.path, min, len),
                );
            }
        }
        if let Some(max) = self.max {
            if len > max {
                return invalid(
                    &request.path,
                    "Invalid attribute value length",
                    format!("{} must have maximum length of {}, got {}", request.path, max, len),
                );
            }
        }
        ok()
    }
}

/// Requires a string to match a regular expression
pub struct StringMatches {
    pattern: Regex,
    description: String,
}

impl StringMatches {
    pub fn create(pattern: Regex, description: &str) -> Box<dyn Validator> {
        Box::new(Self {
            pattern,
            description: description.to_string(),
        })
    }
}

impl Validator for StringMatches {
    fn description(&self) -> String {
        format!("value must be {}", self.description)
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        match &request.config_value.value {
            Dynamic::String(s) if !self.pattern.is_match(s) => invalid(
                &request.path,
                "Invalid attribute value",
                format!("{} must be {}, got \"{}\"", request.path, self.description, s),
            ),
            _ => ok(),
        }
    }
}

/// Requires a whole number within an inclusive range
pub struct IntBetween {
    min: i64,
    max: i64,
}

impl IntBetween {
    pub fn create(min: i64, max: i64) -> Box<dyn Validator> {
        Box::new(Self { min, max })
    }
}

impl Validator for IntBetween {
    fn description(&self) -> String {
        format!("value must be a whole number between {} and {}", self.min, self.max)
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let Dynamic::Number(n) = request.config_value.value else {
            return ok();
        };
        if n.fract() != 0.0 || n < self.min as f64 || n > self.max as f64 {
            return invalid(
                &request.path,
                "Invalid attribute value",
                format!(
                    "{} must be a whole number between {} and {}, got {}",
                    request.path, self.min, self.max, n
                ),
            );
        }
        ok()
    }
}

/// Requires an IPv4 or IPv6 address
pub struct IsIpAddress;

impl IsIpAddress {
    pub fn create() -> Box<dyn Validator> {
        Box::new(Self)
    }
}

impl Validator for IsIpAddress {
    fn description(&self) -> String {
        "value must be a valid IP address".to_string()
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        match &request.config_value.value {
            Dynamic::String(s) if s.parse::<IpAddr>().is_err() => invalid(
                &request.path,
                "Invalid IP address",
                format!("{} must be a valid IP address, got \"{}\"", request.path, s),
            ),
            _ => ok(),
        }
    }
}

/// Requires CIDR notation such as `10.0.0.0/16` or `2001:db8::/32`
pub struct IsCidr;

impl IsCidr {
    pub fn create() -> Box<dyn Validator> {
        Box::new(Self)
    }

    fn is_cidr(value: &str) -> bool {
        let Some((addr, prefix)) = value.split_once('/') else {
            return false;
        };
        let Ok(addr) = addr.parse::<IpAddr>() else {
            return false;
        };
        let max = if addr.is_ipv4() { 32 } else { 128 };
        matches!(prefix.parse::<u8>(), Ok(p) if p <= max)
    }
}

impl Validator for IsCidr {
    fn description(&self) -> String {
        "value must be a network in CIDR notation".to_string()
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        match &request.config_value.value {
            Dynamic::String(s) if !Self::is_cidr(s) => invalid(
                &request.path,
                "Invalid CIDR notation",
                format!("{} must be a network in CIDR notation, got \"{}\"", request.path, s),
            ),
            _ => ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DynamicValue;

    fn check(validator: &dyn Validator, value: Dynamic) -> Vec<Diagnostic> {
        validator
            .validate(ValidatorRequest {
                config_value: DynamicValue::new(value),
                path: AttributePath::new("field"),
            })
            .diagnostics
    }

    #[test]
    fn one_of_accepts_listed_values_only() {
        let v = StringOneOf::create(&["Disabled", "TCP", "UDP-TCP"]);
        assert!(check(v.as_ref(), Dynamic::from("TCP")).is_empty());

        let diags = check(v.as_ref(), Dynamic::from("UDP"));
        assert_eq!(diags.len(), 1);
        assert!(diags[0].detail.contains("Disabled, TCP, UDP-TCP"));
    }

    #[test]
    fn string_length_bounds() {
        let v = StringLength::create(Some(3), Some(5));
        assert!(check(v.as_ref(), Dynamic::from("abcd")).is_empty());
        assert!(check(v.as_ref(), Dynamic::from("ab"))[0]
            .detail
            .contains("minimum length"));
        assert!(check(v.as_ref(), Dynamic::from("abcdef"))[0]
            .detail
            .contains("maximum length"));
    }

    #[test]
    fn string_matches_pattern() {
        let v = StringMatches::create(Regex::new(r"^\d+$").unwrap(), "numeric");
        assert!(check(v.as_ref(), Dynamic::from("123")).is_empty());
        assert_eq!(check(v.as_ref(), Dynamic::from("12a")).len(), 1);
    }

    #[test]
    fn int_between_rejects_fractions_and_out_of_range() {
        let v = IntBetween::create(1, 65535);
        assert!(check(v.as_ref(), Dynamic::Number(443.0)).is_empty());
        assert_eq!(check(v.as_ref(), Dynamic::Number(0.0)).len(), 1);
        assert_eq!(check(v.as_ref(), Dynamic::Number(1.5)).len(), 1);
    }

    #[test]
    fn ip_address_and_cidr() {
        let ip = IsIpAddress::create();
        assert!(check(ip.as_ref(), Dynamic::from("10.0.0.1")).is_empty());
        assert!(check(ip.as_ref(), Dynamic::from("2001:800::1")).is_empty());
        assert_eq!(check(ip.as_ref(), Dynamic::from("10.0.0.300")).len(), 1);

        let cidr = IsCidr::create();
        assert!(check(cidr.as_ref(), Dynamic::from("10.0.0.0/16")).is_empty());
        assert!(check(cidr.as_ref(), Dynamic::from("2001:db8::/32")).is_empty());
        assert_eq!(check(cidr.as_ref(), Dynamic::from("10.0.0.0/33")).len(), 1);
        assert_eq!(check(cidr.as_ref(), Dynamic::from("10.0.0.0")).len(), 1);
    }

    #[test]
    fn non_string_values_are_ignored_by_string_validators() {
        let v = StringOneOf::create(&["a"]);
        assert!(check(v.as_ref(), Dynamic::Bool(true)).is_empty());
    }
}
