//! Acceptance-test helpers
//!
//! Version constraints gate scenarios on the peer version, and
//! `import_state_verify` compares the state produced by create with the state
//! produced by importing the same object.

use crate::error::{Result, TfplugError};
use crate::types::{Dynamic, DynamicValue};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// A dotted version such as `6.2` or `6.2.1-30223-release`.
/// Pre-release and build suffixes are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim().trim_start_matches('v');
        let core = trimmed
            .split(|c| c == '-' || c == '+')
            .next()
            .unwrap_or_default();

        let mut parts = [0u64; 3];
        let mut seen = 0;
        for (idx, segment) in core.split('.').enumerate() {
            if idx >= parts.len() {
                break;
            }
            parts[idx] = segment.parse().map_err(|_| {
                TfplugError::InvalidVersion(input.to_string())
            })?;
            seen += 1;
        }
        if seen == 0 {
            return Err(TfplugError::InvalidVersion(input.to_string()));
        }

        Ok(Self::new(parts[0], parts[1], parts[2]))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Operator {
    fn holds(self, ordering: Ordering) -> bool {
        match self {
            Operator::Eq => ordering == Ordering::Equal,
            Operator::NotEq => ordering != Ordering::Equal,
            Operator::Gt => ordering == Ordering::Greater,
            Operator::Gte => ordering != Ordering::Less,
            Operator::Lt => ordering == Ordering::Less,
            Operator::Lte => ordering != Ordering::Greater,
        }
    }
}

/// Comma-separated comparison list, e.g. `>= 6.1, < 6.2`. Every clause must
/// hold for the constraint to match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConstraint {
    clauses: Vec<(Operator, Version)>,
}

impl VersionConstraint {
    pub fn parse(input: &str) -> Result<Self> {
        let mut clauses = Vec::new();

        for raw in input.split(',') {
            let clause = raw.trim();
            if clause.is_empty() {
                continue;
            }
            let (op, rest) = [
                (">=", Operator::Gte),
                ("<=", Operator::Lte),
                ("!=", Operator::NotEq),
                (">", Operator::Gt),
                ("<", Operator::Lt),
                ("=", Operator::Eq),
            ]
            .iter()
            .find_map(|(prefix, op)| clause.strip_prefix(prefix).map(|rest| (*op, rest)))
            .unwrap_or((Operator::Eq, clause));

            clauses.push((op, Version::parse(rest)?));
        }

        if clauses.is_empty() {
            return Err(TfplugError::InvalidConstraint(input.to_string()));
        }

        Ok(Self { clauses })
    }

    pub fn matches(&self, version: &Version) -> bool {
        self.clauses
            .iter()
            .all(|(op, bound)| op.holds(version.cmp(bound)))
    }
}

/// Flattens a state tree into dotted keys. List elements are addressed by
/// index (`portal.0.https_p12.0.content`) and every list also records its
/// length under `<key>.#`. Null and unknown leaves are skipped.
pub fn flatten_state(state: &DynamicValue) -> BTreeMap<String, String> {
    fn walk(value: &Dynamic, prefix: &str, out: &mut BTreeMap<String, String>) {
        let key = |name: &str| {
            if prefix.is_empty() {
                name.to_string()
            } else {
                format!("{}.{}", prefix, name)
            }
        };

        match value {
            Dynamic::Null | Dynamic::Unknown => {}
            Dynamic::Bool(b) => {
                out.insert(prefix.to_string(), b.to_string());
            }
            Dynamic::Number(n) => {
                out.insert(prefix.to_string(), n.to_string());
            }
            Dynamic::String(s) => {
                out.insert(prefix.to_string(), s.clone());
            }
            Dynamic::List(items) => {
                out.insert(key("#"), items.len().to_string());
                for (idx, item) in items.iter().enumerate() {
                    walk(item, &key(&idx.to_string()), out);
                }
            }
            Dynamic::Map(map) => {
                for (name, item) in map {
                    walk(item, &key(name), out);
                }
            }
        }
    }

    let mut out = BTreeMap::new();
    walk(&state.value, "", &mut out);
    out
}

/// Removes numeric segments so `portal.0.https_p12.0.content` can be matched
/// by `portal.https_p12.content`.
fn strip_indices(key: &str) -> String {
    key.split('.')
        .filter(|segment| segment.parse::<usize>().is_err())
        .collect::<Vec<_>>()
        .join(".")
}

fn is_ignored(key: &str, ignore: &[&str]) -> bool {
    let bare = strip_indices(key);
    ignore.iter().any(|prefix| {
        [key, bare.as_str()].iter().any(|candidate| {
            *candidate == *prefix
                || candidate
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with('.'))
        })
    })
}

/// Compares the state written by create with the state produced by import.
///
/// Keys matching an ignore entry (by prefix, with or without list indices)
/// are skipped. Returns one line per differing key.
pub fn import_state_verify(
    created: &DynamicValue,
    imported: &DynamicValue,
    ignore: &[&str],
) -> std::result::Result<(), Vec<String>> {
    let created = flatten_state(created);
    let imported = flatten_state(imported);

    let mut differences = Vec::new();
    let keys: std::collections::BTreeSet<&String> = created.keys().chain(imported.keys()).collect();
    for key in keys {
        if is_ignored(key, ignore) {
            continue;
        }
        match (created.get(key), imported.get(key)) {
            (Some(a), Some(b)) if a == b => {}
            (a, b) => differences.push(format!(
                "{}: created={} imported={}",
                key,
                a.map(String::as_str).unwrap_or("<absent>"),
                b.map(String::as_str).unwrap_or("<absent>")
            )),
        }
    }

    if differences.is_empty() {
        Ok(())
    } else {
        Err(differences)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AttributePath;

    #[test]
    fn parses_release_versions() {
        assert_eq!(
            Version::parse("6.2.1-30223-release").unwrap(),
            Version::new(6, 2, 1)
        );
        assert_eq!(Version::parse("6.0").unwrap(), Version::new(6, 0, 0));
        tokio_test::assert_err!(Version::parse("six"));
    }

    #[test]
    fn constraint_ranges() {
        let constraint = VersionConstraint::parse(">= 6.1, < 6.2").unwrap();
        assert!(constraint.matches(&Version::new(6, 1, 3)));
        assert!(!constraint.matches(&Version::new(6, 2, 0)));
        assert!(!constraint.matches(&Version::new(6, 0, 0)));

        let at_least = VersionConstraint::parse(">= 6.0").unwrap();
        assert!(at_least.matches(&Version::new(6, 4, 0)));
        assert!(!at_least.matches(&Version::new(5, 5, 7)));
    }

    #[test]
    fn bare_version_means_equal() {
        let constraint = VersionConstraint::parse("6.2").unwrap();
        assert!(constraint.matches(&Version::new(6, 2, 0)));
        assert!(!constraint.matches(&Version::new(6, 2, 1)));
    }

    #[test]
    fn flatten_addresses_list_elements() {
        let mut state = DynamicValue::object();
        state
            .set_list(
                &AttributePath::new("tags"),
                vec![Dynamic::from("a"), Dynamic::from("b")],
            )
            .unwrap();

        let flat = flatten_state(&state);
        assert_eq!(flat.get("tags.#").map(String::as_str), Some("2"));
        assert_eq!(flat.get("tags.1").map(String::as_str), Some("b"));
    }

    #[test]
    fn ignore_entries_match_with_or_without_indices() {
        assert!(is_ignored("portal.0.https_p12.0.content", &["portal.https_p12.content"]));
        assert!(is_ignored("portal.0.https_p12.0.content", &["portal.0.https_p12"]));
        assert!(is_ignored("seed_file", &["seed_file"]));
        assert!(!is_ignored("seed_file_name", &["seed_file"]));
    }
}
