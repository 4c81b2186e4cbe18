//! Version-gated wire shapes
//!
//! A resource's request body is the same JSON document on every revision,
//! minus the fields a given revision does not know. Each collection declares
//! those fields once, with the revision that introduced them and, for fields
//! the peer later dropped, the revision that removed them.

use serde_json::Value;
use tfplug::types::{AttributePath, Dynamic};

use super::version::ApiRevision;

/// A field that exists only on some revisions
#[derive(Debug, Clone, Copy)]
pub struct FieldGate {
    /// Dotted camelCase path in the request body, e.g. `clientInterface.overrideSpaMode`
    pub wire: &'static str,
    /// Dotted host attribute path, e.g. `client_interface.override_spa_mode`
    pub attribute: &'static str,
    pub since: ApiRevision,
    /// First revision that no longer accepts the field
    pub until: Option<ApiRevision>,
}

impl FieldGate {
    pub const fn since(wire: &'static str, attribute: &'static str, since: ApiRevision) -> Self {
        Self {
            wire,
            attribute,
            since,
            until: None,
        }
    }

    pub const fn until(wire: &'static str, attribute: &'static str, until: ApiRevision) -> Self {
        Self {
            wire,
            attribute,
            since: ApiRevision::MIN,
            until: Some(until),
        }
    }

    pub fn supported(&self, revision: ApiRevision) -> bool {
        revision >= self.since && self.until.map_or(true, |until| revision < until)
    }
}

/// The revision table of one collection
#[derive(Debug)]
pub struct WireShape {
    pub gates: &'static [FieldGate],
}

/// A declared attribute the active revision cannot carry
#[derive(Debug, Clone)]
pub struct UnmetGate {
    pub path: AttributePath,
    pub gate: FieldGate,
}

impl WireShape {
    pub const EMPTY: WireShape = WireShape { gates: &[] };

    /// Removes every field the revision does not know. Arrays are walked so
    /// gates apply to each element of a nested list.
    pub fn encode(&self, revision: ApiRevision, body: &mut Value) {
        for gate in self.gates.iter().filter(|g| !g.supported(revision)) {
            let segments: Vec<&str> = gate.wire.split('.').collect();
            remove_path(body, &segments);
        }
    }

    /// Attributes present in `config` that need a newer revision than
    /// `revision`. Fields retired by later revisions are not reported; they
    /// are dropped or translated on the way out.
    pub fn unmet(&self, revision: ApiRevision, config: &Dynamic) -> Vec<UnmetGate> {
        self.gates
            .iter()
            .filter(|g| revision < g.since)
            .filter_map(|gate| {
                let segments: Vec<&str> = gate.attribute.split('.').collect();
                find_present(config, &segments, AttributePath::root())
                    .map(|path| UnmetGate { path, gate: *gate })
            })
            .collect()
    }
}

fn remove_path(value: &mut Value, segments: &[&str]) {
    let Some((first, rest)) = segments.split_first() else {
        return;
    };

    match value {
        Value::Object(map) => {
            if rest.is_empty() {
                map.remove(*first);
            } else if let Some(child) = map.get_mut(*first) {
                remove_path(child, rest);
            }
        }
        Value::Array(items) => {
            for item in items {
                remove_path(item, segments);
            }
        }
        _ => {}
    }
}

fn is_declared(value: &Dynamic) -> bool {
    match value {
        Dynamic::List(items) => !items.is_empty(),
        Dynamic::Map(map) => !map.is_empty(),
        other => other.is_present(),
    }
}

fn find_present(value: &Dynamic, segments: &[&str], path: AttributePath) -> Option<AttributePath> {
    let Some((first, rest)) = segments.split_first() else {
        return is_declared(value).then_some(path);
    };

    match value {
        Dynamic::Map(map) => map
            .get(*first)
            .and_then(|child| find_present(child, rest, path.attribute(first))),
        Dynamic::List(items) => items.iter().enumerate().find_map(|(idx, item)| {
            find_present(item, segments, path.clone().index(idx as i64))
        }),
        _ => None,
    }
}
