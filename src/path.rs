//! Declarative path resolution over nested provider records.
//!
//! A path is an ordered sequence of [`PathSegment`]s walked through a
//! [`serde_json::Value`] tree. The final segment may carry attribute
//! constraints that disambiguate among repeated sibling elements, e.g.
//! picking the `<link rel="icon">` out of a list of links. Resolution
//! is pure and total: missing keys, wrong types, and empty candidate
//! lists all collapse to `None` rather than erroring.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

/// Allowed value(s) for one attribute constraint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AllowedValue {
    /// The attribute must equal this value.
    One(String),
    /// The attribute must equal one of these values.
    Many(Vec<String>),
}

impl AllowedValue {
    /// Check whether an attribute value satisfies this constraint.
    #[must_use]
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::One(allowed) => value_equals(value, allowed),
            Self::Many(allowed) => allowed.iter().any(|a| value_equals(value, a)),
        }
    }
}

/// One step of a field path.
///
/// Deserializes either from a bare string (`"title"`) or from an
/// object carrying constraints
/// (`{"key": "href", "constraints": {"rel": "icon"}}`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "SegmentRepr")]
pub struct PathSegment {
    /// Key looked up at this step.
    pub key: String,

    /// Attribute-equality constraints applied to candidate mappings.
    /// Empty for unconditional traversal.
    pub constraints: BTreeMap<String, AllowedValue>,
}

impl PathSegment {
    /// Unconstrained segment for a plain key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            constraints: BTreeMap::new(),
        }
    }

    /// Segment with attribute constraints.
    #[must_use]
    pub fn constrained(
        key: impl Into<String>,
        constraints: impl IntoIterator<Item = (String, AllowedValue)>,
    ) -> Self {
        Self {
            key: key.into(),
            constraints: constraints.into_iter().collect(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SegmentRepr {
    Key(String),
    Full {
        key: String,
        #[serde(default)]
        constraints: BTreeMap<String, AllowedValue>,
    },
}

impl From<SegmentRepr> for PathSegment {
    fn from(repr: SegmentRepr) -> Self {
        match repr {
            SegmentRepr::Key(key) => Self::new(key),
            SegmentRepr::Full { key, constraints } => Self { key, constraints },
        }
    }
}

/// Resolve a path against a nested entry.
///
/// Returns the addressed value, or `None` when any step of the walk
/// fails: missing key, non-mapping intermediate value, or a final
/// candidate list in which no candidate satisfies the constraints.
///
/// Candidate matching on the final segment coerces list-or-scalar
/// values uniformly: a non-list value is treated as a single-element
/// candidate list, so JSON providers that emit one link as an object
/// and several links as an array resolve identically.
#[must_use]
pub fn resolve<'a>(entry: &'a Value, path: &[PathSegment]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;

    match rest {
        [] => {
            if first.constraints.is_empty() {
                return entry.as_object()?.get(&first.key);
            }
            // Constrained terminal: the entry itself is the sole candidate.
            select_from_candidates(std::slice::from_ref(entry), first)
        }
        [last] => {
            let value = entry.as_object()?.get(&first.key)?;
            match value {
                Value::Array(items) => select_from_candidates(items, last),
                other => select_from_candidates(std::slice::from_ref(other), last),
            }
        }
        _ => {
            let value = entry.as_object()?.get(&first.key)?;
            resolve(value, rest)
        }
    }
}

/// Pick the first candidate mapping that satisfies every constraint and
/// contains the final key. Candidates are tried in array order.
fn select_from_candidates<'a>(candidates: &'a [Value], segment: &PathSegment) -> Option<&'a Value> {
    candidates.iter().find_map(|candidate| {
        let obj = candidate.as_object()?;
        let satisfied = segment
            .constraints
            .iter()
            .all(|(attr, allowed)| obj.get(attr).is_some_and(|v| allowed.matches(v)));
        if satisfied {
            obj.get(&segment.key)
        } else {
            None
        }
    })
}

fn value_equals(value: &Value, allowed: &str) -> bool {
    match value {
        Value::String(s) => s == allowed,
        Value::Number(n) => n.to_string() == allowed,
        Value::Bool(b) => b.to_string() == allowed,
        _ => false,
    }
}

/// Coerce a resolved value to a scalar string.
///
/// Strings pass through; numbers and booleans render in their JSON
/// form. An XML-normalized element with attributes keeps its text
/// under `"#text"`, which is peeled here so JSON and XML providers
/// share one path vocabulary.
#[must_use]
pub fn as_scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(obj) => obj.get("#text").and_then(as_scalar_string),
        _ => None,
    }
}
