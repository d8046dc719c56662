//! Selector expression tree.
//!
//! A [`Selector`] names a subset of devices or sensors. Leaves match on the
//! unique key or on attributes; `And`/`Or` combine children with boolean
//! semantics. Values are immutable once built and compare structurally.
//!
//! # Wire form
//!
//! | Variant | JSON |
//! |---------|------|
//! | `All` | `{"type":"all"}` |
//! | `Key` | `{"type":"key","key":"..."}` |
//! | `Attributes` | `{"type":"attributes","attrs":{...}}` |
//! | `AttributeKey` | `{"type":"attribute_key","key":"..."}` |
//! | `And` | `{"type":"and","children":[...]}` |
//! | `Or` | `{"type":"or","children":[...]}` |
//!
//! # Example
//!
//! ```rust
//! use sensorlake_core::Selector;
//!
//! let selector = Selector::and([
//!     Selector::attribute("building", "hq"),
//!     Selector::or([Selector::key("thermo-1"), Selector::attribute_key("calibrated")]),
//! ]);
//! assert_eq!(selector.depth(), 3);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Attributed, DecodeError};

/// Predicate over devices or sensors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Selector {
    /// Matches every resource in scope.
    All,
    /// Matches the resource whose unique key equals `key`.
    Key { key: String },
    /// Matches when every pair is present with the same value. Empty matches all.
    Attributes { attrs: BTreeMap<String, String> },
    /// Matches when the attribute is present with any value.
    AttributeKey { key: String },
    /// Matches when all children match. Empty matches all.
    And { children: Vec<Selector> },
    /// Matches when any child matches. Empty matches nothing.
    Or { children: Vec<Selector> },
}

impl Selector {
    pub const fn all() -> Self {
        Self::All
    }

    pub fn key(key: impl Into<String>) -> Self {
        Self::Key { key: key.into() }
    }

    pub fn attributes<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::Attributes {
            attrs: pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    pub fn attribute(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::attributes([(key.into(), value.into())])
    }

    pub fn attribute_key(key: impl Into<String>) -> Self {
        Self::AttributeKey { key: key.into() }
    }

    pub fn and<I>(children: I) -> Self
    where
        I: IntoIterator<Item = Selector>,
    {
        Self::And {
            children: children.into_iter().collect(),
        }
    }

    pub fn or<I>(children: I) -> Self
    where
        I: IntoIterator<Item = Selector>,
    {
        Self::Or {
            children: children.into_iter().collect(),
        }
    }

    /// Wire tag of this variant.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Key { .. } => "key",
            Self::Attributes { .. } => "attributes",
            Self::AttributeKey { .. } => "attribute_key",
            Self::And { .. } => "and",
            Self::Or { .. } => "or",
        }
    }

    /// Nesting depth, counting a leaf (or an empty combinator) as 1.
    pub fn depth(&self) -> usize {
        match self {
            Self::And { children } | Self::Or { children } => {
                1 + children.iter().map(Self::depth).max().unwrap_or(0)
            }
            _ => 1,
        }
    }

    /// Evaluates the tree against an in-memory record.
    pub fn matches<R>(&self, resource: &R) -> bool
    where
        R: Attributed + ?Sized,
    {
        match self {
            Self::All => true,
            Self::Key { key } => resource.key() == key,
            Self::Attributes { attrs } => attrs
                .iter()
                .all(|(key, value)| resource.attributes().get(key) == Some(value)),
            Self::AttributeKey { key } => resource.attributes().contains_key(key),
            Self::And { children } => children.iter().all(|child| child.matches(resource)),
            Self::Or { children } => children.iter().any(|child| child.matches(resource)),
        }
    }

    pub fn from_json(input: &str) -> Result<Self, DecodeError> {
        serde_json::from_str(input).map_err(|error| DecodeError::json("selector", &error))
    }

    pub fn from_value(value: Value) -> Result<Self, DecodeError> {
        serde_json::from_value(value).map_err(|error| DecodeError::json("selector", &error))
    }
}
