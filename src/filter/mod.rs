//! Filter rules extracted from a request.
//!
//! # Data Flow
//! ```text
//! GET /things/42/name?filter=author,eq,bob;uploaded,gt,1519454311320
//!     → rules.rs parse_implicit   (path segments → id, property)
//!     → rules.rs parse_explicit   (`filter` query → key,op,value clauses)
//!     → FilterSet (one per request, last write per key wins)
//!     → handed to the Provider by reference
//! ```
//!
//! # Design Decisions
//! - Both passes write through the same map; explicit runs second and
//!   therefore overrides positional rules sharing a key
//! - Rules are immutable once built
//! - Serialized output is ordered by key so identical sets render identically

pub mod rules;

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

pub use rules::{parse_explicit, parse_implicit, FilterError};

/// Comparison requested by a filter rule.
///
/// Serialized as its numeric code, which is what clients of the engine
/// have always received.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareType {
    Unknown = 0,
    Eq = 1,
    Ne = 2,
    Gt = 3,
    Ge = 4,
    Lt = 5,
    Le = 6,
    /// Reserved. Not accepted by the explicit filter grammar.
    Like = 7,
}

impl CompareType {
    /// Map an explicit-grammar operator token to its comparison.
    ///
    /// Matching is exact and case-sensitive. `like` is deliberately absent.
    pub fn from_operator(token: &str) -> Option<Self> {
        match token {
            "eq" => Some(CompareType::Eq),
            "ne" => Some(CompareType::Ne),
            "gt" => Some(CompareType::Gt),
            "ge" => Some(CompareType::Ge),
            "lt" => Some(CompareType::Lt),
            "le" => Some(CompareType::Le),
            _ => None,
        }
    }

    /// The operator token for this comparison.
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareType::Unknown => "unknown",
            CompareType::Eq => "eq",
            CompareType::Ne => "ne",
            CompareType::Gt => "gt",
            CompareType::Ge => "ge",
            CompareType::Lt => "lt",
            CompareType::Le => "le",
            CompareType::Like => "like",
        }
    }
}

impl fmt::Display for CompareType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CompareType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

/// One predicate a provider must apply when selecting or mutating data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FilterRule {
    key: String,
    compare_type: CompareType,
    value: String,
}

impl FilterRule {
    pub fn new(key: impl Into<String>, compare_type: CompareType, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            compare_type,
            value: value.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn compare_type(&self) -> CompareType {
        self.compare_type
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// The per-request collection of filter rules, keyed by rule key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FilterSet {
    rules: BTreeMap<String, FilterRule>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a rule, replacing any rule with the same key.
    pub fn insert(&mut self, rule: FilterRule) -> Option<FilterRule> {
        self.rules.insert(rule.key.clone(), rule)
    }

    pub fn get(&self, key: &str) -> Option<&FilterRule> {
        self.rules.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.rules.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FilterRule> {
        self.rules.values()
    }
}

impl<'a> IntoIterator for &'a FilterSet {
    type Item = (&'a String, &'a FilterRule);
    type IntoIter = btree_map::Iter<'a, String, FilterRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
