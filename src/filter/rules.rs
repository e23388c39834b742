//! Implicit and explicit filter rule parsing.
//!
//! # Grammar
//! ```text
//! implicit:  /<resource>/<id>/<property>
//! explicit:  clause (";" clause)*
//!            clause = key "," op "," value
//!            op     = eq | ne | gt | ge | lt | le
//! ```
//!
//! # Design Decisions
//! - Implicit parsing is best effort: an undecodable segment is skipped
//! - Explicit parsing stops at the first bad clause; clauses applied
//!   before it stay in the set

use percent_encoding::percent_decode_str;
use thiserror::Error;

use super::{CompareType, FilterRule, FilterSet};

/// Rule key filled from the first positional segment.
pub const ID_KEY: &str = "id";

/// Rule key filled from the second positional segment.
pub const PROPERTY_KEY: &str = "property";

/// Syntax errors from the explicit filter grammar.
///
/// The messages are returned verbatim to clients.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("Expecting exactly 3 operands for filter rule")]
    Arity { clause: String },

    #[error("Expecting one of eq, ne, gt, ge, lt, le")]
    UnknownOperator { operator: String },
}

/// Derive `id` and `property` rules from the raw (still escaped) URL path.
pub fn parse_implicit(rules: &mut FilterSet, path: &str) {
    let segments: Vec<&str> = path.split('/').collect();

    // segments[0] is the empty string before the leading slash,
    // segments[1] the resource itself.
    for (index, key) in [(2, ID_KEY), (3, PROPERTY_KEY)] {
        let Some(raw) = segments.get(index) else {
            continue;
        };
        if raw.is_empty() {
            continue;
        }
        if let Some(value) = decode_segment(raw) {
            rules.insert(FilterRule::new(key, CompareType::Eq, value));
        }
    }
}

/// Apply the `filter` query expression to `rules`.
///
/// An empty expression is a no-op.
pub fn parse_explicit(rules: &mut FilterSet, input: &str) -> Result<(), FilterError> {
    if input.is_empty() {
        return Ok(());
    }

    for clause in input.split(';') {
        let operands: Vec<&str> = clause.split(',').collect();
        let [key, operator, value] = operands.as_slice() else {
            return Err(FilterError::Arity {
                clause: clause.to_string(),
            });
        };

        let compare_type = CompareType::from_operator(operator).ok_or_else(|| {
            FilterError::UnknownOperator {
                operator: operator.to_string(),
            }
        })?;

        rules.insert(FilterRule::new(*key, compare_type, *value));
    }

    Ok(())
}

/// Percent-decode one path segment.
///
/// Returns `None` for a malformed escape or a result that is not UTF-8.
fn decode_segment(raw: &str) -> Option<String> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let well_formed = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !well_formed {
                return None;
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    percent_decode_str(raw)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}
