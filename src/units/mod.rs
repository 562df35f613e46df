//! Unit grammar
//!
//! Unit strings are SI atoms (optional prefix, base unit, optional integer
//! exponent) combined with `*` and `/`, optionally grouped in parentheses.
//! Free text is rejected with `InvalidUnit`.
//!
//! Accepted units are stored in normalized form so reading them back is
//! byte-stable: whitespace dropped, micro spelled `u`, ohm spelled `Ohm`,
//! no `+` in exponents.
//!
//! Validation is pure: nothing here holds state.

mod grammar;
mod scaling;

use std::fmt;

use crate::errors::{DataError, DataResult};

pub use grammar::{UnitAtom, UnitExpr, UnitFactor, UnitOp};
pub use scaling::scaling;

/// A validated, normalized unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    expr: UnitExpr,
    normalized: String,
}

impl Unit {
    pub fn expr(&self) -> &UnitExpr {
        &self.expr
    }

    pub fn as_str(&self) -> &str {
        &self.normalized
    }

    pub fn into_string(self) -> String {
        self.normalized
    }

    /// A single prefixed base unit such as `mV^2`
    pub fn is_atomic(&self) -> bool {
        self.expr.as_atom().is_some()
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized)
    }
}

/// Parse and normalize a non-empty unit string.
///
/// # Errors
///
/// `InvalidUnit` for unknown atoms, malformed exponents, dangling
/// operators or unbalanced parentheses. An empty string is also rejected
/// here; use [`normalize_optional`] where "no unit" is meaningful.
pub fn parse_unit(unit: &str) -> DataResult<Unit> {
    let clean = grammar::sanitize(unit);
    let expr = grammar::parse(&clean).map_err(|_| DataError::InvalidUnit(unit.to_string()))?;
    let normalized = expr.to_string();
    Ok(Unit { expr, normalized })
}

/// Normalize a unit string.
pub fn normalize(unit: &str) -> DataResult<String> {
    parse_unit(unit).map(Unit::into_string)
}

/// Normalize an optional unit.
///
/// `None` and blank strings mean "no unit" and yield `Ok(None)`.
pub fn normalize_optional(unit: Option<&str>) -> DataResult<Option<String>> {
    match unit {
        None => Ok(None),
        Some(u) if u.trim().is_empty() => Ok(None),
        Some(u) => normalize(u).map(Some),
    }
}

pub fn is_valid(unit: &str) -> bool {
    parse_unit(unit).is_ok()
}

pub fn is_atomic(unit: &str) -> bool {
    parse_unit(unit).map_or(false, |u| u.is_atomic())
}

pub fn is_compound(unit: &str) -> bool {
    parse_unit(unit).map_or(false, |u| !u.is_atomic())
}
