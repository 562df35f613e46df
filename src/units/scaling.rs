//! Prefix scaling between atomic units

use crate::errors::{DataError, DataResult};

use super::grammar::UnitAtom;
use super::{parse_unit, Unit};

fn atomic(unit: &str) -> DataResult<(Unit, UnitAtom)> {
    let parsed = parse_unit(unit)?;
    let atom = parsed
        .expr()
        .as_atom()
        .cloned()
        .ok_or_else(|| DataError::InvalidUnit(format!("{} is not an atomic unit", unit)))?;
    Ok((parsed, atom))
}

/// Factor that converts a value expressed in `from` into `to`.
///
/// Both units must be atomic, share the same base and the same exponent;
/// only their prefixes may differ. `scaling("mV", "V")` is `1e-3`.
pub fn scaling(from: &str, to: &str) -> DataResult<f64> {
    let (from_unit, from_atom) = atomic(from)?;
    let (to_unit, to_atom) = atomic(to)?;

    if from_atom.base != to_atom.base || from_atom.exponent() != to_atom.exponent() {
        return Err(DataError::InvalidUnit(format!(
            "{} cannot be scaled to {}",
            from_unit, to_unit
        )));
    }

    let decades = (from_atom.prefix_exponent() - to_atom.prefix_exponent()) * from_atom.exponent();
    Ok(10f64.powi(decades))
}
