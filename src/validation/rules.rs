//! Validation rules
//!
//! Each rule is a pure function over an [`ArrayView`] returning its own
//! findings. Rules do not depend on each other and never fail.

use crate::array::DataArray;
use crate::dimension::{Dimension, DimensionCatalog};
use crate::shape::NdSize;
use crate::units;

use super::findings::Finding;

/// The parts of a data array the rules look at
#[derive(Debug, Clone)]
pub struct ArrayView<'a> {
    pub id: String,
    pub name: &'a str,
    pub type_name: &'a str,
    pub label: Option<&'a str>,
    pub unit: Option<&'a str>,
    pub shape: &'a NdSize,
    pub dimensions: &'a DimensionCatalog,
    pub polynom_coefficients: &'a [f64],
    pub expansion_origin: Option<f64>,
}

impl<'a> From<&'a DataArray> for ArrayView<'a> {
    fn from(array: &'a DataArray) -> Self {
        Self {
            id: array.id().to_string(),
            name: array.name(),
            type_name: array.type_name(),
            label: array.label(),
            unit: array.unit(),
            shape: array.data_extent(),
            dimensions: array.dimensions(),
            polynom_coefficients: array.polynom_coefficients(),
            expansion_origin: array.expansion_origin(),
        }
    }
}

impl ArrayView<'_> {
    fn dim_subject(&self, position: usize) -> String {
        format!("{}/dimension {}", self.name, position)
    }

    /// Extent of the axis described by the dimension at `position`
    fn extent(&self, position: usize) -> Option<usize> {
        self.shape.get(position - 1)
    }
}

pub type Rule = fn(&ArrayView<'_>) -> Vec<Finding>;

/// Every rule, in reporting order
pub const RULES: &[(&str, Rule)] = &[
    ("identity", identity),
    ("dimension_count", dimension_count),
    ("range_ticks", range_ticks),
    ("set_labels", set_labels),
    ("sampling_interval", sampling_interval),
    ("units", unit_grammar),
    ("unit_without_label", unit_without_label),
    ("calibration", calibration),
];

/// Name and type set, id in canonical 36-character form
pub fn identity(view: &ArrayView<'_>) -> Vec<Finding> {
    let mut findings = Vec::new();
    if view.name.is_empty() {
        findings.push(Finding::error(view.id.as_str(), "name is not set"));
    }
    if view.type_name.is_empty() {
        findings.push(Finding::error(view.name, "type is not set"));
    }
    if view.id.len() != 36 {
        findings.push(Finding::error(
            view.name,
            format!("id '{}' is not a 36 character identifier", view.id),
        ));
    }
    findings
}

/// One dimension descriptor per payload axis
pub fn dimension_count(view: &ArrayView<'_>) -> Vec<Finding> {
    let rank = view.shape.rank();
    let defined = view.dimensions.size();
    if rank == defined {
        return Vec::new();
    }
    vec![Finding::error(
        view.name,
        format!(
            "data has {} dimensions but {} dimension descriptors are defined",
            rank, defined
        ),
    )]
}

/// Range ticks must match their axis and increase strictly
pub fn range_ticks(view: &ArrayView<'_>) -> Vec<Finding> {
    let mut findings = Vec::new();
    for (position, dim) in view.dimensions.iter() {
        let Some(range) = dim.as_range() else {
            continue;
        };
        if let Some(extent) = view.extent(position) {
            if range.ticks().len() != extent {
                findings.push(Finding::error(
                    view.dim_subject(position),
                    format!(
                        "{} ticks defined for an axis of extent {}",
                        range.ticks().len(),
                        extent
                    ),
                ));
            }
        }
        if !range.is_strictly_increasing() {
            findings.push(Finding::error(
                view.dim_subject(position),
                "ticks are not strictly increasing",
            ));
        }
    }
    findings
}

/// Set labels, when given, name every index of their axis
pub fn set_labels(view: &ArrayView<'_>) -> Vec<Finding> {
    let mut findings = Vec::new();
    for (position, dim) in view.dimensions.iter() {
        let Some(set) = dim.as_set() else {
            continue;
        };
        let labels = set.labels().len();
        match view.extent(position) {
            Some(extent) if labels > 0 && labels != extent => {
                findings.push(Finding::error(
                    view.dim_subject(position),
                    format!("{} labels defined for an axis of extent {}", labels, extent),
                ));
            }
            _ => {}
        }
    }
    findings
}

/// Sampling intervals must be finite and positive
pub fn sampling_interval(view: &ArrayView<'_>) -> Vec<Finding> {
    view.dimensions
        .iter()
        .filter_map(|(position, dim)| {
            let interval = dim.as_sampled()?.sampling_interval();
            if interval.is_finite() && interval > 0.0 {
                return None;
            }
            Some(Finding::error(
                view.dim_subject(position),
                format!("sampling interval {} is not positive", interval),
            ))
        })
        .collect()
}

pub fn unit_grammar(view: &ArrayView<'_>) -> Vec<Finding> {
    let mut findings = Vec::new();
    if let Some(unit) = view.unit {
        if !units::is_valid(unit) {
            findings.push(Finding::error(view.name, format!("invalid unit '{}'", unit)));
        }
    }
    for (position, dim) in view.dimensions.iter() {
        if let Some(unit) = dim.unit() {
            if !units::is_valid(unit) {
                findings.push(Finding::error(
                    view.dim_subject(position),
                    format!("invalid unit '{}'", unit),
                ));
            }
        }
    }
    findings
}

pub fn unit_without_label(view: &ArrayView<'_>) -> Vec<Finding> {
    let mut findings = Vec::new();
    if view.unit.is_some() && view.label.is_none() {
        findings.push(Finding::warning(view.name, "unit is set but label is not"));
    }
    for (position, dim) in view.dimensions.iter() {
        if labelled_unit_missing(dim) {
            findings.push(Finding::warning(
                view.dim_subject(position),
                "unit is set but label is not",
            ));
        }
    }
    findings
}

fn labelled_unit_missing(dim: &Dimension) -> bool {
    dim.unit().is_some() && dim.label().is_none()
}

/// An expansion origin is meaningless without a polynomial
pub fn calibration(view: &ArrayView<'_>) -> Vec<Finding> {
    if view.expansion_origin.is_some() && view.polynom_coefficients.is_empty() {
        return vec![Finding::warning(
            view.name,
            "expansion origin is set but no polynomial coefficients are",
        )];
    }
    Vec::new()
}
