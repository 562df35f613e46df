//! Structural validation
//!
//! Cross-checks a data array's payload shape against its dimension
//! catalog, units and identity. Every rule runs; findings are split into
//! errors and warnings. Validation only reads and never fails.

mod findings;
mod rules;

pub use findings::{Finding, Level, ValidationResult};
pub use rules::{ArrayView, Rule, RULES};

use crate::array::DataArray;
use crate::block::Block;
use crate::observability::{log_event_with_fields, Event};

/// Run every rule against `view`
pub fn validate_view(view: &ArrayView<'_>) -> ValidationResult {
    let mut result = ValidationResult::new();
    for (_, rule) in RULES {
        result.extend(rule(view));
    }
    result
}

pub fn validate(array: &DataArray) -> ValidationResult {
    let result = validate_view(&ArrayView::from(array));
    log_event_with_fields(
        Event::ValidationComplete,
        &[
            ("array", array.name()),
            ("errors", &result.error_count().to_string()),
            ("warnings", &result.warning_count().to_string()),
        ],
    );
    result
}

/// Validate every array of `block`, in creation order
pub fn validate_block(block: &Block) -> ValidationResult {
    let mut result = ValidationResult::new();
    for array in block.data_arrays() {
        result.merge(validate(array));
    }
    result
}
