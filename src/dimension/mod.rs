//! Per-axis dimension descriptors
//!
//! A data array's axes are described by a [`DimensionCatalog`] of
//! [`Dimension`]s, addressed by dense 1-based position.
//!
//! Descriptor parameters are validated when a descriptor is built, so a
//! rejected descriptor never reaches the catalog and never shifts its
//! positions.

mod catalog;
mod types;

pub use catalog::DimensionCatalog;
pub use types::{Dimension, DimensionKind, RangeDimension, SampledDimension, SetDimension};
