//! ndblock - N-dimensional measurement arrays with integrity checks
//!
//! Blocks group data arrays; each array pairs a typed payload in a
//! persistent store with a catalog of per-axis dimension descriptors, a
//! validated SI unit and creation/update timestamps. A structural
//! validator cross-checks payload shape against the catalog.
//!
//! ```no_run
//! use ndblock::{DataType, File, FileMode, NdSize};
//!
//! # fn main() -> ndblock::DataResult<()> {
//! let mut file = File::open("/tmp/session", FileMode::Overwrite)?;
//! let array = file
//!     .create_block("session_one", "recording")?
//!     .create_data_array("voltage", "trace", DataType::Double, NdSize::from([2, 3]))?;
//! array.set_unit(Some("mV"))?;
//! array.append_set_dimension();
//! array.append_sampled_dimension(0.1)?;
//! array.write_all(&[0.0f64, 0.1, 0.2, 1.0, 1.1, 1.2])?;
//! file.close()?;
//! # Ok(())
//! # }
//! ```

pub mod array;
pub mod block;
pub mod cli;
pub mod datatype;
pub mod dimension;
pub mod errors;
pub mod file;
pub mod manifest;
pub mod observability;
pub mod shape;
pub mod store;
pub mod timestamp;
pub mod units;
pub mod validation;

pub use array::DataArray;
pub use block::Block;
pub use datatype::{DataType, Element};
pub use dimension::{Dimension, DimensionCatalog, DimensionKind};
pub use errors::{DataError, DataResult};
pub use file::{File, FileMode};
pub use shape::{Hyperslab, NdSize};
pub use validation::{validate, validate_block, ValidationResult};
