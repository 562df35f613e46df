//! Shape and addressing algebra
//!
//! - [`NdSize`]: per-axis extents of an array or region
//! - [`Hyperslab`]: a region resolved against an array shape, with the
//!   row-major flatten/unflatten mapping and run decomposition used to move
//!   data between a caller's flat buffer and the persisted payload

mod hyperslab;
mod ndsize;

pub use hyperslab::{flatten, unflatten, Hyperslab, Run};
pub use ndsize::NdSize;
