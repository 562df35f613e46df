//! Data arrays and their payload I/O

mod data_array;

pub use data_array::DataArray;
