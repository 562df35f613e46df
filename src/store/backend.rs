//! # Persistent Store Trait
//!
//! A store holds fixed-size typed buffers addressed by key. Implementations
//! only provide byte-range access; region transfers are built on top by
//! walking the hyperslab's contiguous runs.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::datatype::DataType;
use crate::shape::{Hyperslab, NdSize};

use super::errors::{StoreError, StoreResult};

/// Reference to an allocated payload buffer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferHandle {
    pub key: String,
    pub data_type: DataType,
    pub shape: NdSize,
}

impl BufferHandle {
    pub fn new(key: impl Into<String>, data_type: DataType, shape: NdSize) -> Self {
        Self {
            key: key.into(),
            data_type,
            shape,
        }
    }

    /// Payload size in bytes, saturating for shapes no store accepts
    pub fn byte_len(&self) -> u64 {
        checked_byte_len(self.data_type, &self.shape).unwrap_or(u64::MAX)
    }
}

/// Payload size of `shape` elements of `data_type`, or `TooLarge` when it
/// cannot be addressed
pub fn checked_byte_len(data_type: DataType, shape: &NdSize) -> StoreResult<u64> {
    shape
        .checked_element_count()
        .and_then(|n| n.checked_mul(data_type.size()))
        .and_then(|n| u64::try_from(n).ok())
        .ok_or_else(|| StoreError::TooLarge {
            shape: shape.to_string(),
            width: data_type.size(),
        })
}

/// Backend trait for payload storage
pub trait PersistentStore: Send + Sync + fmt::Debug {
    /// Create a zero-filled buffer for `shape` elements of `data_type`
    fn allocate(&self, key: &str, data_type: DataType, shape: &NdSize) -> StoreResult<BufferHandle>;

    /// Re-attach to a buffer that already exists, checking its size
    fn attach(&self, key: &str, data_type: DataType, shape: &NdSize) -> StoreResult<BufferHandle>;

    /// Read `len` bytes starting at `byte_offset`
    fn read_bytes(&self, handle: &BufferHandle, byte_offset: u64, len: usize) -> StoreResult<Vec<u8>>;

    /// Overwrite bytes starting at `byte_offset`
    fn write_bytes(&self, handle: &BufferHandle, byte_offset: u64, data: &[u8]) -> StoreResult<()>;

    /// Drop the buffer and its payload
    fn release(&self, handle: &BufferHandle) -> StoreResult<()>;

    /// Human-readable location, for diagnostics only
    fn location(&self) -> String;

    /// Read the addressed region, flattened row-major
    fn read_region(&self, handle: &BufferHandle, slab: &Hyperslab) -> StoreResult<Vec<u8>> {
        check_region(handle, slab)?;
        let width = handle.data_type.size();
        let mut out = Vec::with_capacity(slab.element_count() * width);
        for run in slab.runs() {
            let bytes = self.read_bytes(handle, (run.start * width) as u64, run.len * width)?;
            out.extend_from_slice(&bytes);
        }
        Ok(out)
    }

    /// Replace exactly the addressed region with `data` (row-major)
    fn write_region(&self, handle: &BufferHandle, slab: &Hyperslab, data: &[u8]) -> StoreResult<()> {
        check_region(handle, slab)?;
        let width = handle.data_type.size();
        let expected = slab.element_count() * width;
        if data.len() != expected {
            return Err(StoreError::LengthMismatch {
                expected,
                actual: data.len(),
            });
        }

        let mut cursor = 0usize;
        for run in slab.runs() {
            let len = run.len * width;
            self.write_bytes(handle, (run.start * width) as u64, &data[cursor..cursor + len])?;
            cursor += len;
        }
        Ok(())
    }
}

fn check_region(handle: &BufferHandle, slab: &Hyperslab) -> StoreResult<()> {
    if slab.shape() != &handle.shape {
        return Err(StoreError::ShapeMismatch {
            expected: handle.shape.to_string(),
            actual: slab.shape().to_string(),
        });
    }
    Ok(())
}

/// Bounds check shared by store implementations
pub(crate) fn check_range(
    key: &str,
    offset: u64,
    len: usize,
    size: u64,
) -> StoreResult<()> {
    let end = offset.checked_add(len as u64);
    if end.map_or(true, |end| end > size) {
        return Err(StoreError::OutOfRange {
            key: key.to_string(),
            offset,
            len,
            size,
        });
    }
    Ok(())
}
