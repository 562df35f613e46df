//! # In-Memory Store
//!
//! Keeps every payload in a `Vec<u8>`. Used by tests and by files that are
//! never meant to outlive the process.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::datatype::DataType;
use crate::shape::NdSize;

use super::backend::{check_range, checked_byte_len, BufferHandle, PersistentStore};
use super::errors::{StoreError, StoreResult};

#[derive(Debug, Default)]
pub struct MemoryStore {
    buffers: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            buffers: RwLock::new(HashMap::new()),
        }
    }

    /// Number of live buffers
    pub fn buffer_count(&self) -> usize {
        self.buffers.read().map(|b| b.len()).unwrap_or(0)
    }
}

fn poisoned() -> StoreError {
    StoreError::Internal("Lock poisoned".to_string())
}

impl PersistentStore for MemoryStore {
    fn allocate(&self, key: &str, data_type: DataType, shape: &NdSize) -> StoreResult<BufferHandle> {
        // computed in usize, so the cast back is lossless
        let len = checked_byte_len(data_type, shape)? as usize;
        let handle = BufferHandle::new(key, data_type, shape.clone());
        let mut buffers = self.buffers.write().map_err(|_| poisoned())?;
        if buffers.contains_key(key) {
            return Err(StoreError::BufferExists(key.to_string()));
        }

        let mut payload = Vec::new();
        payload.try_reserve_exact(len).map_err(|_| StoreError::TooLarge {
            shape: shape.to_string(),
            width: data_type.size(),
        })?;
        payload.resize(len, 0u8);
        buffers.insert(key.to_string(), payload);
        Ok(handle)
    }

    fn attach(&self, key: &str, data_type: DataType, shape: &NdSize) -> StoreResult<BufferHandle> {
        let len = checked_byte_len(data_type, shape)?;
        let handle = BufferHandle::new(key, data_type, shape.clone());
        let buffers = self.buffers.read().map_err(|_| poisoned())?;
        let payload = buffers
            .get(key)
            .ok_or_else(|| StoreError::BufferNotFound(key.to_string()))?;
        if payload.len() as u64 != len {
            return Err(StoreError::Corrupt(format!(
                "buffer '{}' holds {} bytes, expected {}",
                key,
                payload.len(),
                len
            )));
        }
        Ok(handle)
    }

    fn read_bytes(&self, handle: &BufferHandle, byte_offset: u64, len: usize) -> StoreResult<Vec<u8>> {
        let buffers = self.buffers.read().map_err(|_| poisoned())?;
        let payload = buffers
            .get(&handle.key)
            .ok_or_else(|| StoreError::BufferNotFound(handle.key.clone()))?;
        check_range(&handle.key, byte_offset, len, payload.len() as u64)?;
        let start = byte_offset as usize;
        Ok(payload[start..start + len].to_vec())
    }

    fn write_bytes(&self, handle: &BufferHandle, byte_offset: u64, data: &[u8]) -> StoreResult<()> {
        let mut buffers = self.buffers.write().map_err(|_| poisoned())?;
        let payload = buffers
            .get_mut(&handle.key)
            .ok_or_else(|| StoreError::BufferNotFound(handle.key.clone()))?;
        check_range(&handle.key, byte_offset, data.len(), payload.len() as u64)?;
        let start = byte_offset as usize;
        payload[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn release(&self, handle: &BufferHandle) -> StoreResult<()> {
        let mut buffers = self.buffers.write().map_err(|_| poisoned())?;
        buffers
            .remove(&handle.key)
            .map(|_| ())
            .ok_or_else(|| StoreError::BufferNotFound(handle.key.clone()))
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
