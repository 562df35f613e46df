//! Blocks
//!
//! A block groups data arrays. Arrays are addressed by name or by id; names
//! are unique within a block.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::array::DataArray;
use crate::datatype::DataType;
use crate::errors::{DataError, DataResult};
use crate::manifest::BlockRecord;
use crate::observability::{log_event_with_fields, Event};
use crate::shape::NdSize;
use crate::store::PersistentStore;
use crate::timestamp::{self, Timestamps};

pub struct Block {
    id: Uuid,
    name: String,
    type_name: String,
    arrays: Vec<DataArray>,
    // deleted, payload not yet released
    pending_release: Vec<DataArray>,
    timestamps: Timestamps,
    writable: bool,
    store: Arc<dyn PersistentStore>,
}

impl Block {
    pub(crate) fn create(
        store: Arc<dyn PersistentStore>,
        name: &str,
        type_name: &str,
        writable: bool,
    ) -> DataResult<Self> {
        if name.is_empty() {
            return Err(DataError::InvalidArgument("block name must not be empty".into()));
        }
        if type_name.is_empty() {
            return Err(DataError::InvalidArgument("block type must not be empty".into()));
        }

        let id = Uuid::new_v4();
        log_event_with_fields(
            Event::BlockCreated,
            &[("name", name), ("id", &id.to_string())],
        );

        Ok(Self {
            id,
            name: name.to_string(),
            type_name: type_name.to_string(),
            arrays: Vec::new(),
            pending_release: Vec::new(),
            timestamps: Timestamps::on_create(),
            writable,
            store,
        })
    }

    pub(crate) fn restore(
        store: Arc<dyn PersistentStore>,
        record: BlockRecord,
        writable: bool,
    ) -> DataResult<Self> {
        let arrays = record
            .arrays
            .into_iter()
            .map(|a| DataArray::restore(store.clone(), a, writable))
            .collect::<DataResult<Vec<_>>>()?;

        Ok(Self {
            id: record.id,
            name: record.name,
            type_name: record.type_name,
            arrays,
            pending_release: Vec::new(),
            timestamps: Timestamps::restore(
                timestamp::from_seconds(record.created_at)?,
                timestamp::from_seconds(record.updated_at)?,
            ),
            writable,
            store,
        })
    }

    pub(crate) fn to_record(&self) -> BlockRecord {
        BlockRecord {
            id: self.id,
            name: self.name.clone(),
            type_name: self.type_name.clone(),
            created_at: timestamp::to_seconds(&self.timestamps.created_at()),
            updated_at: timestamp::to_seconds(&self.timestamps.updated_at()),
            arrays: self.arrays.iter().map(DataArray::to_record).collect(),
        }
    }

    /// Move every array to the pending-release list
    pub(crate) fn discard_arrays(&mut self) {
        self.pending_release.append(&mut self.arrays);
    }

    /// Release the payloads of deleted arrays.
    ///
    /// An array leaves the pending list only once its payload is gone, so
    /// a failed release is retried by the next call.
    pub(crate) fn release_pending(&mut self) -> DataResult<()> {
        while let Some(array) = self.pending_release.last() {
            array.release()?;
            self.pending_release.pop();
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn has_pending_release(&self) -> bool {
        !self.pending_release.is_empty()
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.timestamps.created_at()
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.timestamps.updated_at()
    }

    pub fn force_updated_at(&mut self, t: DateTime<Utc>) {
        self.timestamps.force_updated_at(t);
    }

    fn position(&self, name_or_id: &str) -> Option<usize> {
        self.arrays
            .iter()
            .position(|a| a.name() == name_or_id || a.id().to_string() == name_or_id)
    }

    /// Create a zero-filled array of `shape` elements of `data_type`.
    ///
    /// # Errors
    ///
    /// - `AlreadyExists` if the block already holds an array called `name`
    /// - `InvalidArgument` for an empty name or type
    /// - `ReadOnly` if the owning file was opened read-only
    pub fn create_data_array(
        &mut self,
        name: &str,
        type_name: &str,
        data_type: DataType,
        shape: NdSize,
    ) -> DataResult<&mut DataArray> {
        if !self.writable {
            return Err(DataError::ReadOnly);
        }
        if self.arrays.iter().any(|a| a.name() == name) {
            return Err(DataError::AlreadyExists(format!(
                "data array '{}' in block '{}'",
                name, self.name
            )));
        }

        let array = DataArray::create(self.store.clone(), name, type_name, data_type, shape)?;
        self.arrays.push(array);
        self.timestamps.touch();

        let last = self.arrays.len() - 1;
        Ok(&mut self.arrays[last])
    }

    pub fn has_data_array(&self, name_or_id: &str) -> bool {
        self.position(name_or_id).is_some()
    }

    /// Look up an array by name or id
    pub fn data_array(&self, name_or_id: &str) -> Option<&DataArray> {
        self.position(name_or_id).map(|i| &self.arrays[i])
    }

    pub fn data_array_mut(&mut self, name_or_id: &str) -> Option<&mut DataArray> {
        self.position(name_or_id).map(move |i| &mut self.arrays[i])
    }

    pub fn data_array_count(&self) -> usize {
        self.arrays.len()
    }

    /// Arrays in creation order
    pub fn data_arrays(&self) -> impl Iterator<Item = &DataArray> {
        self.arrays.iter()
    }

    /// Delete an array.
    ///
    /// The array disappears from the block at once. Its payload is released
    /// by the owning file's next flush, after the manifest no longer lists
    /// it.
    ///
    /// # Errors
    ///
    /// `NotFound` if no array matches `name_or_id`.
    pub fn delete_data_array(&mut self, name_or_id: &str) -> DataResult<()> {
        if !self.writable {
            return Err(DataError::ReadOnly);
        }
        let index = self
            .position(name_or_id)
            .ok_or_else(|| DataError::NotFound(format!("data array '{}'", name_or_id)))?;

        let array = self.arrays.remove(index);
        self.pending_release.push(array);
        self.timestamps.touch();
        Ok(())
    }
}

impl std::fmt::Debug for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Block")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("arrays", &self.arrays)
            .finish()
    }
}
