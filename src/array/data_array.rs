//! Data arrays
//!
//! A [`DataArray`] is a named, typed payload buffer in the persistent store
//! together with its metadata: label, unit, definition, calibration, the
//! per-axis [`DimensionCatalog`] and creation/update timestamps.
//!
//! Mutating calls take `&mut self`; callers sharing an array across threads
//! must serialize access themselves.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::datatype::{decode_into, encode_all, DataType, Element};
use crate::dimension::{Dimension, DimensionCatalog};
use crate::errors::{DataError, DataResult};
use crate::manifest::ArrayRecord;
use crate::observability::{log_event_with_fields, log_rejection, Event};
use crate::shape::{Hyperslab, NdSize};
use crate::store::{checked_byte_len, BufferHandle, PersistentStore};
use crate::timestamp::{self, Timestamps};
use crate::units;

pub struct DataArray {
    id: Uuid,
    name: String,
    type_name: String,
    definition: Option<String>,
    label: Option<String>,
    unit: Option<String>,
    polynom_coefficients: Vec<f64>,
    expansion_origin: Option<f64>,
    buffer: BufferHandle,
    dimensions: DimensionCatalog,
    timestamps: Timestamps,
    writable: bool,
    store: Arc<dyn PersistentStore>,
}

fn blank_to_none(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

impl DataArray {
    /// Allocate a new array's payload and metadata.
    pub(crate) fn create(
        store: Arc<dyn PersistentStore>,
        name: &str,
        type_name: &str,
        data_type: DataType,
        shape: NdSize,
    ) -> DataResult<Self> {
        if name.is_empty() {
            return Err(DataError::InvalidArgument("data array name must not be empty".into()));
        }
        if type_name.is_empty() {
            return Err(DataError::InvalidArgument("data array type must not be empty".into()));
        }

        if checked_byte_len(data_type, &shape).is_err() {
            return Err(DataError::InvalidArgument(format!(
                "shape {} of {} is too large to allocate",
                shape,
                data_type.as_str()
            )));
        }

        let id = Uuid::new_v4();
        let buffer = store.allocate(&id.to_string(), data_type, &shape)?;

        log_event_with_fields(
            Event::ArrayCreated,
            &[
                ("name", name),
                ("id", &id.to_string()),
                ("data_type", data_type.as_str()),
                ("shape", &shape.to_string()),
            ],
        );

        Ok(Self {
            id,
            name: name.to_string(),
            type_name: type_name.to_string(),
            definition: None,
            label: None,
            unit: None,
            polynom_coefficients: Vec::new(),
            expansion_origin: None,
            buffer,
            dimensions: DimensionCatalog::new(),
            timestamps: Timestamps::on_create(),
            writable: true,
            store,
        })
    }

    /// Rebuild an array from its persisted record and re-attach its payload.
    pub(crate) fn restore(
        store: Arc<dyn PersistentStore>,
        record: ArrayRecord,
        writable: bool,
    ) -> DataResult<Self> {
        let buffer = store.attach(&record.id.to_string(), record.data_type, &record.shape)?;
        let timestamps = Timestamps::restore(
            timestamp::from_seconds(record.created_at)?,
            timestamp::from_seconds(record.updated_at)?,
        );

        Ok(Self {
            id: record.id,
            name: record.name,
            type_name: record.type_name,
            definition: record.definition,
            label: record.label,
            unit: record.unit,
            polynom_coefficients: record.polynom_coefficients,
            expansion_origin: record.expansion_origin,
            buffer,
            dimensions: record.dimensions,
            timestamps,
            writable,
            store,
        })
    }

    pub(crate) fn to_record(&self) -> ArrayRecord {
        ArrayRecord {
            id: self.id,
            name: self.name.clone(),
            type_name: self.type_name.clone(),
            definition: self.definition.clone(),
            label: self.label.clone(),
            unit: self.unit.clone(),
            polynom_coefficients: self.polynom_coefficients.clone(),
            expansion_origin: self.expansion_origin,
            data_type: self.buffer.data_type,
            shape: self.buffer.shape.clone(),
            dimensions: self.dimensions.clone(),
            created_at: timestamp::to_seconds(&self.timestamps.created_at()),
            updated_at: timestamp::to_seconds(&self.timestamps.updated_at()),
        }
    }

    /// Drop the payload from the store.
    pub(crate) fn release(&self) -> DataResult<()> {
        self.store.release(&self.buffer)?;
        log_event_with_fields(
            Event::ArrayDeleted,
            &[("name", &self.name), ("id", &self.id.to_string())],
        );
        Ok(())
    }

    // =========================================================================
    // Identity and attributes
    // =========================================================================

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn data_type(&self) -> DataType {
        self.buffer.data_type
    }

    /// Extents of the persisted payload
    pub fn data_extent(&self) -> &NdSize {
        &self.buffer.shape
    }

    pub fn definition(&self) -> Option<&str> {
        self.definition.as_deref()
    }

    pub fn set_definition(&mut self, definition: Option<&str>) {
        self.definition = blank_to_none(definition);
        self.timestamps.touch();
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn set_label(&mut self, label: Option<&str>) {
        self.label = blank_to_none(label);
        self.timestamps.touch();
    }

    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    /// Set or clear the unit.
    ///
    /// # Errors
    ///
    /// `InvalidUnit` if `unit` does not parse; the previous unit is kept.
    pub fn set_unit(&mut self, unit: Option<&str>) -> DataResult<()> {
        match units::normalize_optional(unit) {
            Ok(normalized) => {
                self.unit = normalized;
                self.timestamps.touch();
                Ok(())
            }
            Err(e) => {
                log_rejection(
                    Event::UnitRejected,
                    &[("array", &self.name), ("unit", unit.unwrap_or_default())],
                );
                Err(e)
            }
        }
    }

    pub fn polynom_coefficients(&self) -> &[f64] {
        &self.polynom_coefficients
    }

    /// Calibration polynomial, lowest order first. Empty clears it.
    pub fn set_polynom_coefficients(&mut self, coefficients: Vec<f64>) {
        self.polynom_coefficients = coefficients;
        self.timestamps.touch();
    }

    pub fn expansion_origin(&self) -> Option<f64> {
        self.expansion_origin
    }

    pub fn set_expansion_origin(&mut self, origin: Option<f64>) {
        self.expansion_origin = origin;
        self.timestamps.touch();
    }

    /// Apply the calibration polynomial to a raw value.
    pub fn calibrate(&self, raw: f64) -> f64 {
        if self.polynom_coefficients.is_empty() {
            return raw;
        }
        let x = raw - self.expansion_origin.unwrap_or(0.0);
        // Horner
        self.polynom_coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, c| acc * x + c)
    }

    // =========================================================================
    // Timestamps
    // =========================================================================

    pub fn created_at(&self) -> DateTime<Utc> {
        self.timestamps.created_at()
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.timestamps.updated_at()
    }

    /// Overwrite the creation time, bypassing the normal update rule.
    pub fn force_created_at(&mut self, t: DateTime<Utc>) {
        self.timestamps.force_created_at(t);
    }

    /// Overwrite the update time, bypassing the normal update rule.
    pub fn force_updated_at(&mut self, t: DateTime<Utc>) {
        self.timestamps.force_updated_at(t);
    }

    // =========================================================================
    // Dimensions
    // =========================================================================

    pub fn dimensions(&self) -> &DimensionCatalog {
        &self.dimensions
    }

    pub fn dimension_count(&self) -> usize {
        self.dimensions.size()
    }

    /// Dimension at 1-based `position`, if any
    pub fn dimension(&self, position: usize) -> Option<&Dimension> {
        self.dimensions.get(position)
    }

    pub fn dimension_mut(&mut self, position: usize) -> Option<&mut Dimension> {
        self.dimensions.get_mut(position)
    }

    /// Insert `dim` at `position`, shifting later dimensions up.
    pub fn insert_dimension(&mut self, position: usize, dim: Dimension) -> DataResult<&mut Dimension> {
        let kind = dim.kind();
        let inserted = self.dimensions.insert(position, dim)?;
        log_event_with_fields(
            Event::DimensionInserted,
            &[
                ("array", &self.name),
                ("kind", kind.as_str()),
                ("position", &position.to_string()),
            ],
        );
        Ok(inserted)
    }

    pub fn append_dimension(&mut self, dim: Dimension) -> &mut Dimension {
        let position = self.dimensions.size() + 1;
        log_event_with_fields(
            Event::DimensionInserted,
            &[
                ("array", &self.name),
                ("kind", dim.kind().as_str()),
                ("position", &position.to_string()),
            ],
        );
        self.dimensions.append(dim)
    }

    pub fn create_set_dimension(&mut self, position: usize) -> DataResult<&mut Dimension> {
        self.insert_dimension(position, Dimension::set())
    }

    pub fn create_sampled_dimension(
        &mut self,
        position: usize,
        sampling_interval: f64,
    ) -> DataResult<&mut Dimension> {
        let dim = Dimension::sampled(sampling_interval)?;
        self.insert_dimension(position, dim)
    }

    /// # Errors
    ///
    /// `InvalidArgument` for empty `ticks` or a bad position; the catalog
    /// is left as it was.
    pub fn create_range_dimension(
        &mut self,
        position: usize,
        ticks: Vec<f64>,
    ) -> DataResult<&mut Dimension> {
        let dim = Dimension::range(ticks)?;
        self.insert_dimension(position, dim)
    }

    pub fn append_set_dimension(&mut self) -> &mut Dimension {
        self.append_dimension(Dimension::set())
    }

    pub fn append_sampled_dimension(&mut self, sampling_interval: f64) -> DataResult<&mut Dimension> {
        let dim = Dimension::sampled(sampling_interval)?;
        Ok(self.append_dimension(dim))
    }

    pub fn append_range_dimension(&mut self, ticks: Vec<f64>) -> DataResult<&mut Dimension> {
        let dim = Dimension::range(ticks)?;
        Ok(self.append_dimension(dim))
    }

    /// Swap the dimension at an occupied `position`, returning the old one.
    pub fn replace_dimension(&mut self, position: usize, dim: Dimension) -> DataResult<Dimension> {
        let old = self.dimensions.replace(position, dim)?;
        log_event_with_fields(
            Event::DimensionReplaced,
            &[("array", &self.name), ("position", &position.to_string())],
        );
        Ok(old)
    }

    /// Remove the dimension at `position`; later dimensions move down.
    ///
    /// # Errors
    ///
    /// `NotFound` if `position` is not occupied.
    pub fn delete_dimension(&mut self, position: usize) -> DataResult<()> {
        self.dimensions.delete(position)?;
        log_event_with_fields(
            Event::DimensionDeleted,
            &[("array", &self.name), ("position", &position.to_string())],
        );
        Ok(())
    }

    // =========================================================================
    // Payload
    // =========================================================================

    fn check_element<T: Element>(&self) -> DataResult<()> {
        if T::DATA_TYPE != self.buffer.data_type {
            return Err(DataError::TypeMismatch {
                expected: self.buffer.data_type.as_str(),
                actual: T::DATA_TYPE.as_str(),
            });
        }
        Ok(())
    }

    fn check_len(slab: &Hyperslab, actual: usize) -> DataResult<()> {
        let expected = slab.element_count();
        if expected != actual {
            return Err(DataError::SizeMismatch { expected, actual });
        }
        Ok(())
    }

    /// Replace the region at `offset` of extent `count` with `data`
    /// (row-major over `count`). With no `count` the whole payload is
    /// written.
    ///
    /// # Errors
    ///
    /// - `TypeMismatch` if `T` is not the array's element type
    /// - `OutOfBounds` if the region does not fit the payload
    /// - `SizeMismatch` if `data.len()` differs from the region's size
    /// - `ReadOnly` if the owning file was opened read-only
    ///
    /// Nothing is written on error.
    pub fn write_data<T: Element>(
        &mut self,
        data: &[T],
        offset: Option<&NdSize>,
        count: Option<&NdSize>,
    ) -> DataResult<()> {
        self.check_element::<T>()?;
        let slab = Hyperslab::resolve(&self.buffer.shape, offset, count)?;
        Self::check_len(&slab, data.len())?;
        if !self.writable {
            return Err(DataError::ReadOnly);
        }
        if slab.is_empty() {
            return Ok(());
        }

        self.store
            .write_region(&self.buffer, &slab, &encode_all(data))?;
        log_event_with_fields(
            Event::RegionWritten,
            &[
                ("array", &self.name),
                ("offset", &slab.offset().to_string()),
                ("count", &slab.count().to_string()),
            ],
        );
        Ok(())
    }

    /// Write the whole payload
    pub fn write_all<T: Element>(&mut self, data: &[T]) -> DataResult<()> {
        self.write_data(data, None, None)
    }

    /// Fill `out` with the region at `offset` of extent `count`.
    ///
    /// `out` must be exactly the region's size; errors match
    /// [`DataArray::write_data`] and leave `out` untouched.
    pub fn read_data<T: Element>(
        &self,
        out: &mut [T],
        offset: Option<&NdSize>,
        count: Option<&NdSize>,
    ) -> DataResult<()> {
        self.check_element::<T>()?;
        let slab = Hyperslab::resolve(&self.buffer.shape, offset, count)?;
        Self::check_len(&slab, out.len())?;
        if slab.is_empty() {
            return Ok(());
        }

        let bytes = self.store.read_region(&self.buffer, &slab)?;
        decode_into(&bytes, out);
        log_event_with_fields(
            Event::RegionRead,
            &[
                ("array", &self.name),
                ("offset", &slab.offset().to_string()),
                ("count", &slab.count().to_string()),
            ],
        );
        Ok(())
    }

    /// Read the whole payload
    pub fn read_all<T: Element>(&self) -> DataResult<Vec<T>> {
        let mut out = vec![T::default(); self.buffer.shape.element_count()];
        self.read_data(&mut out, None, None)?;
        Ok(out)
    }

    /// Read a region and apply the calibration polynomial
    pub fn read_calibrated<T: Element>(
        &self,
        offset: Option<&NdSize>,
        count: Option<&NdSize>,
    ) -> DataResult<Vec<f64>> {
        let slab = Hyperslab::resolve(&self.buffer.shape, offset, count)?;
        let mut raw = vec![T::default(); slab.element_count()];
        self.read_data(&mut raw, offset, count)?;
        Ok(raw.into_iter().map(|v| self.calibrate(v.to_f64())).collect())
    }

    #[cfg(test)]
    pub(crate) fn set_writable(&mut self, writable: bool) {
        self.writable = writable;
    }
}

impl std::fmt::Debug for DataArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataArray")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("data_type", &self.buffer.data_type)
            .field("shape", &self.buffer.shape)
            .field("dimensions", &self.dimensions.size())
            .finish()
    }
}
