//! Position-addressed dimension catalog
//!
//! Dimensions have no identity of their own; callers address them by their
//! 1-based slot. Positions are always the dense sequence `1..=size()`:
//! inserting shifts later entries up, deleting shifts them down.

use serde::{Deserialize, Serialize};

use crate::errors::{DataError, DataResult};

use super::types::Dimension;

/// Ordered per-axis descriptors of one data array
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DimensionCatalog {
    dims: Vec<Dimension>,
}

impl DimensionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of dimensions
    pub fn size(&self) -> usize {
        self.dims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dims.is_empty()
    }

    /// Dimension at `position`, `None` outside `1..=size()`
    pub fn get(&self, position: usize) -> Option<&Dimension> {
        position.checked_sub(1).and_then(|i| self.dims.get(i))
    }

    pub fn get_mut(&mut self, position: usize) -> Option<&mut Dimension> {
        position.checked_sub(1).and_then(move |i| self.dims.get_mut(i))
    }

    /// Insert `dim` at `position`; dimensions at or after it move up one.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` unless `position` is in `1..=size() + 1`. The
    /// catalog is unchanged on error.
    pub fn insert(&mut self, position: usize, dim: Dimension) -> DataResult<&mut Dimension> {
        if position == 0 || position > self.dims.len() + 1 {
            return Err(DataError::InvalidArgument(format!(
                "dimension position {} outside 1..={}",
                position,
                self.dims.len() + 1
            )));
        }
        let index = position - 1;
        self.dims.insert(index, dim);
        Ok(&mut self.dims[index])
    }

    /// Insert after the last dimension
    pub fn append(&mut self, dim: Dimension) -> &mut Dimension {
        self.dims.push(dim);
        let last = self.dims.len() - 1;
        &mut self.dims[last]
    }

    /// Swap the dimension at an existing `position` for `dim`, returning
    /// the old one. Other positions are unaffected.
    pub fn replace(&mut self, position: usize, dim: Dimension) -> DataResult<Dimension> {
        let slot = self
            .get_mut(position)
            .ok_or_else(|| DataError::NotFound(format!("dimension {}", position)))?;
        Ok(std::mem::replace(slot, dim))
    }

    /// Remove the dimension at `position`; later dimensions move down one.
    ///
    /// # Errors
    ///
    /// `NotFound` if nothing sits at `position`.
    pub fn delete(&mut self, position: usize) -> DataResult<Dimension> {
        if position == 0 || position > self.dims.len() {
            return Err(DataError::NotFound(format!("dimension {}", position)));
        }
        Ok(self.dims.remove(position - 1))
    }

    /// Remove every dimension
    pub fn clear(&mut self) {
        self.dims.clear();
    }

    /// `(position, dimension)` pairs in position order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Dimension)> {
        self.dims.iter().enumerate().map(|(i, d)| (i + 1, d))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimension::DimensionKind;

    fn kinds(catalog: &DimensionCatalog) -> Vec<DimensionKind> {
        catalog.iter().map(|(_, d)| d.kind()).collect()
    }

    #[test]
    fn test_insert_shifts_later_entries() {
        let mut catalog = DimensionCatalog::new();
        catalog.append(Dimension::set());
        catalog.append(Dimension::range(vec![1.0]).unwrap());
        catalog.insert(1, Dimension::sampled(1.0).unwrap()).unwrap();

        assert_eq!(
            kinds(&catalog),
            vec![DimensionKind::Sampled, DimensionKind::Set, DimensionKind::Range]
        );
    }

    #[test]
    fn test_insert_position_bounds() {
        let mut catalog = DimensionCatalog::new();
        assert!(matches!(
            catalog.insert(0, Dimension::set()),
            Err(DataError::InvalidArgument(_))
        ));
        assert!(catalog.insert(2, Dimension::set()).is_err());
        assert_eq!(catalog.size(), 0);

        catalog.insert(1, Dimension::set()).unwrap();
        catalog.insert(2, Dimension::set()).unwrap();
        assert_eq!(catalog.size(), 2);
    }

    #[test]
    fn test_get_outside_bounds_is_none() {
        let mut catalog = DimensionCatalog::new();
        assert!(catalog.get(1).is_none());
        catalog.append(Dimension::set());
        assert!(catalog.get(0).is_none());
        assert!(catalog.get(1).is_some());
        assert!(catalog.get(2).is_none());
    }

    #[test]
    fn test_delete_renumbers() {
        let mut catalog = DimensionCatalog::new();
        catalog.append(Dimension::sampled(1.0).unwrap());
        catalog.append(Dimension::set());
        catalog.append(Dimension::range(vec![1.0]).unwrap());

        catalog.delete(1).unwrap();
        assert_eq!(kinds(&catalog), vec![DimensionKind::Set, DimensionKind::Range]);
        let positions: Vec<usize> = catalog.iter().map(|(p, _)| p).collect();
        assert_eq!(positions, vec![1, 2]);
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let mut catalog = DimensionCatalog::new();
        assert!(matches!(catalog.delete(1), Err(DataError::NotFound(_))));
        catalog.append(Dimension::set());
        assert!(matches!(catalog.delete(0), Err(DataError::NotFound(_))));
        assert!(matches!(catalog.delete(2), Err(DataError::NotFound(_))));
        assert_eq!(catalog.size(), 1);
    }

    #[test]
    fn test_replace_keeps_positions() {
        let mut catalog = DimensionCatalog::new();
        catalog.append(Dimension::set());
        catalog.append(Dimension::set());

        let old = catalog.replace(2, Dimension::sampled(0.1).unwrap()).unwrap();
        assert_eq!(old.kind(), DimensionKind::Set);
        assert_eq!(kinds(&catalog), vec![DimensionKind::Set, DimensionKind::Sampled]);
        assert!(matches!(
            catalog.replace(3, Dimension::set()),
            Err(DataError::NotFound(_))
        ));
    }
}
