//! Hyperslab addressing
//!
//! A hyperslab is a rectangular region of an array described by an offset
//! vector and a count vector. Regions are always resolved against the shape
//! of the array they address; a resolved [`Hyperslab`] is guaranteed to fit.
//!
//! Linearization is row-major: the last axis varies fastest. Callers hand
//! over (or receive) a flat buffer laid out in row-major order of `count`.

use crate::errors::{DataError, DataResult};

use super::ndsize::NdSize;

/// Row-major linear index of `coord` inside a box of `extents`.
///
/// # Errors
///
/// `OutOfBounds` if the ranks differ or any coordinate component is not
/// below its extent.
pub fn flatten(coord: &[usize], extents: &[usize]) -> DataResult<usize> {
    if coord.len() != extents.len() {
        return Err(DataError::OutOfBounds(format!(
            "coordinate rank {} does not match extent rank {}",
            coord.len(),
            extents.len()
        )));
    }

    let mut index = 0usize;
    for (axis, (&c, &e)) in coord.iter().zip(extents.iter()).enumerate() {
        if c >= e {
            return Err(DataError::OutOfBounds(format!(
                "coordinate {} on axis {} exceeds extent {}",
                c, axis, e
            )));
        }
        index = index * e + c;
    }
    Ok(index)
}

/// Inverse of [`flatten`].
pub fn unflatten(index: usize, extents: &[usize]) -> DataResult<NdSize> {
    let total = NdSize::new(extents.to_vec()).element_count();
    if index >= total {
        return Err(DataError::OutOfBounds(format!(
            "linear index {} outside {} elements",
            index, total
        )));
    }

    let mut coord = vec![0usize; extents.len()];
    let mut rest = index;
    for axis in (0..extents.len()).rev() {
        coord[axis] = rest % extents[axis];
        rest /= extents[axis];
    }
    Ok(NdSize::new(coord))
}

/// A contiguous stretch of an array's flat payload, in elements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    /// Linear index of the first element in the array's payload
    pub start: usize,
    /// Number of consecutive elements
    pub len: usize,
}

/// A region resolved against a concrete array shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hyperslab {
    shape: NdSize,
    offset: NdSize,
    count: NdSize,
}

impl Hyperslab {
    /// Resolve an optional offset and count against `shape`.
    ///
    /// - no count: the whole array; the offset must be absent or all zero
    /// - no offset: all-zero offset
    ///
    /// # Errors
    ///
    /// `OutOfBounds` on a rank mismatch or when `offset[i] + count[i]`
    /// exceeds `shape[i]` for any axis.
    pub fn resolve(
        shape: &NdSize,
        offset: Option<&NdSize>,
        count: Option<&NdSize>,
    ) -> DataResult<Self> {
        if shape.checked_element_count().is_none() {
            return Err(DataError::InvalidArgument(format!(
                "shape {} has more elements than can be addressed",
                shape
            )));
        }

        if let Some(offset) = offset {
            if offset.rank() != shape.rank() {
                return Err(DataError::OutOfBounds(format!(
                    "offset {} has rank {}, array {} has rank {}",
                    offset,
                    offset.rank(),
                    shape,
                    shape.rank()
                )));
            }
        }

        let count = match count {
            None => {
                if offset.map_or(false, |o| !o.is_zero()) {
                    return Err(DataError::OutOfBounds(
                        "a whole-array transfer cannot start at a non-zero offset".into(),
                    ));
                }
                shape.clone()
            }
            Some(count) => {
                if count.rank() != shape.rank() {
                    return Err(DataError::OutOfBounds(format!(
                        "count {} has rank {}, array {} has rank {}",
                        count,
                        count.rank(),
                        shape,
                        shape.rank()
                    )));
                }
                count.clone()
            }
        };

        let offset = offset
            .cloned()
            .unwrap_or_else(|| NdSize::zeros(shape.rank()));

        for axis in 0..shape.rank() {
            let end = offset[axis].checked_add(count[axis]);
            if end.map_or(true, |end| end > shape[axis]) {
                return Err(DataError::OutOfBounds(format!(
                    "axis {}: offset {} + count {} exceeds extent {}",
                    axis, offset[axis], count[axis], shape[axis]
                )));
            }
        }

        Ok(Self {
            shape: shape.clone(),
            offset,
            count,
        })
    }

    /// The whole of `shape`
    pub fn whole(shape: &NdSize) -> Self {
        Self {
            shape: shape.clone(),
            offset: NdSize::zeros(shape.rank()),
            count: shape.clone(),
        }
    }

    pub fn shape(&self) -> &NdSize {
        &self.shape
    }

    pub fn offset(&self) -> &NdSize {
        &self.offset
    }

    pub fn count(&self) -> &NdSize {
        &self.count
    }

    /// Number of addressed elements
    pub fn element_count(&self) -> usize {
        self.count.element_count()
    }

    /// Empty transfers are no-ops
    pub fn is_empty(&self) -> bool {
        self.element_count() == 0
    }

    /// Map a coordinate local to the region onto the array's flat payload.
    pub fn payload_index(&self, local: &[usize]) -> DataResult<usize> {
        // validates `local` against the region
        flatten(local, self.count.extents())?;
        let global: Vec<usize> = local
            .iter()
            .zip(self.offset.iter())
            .map(|(l, o)| l + o)
            .collect();
        flatten(&global, self.shape.extents())
    }

    /// Decompose the region into contiguous runs of the array payload.
    ///
    /// Runs come out in row-major order of the region, so the caller's
    /// flat buffer is consumed front to back. Trailing axes that are
    /// selected in full are merged into a single run.
    pub fn runs(&self) -> Vec<Run> {
        if self.is_empty() {
            return Vec::new();
        }

        let rank = self.shape.rank();
        let mut split = rank - 1;
        while split > 0 && self.count[split] == self.shape[split] {
            split -= 1;
        }

        let run_len: usize = self.count.extents()[split..].iter().product();
        let outer = &self.count.extents()[..split];
        let n_runs: usize = outer.iter().product();

        let mut runs = Vec::with_capacity(n_runs);
        let mut coord = vec![0usize; rank];
        for i in 0..n_runs {
            let mut rest = i;
            for axis in (0..split).rev() {
                coord[axis] = self.offset[axis] + rest % outer[axis];
                rest /= outer[axis];
            }
            for axis in split..rank {
                coord[axis] = self.offset[axis];
            }
            // in bounds by construction
            let start = coord
                .iter()
                .zip(self.shape.iter())
                .fold(0usize, |acc, (&c, &e)| acc * e + c);
            runs.push(Run { start, len: run_len });
        }
        runs
    }
}
