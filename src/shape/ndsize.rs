//! Shape vectors
//!
//! An [`NdSize`] is the ordered list of per-axis extents of an array or of
//! a region inside one. Its rank is the number of axes.

use std::fmt;
use std::ops::Index;

use serde::{Deserialize, Serialize};

/// Ordered, fixed-length vector of non-negative per-axis extents
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NdSize {
    extents: Vec<usize>,
}

impl NdSize {
    /// Create a shape from explicit extents
    pub fn new(extents: Vec<usize>) -> Self {
        Self { extents }
    }

    /// All-zero shape of the given rank
    pub fn zeros(rank: usize) -> Self {
        Self {
            extents: vec![0; rank],
        }
    }

    /// Number of axes
    pub fn rank(&self) -> usize {
        self.extents.len()
    }

    /// Product of the extents; 0 for a rank-0 shape.
    ///
    /// Saturates at `usize::MAX`. Shapes that reach a store have already
    /// passed [`NdSize::checked_element_count`].
    pub fn element_count(&self) -> usize {
        self.checked_element_count().unwrap_or(usize::MAX)
    }

    /// Product of the extents, or `None` when it overflows `usize`
    pub fn checked_element_count(&self) -> Option<usize> {
        if self.extents.is_empty() || self.extents.contains(&0) {
            return Some(0);
        }
        self.extents
            .iter()
            .try_fold(1usize, |acc, &extent| acc.checked_mul(extent))
    }

    /// True when every extent is zero (or the shape has no axes)
    pub fn is_zero(&self) -> bool {
        self.extents.iter().all(|&e| e == 0)
    }

    pub fn extents(&self) -> &[usize] {
        &self.extents
    }

    pub fn get(&self, axis: usize) -> Option<usize> {
        self.extents.get(axis).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &usize> {
        self.extents.iter()
    }

    /// Component-wise `self[i] <= other[i]` over equal ranks
    pub fn fits_within(&self, other: &NdSize) -> bool {
        self.rank() == other.rank()
            && self
                .extents
                .iter()
                .zip(other.extents.iter())
                .all(|(a, b)| a <= b)
    }
}

impl Index<usize> for NdSize {
    type Output = usize;

    fn index(&self, axis: usize) -> &usize {
        &self.extents[axis]
    }
}

impl From<Vec<usize>> for NdSize {
    fn from(extents: Vec<usize>) -> Self {
        Self::new(extents)
    }
}

impl From<&[usize]> for NdSize {
    fn from(extents: &[usize]) -> Self {
        Self::new(extents.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for NdSize {
    fn from(extents: [usize; N]) -> Self {
        Self::new(extents.to_vec())
    }
}

impl fmt::Display for NdSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, e) in self.extents.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", e)?;
        }
        write!(f, "}}")
    }
}
