//! Dimension descriptor types
//!
//! The kind set is closed: [`Dimension`] is either a categorical
//! [`SetDimension`], a regularly [`SampledDimension`], or an irregular
//! [`RangeDimension`] with explicit ticks.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{DataError, DataResult};
use crate::units;

/// Dimension kind tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimensionKind {
    Set,
    Sampled,
    Range,
}

impl DimensionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DimensionKind::Set => "set",
            DimensionKind::Sampled => "sampled",
            DimensionKind::Range => "range",
        }
    }
}

impl fmt::Display for DimensionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Categorical axis, optionally naming each category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetDimension {
    #[serde(default)]
    labels: Vec<String>,
}

impl SetDimension {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_labels(labels: Vec<String>) -> Self {
        Self { labels }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn set_labels(&mut self, labels: Vec<String>) {
        self.labels = labels;
    }
}

/// Regularly sampled axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampledDimension {
    sampling_interval: f64,
    #[serde(default)]
    offset: Option<f64>,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default)]
    label: Option<String>,
}

fn check_interval(interval: f64) -> DataResult<()> {
    if !(interval.is_finite() && interval > 0.0) {
        return Err(DataError::InvalidArgument(format!(
            "sampling interval must be > 0, got {}",
            interval
        )));
    }
    Ok(())
}

impl SampledDimension {
    /// # Errors
    ///
    /// `InvalidArgument` unless `sampling_interval` is finite and > 0.
    pub fn new(sampling_interval: f64) -> DataResult<Self> {
        check_interval(sampling_interval)?;
        Ok(Self {
            sampling_interval,
            offset: None,
            unit: None,
            label: None,
        })
    }

    pub fn sampling_interval(&self) -> f64 {
        self.sampling_interval
    }

    pub fn set_sampling_interval(&mut self, interval: f64) -> DataResult<()> {
        check_interval(interval)?;
        self.sampling_interval = interval;
        Ok(())
    }

    pub fn offset(&self) -> Option<f64> {
        self.offset
    }

    pub fn set_offset(&mut self, offset: Option<f64>) {
        self.offset = offset;
    }

    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    /// Set or clear the axis unit. A rejected unit keeps the old value.
    pub fn set_unit(&mut self, unit: Option<&str>) -> DataResult<()> {
        self.unit = units::normalize_optional(unit)?;
        Ok(())
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn set_label(&mut self, label: Option<&str>) {
        self.label = label.map(str::to_string);
    }

    /// Axis coordinate of sample `index`
    pub fn position_at(&self, index: usize) -> f64 {
        self.offset.unwrap_or(0.0) + index as f64 * self.sampling_interval
    }

    /// Nearest sample index for an axis coordinate
    pub fn index_of(&self, position: f64) -> DataResult<usize> {
        let steps = ((position - self.offset.unwrap_or(0.0)) / self.sampling_interval).round();
        if !steps.is_finite() || steps < 0.0 {
            return Err(DataError::OutOfBounds(format!(
                "position {} lies before the first sample",
                position
            )));
        }
        Ok(steps as usize)
    }

    /// Coordinates of `count` samples starting at `start`
    pub fn axis(&self, count: usize, start: usize) -> Vec<f64> {
        (start..start + count).map(|i| self.position_at(i)).collect()
    }
}

/// Irregularly sampled axis with explicit ticks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeDimension {
    ticks: Vec<f64>,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default)]
    label: Option<String>,
}

fn check_ticks(ticks: &[f64]) -> DataResult<()> {
    if ticks.is_empty() {
        return Err(DataError::InvalidArgument(
            "range dimension requires at least one tick".into(),
        ));
    }
    Ok(())
}

impl RangeDimension {
    /// # Errors
    ///
    /// `InvalidArgument` for an empty tick sequence.
    pub fn new(ticks: Vec<f64>) -> DataResult<Self> {
        check_ticks(&ticks)?;
        Ok(Self {
            ticks,
            unit: None,
            label: None,
        })
    }

    pub fn ticks(&self) -> &[f64] {
        &self.ticks
    }

    pub fn set_ticks(&mut self, ticks: Vec<f64>) -> DataResult<()> {
        check_ticks(&ticks)?;
        self.ticks = ticks;
        Ok(())
    }

    /// Whether ticks are strictly increasing
    pub fn is_strictly_increasing(&self) -> bool {
        self.ticks.windows(2).all(|w| w[0] < w[1])
    }

    pub fn tick_at(&self, index: usize) -> Option<f64> {
        self.ticks.get(index).copied()
    }

    /// Index of the first tick at or above `value`
    pub fn index_of(&self, value: f64) -> DataResult<usize> {
        self.ticks
            .iter()
            .position(|&t| t >= value)
            .ok_or_else(|| {
                DataError::OutOfBounds(format!("{} lies beyond the last tick", value))
            })
    }

    /// Ticks `start..start + count`
    pub fn axis(&self, count: usize, start: usize) -> DataResult<Vec<f64>> {
        let end = start.checked_add(count).filter(|&e| e <= self.ticks.len());
        match end {
            Some(end) => Ok(self.ticks[start..end].to_vec()),
            None => Err(DataError::OutOfBounds(format!(
                "ticks {}..{}+{} exceed {} ticks",
                start,
                start,
                count,
                self.ticks.len()
            ))),
        }
    }

    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    /// Set or clear the axis unit. A rejected unit keeps the old value.
    pub fn set_unit(&mut self, unit: Option<&str>) -> DataResult<()> {
        self.unit = units::normalize_optional(unit)?;
        Ok(())
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn set_label(&mut self, label: Option<&str>) {
        self.label = label.map(str::to_string);
    }
}

/// Per-axis descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Dimension {
    Set(SetDimension),
    Sampled(SampledDimension),
    Range(RangeDimension),
}

impl Dimension {
    pub fn set() -> Self {
        Dimension::Set(SetDimension::new())
    }

    pub fn sampled(sampling_interval: f64) -> DataResult<Self> {
        SampledDimension::new(sampling_interval).map(Dimension::Sampled)
    }

    pub fn range(ticks: Vec<f64>) -> DataResult<Self> {
        RangeDimension::new(ticks).map(Dimension::Range)
    }

    pub fn kind(&self) -> DimensionKind {
        match self {
            Dimension::Set(_) => DimensionKind::Set,
            Dimension::Sampled(_) => DimensionKind::Sampled,
            Dimension::Range(_) => DimensionKind::Range,
        }
    }

    /// Unit of the axis; set dimensions never carry one
    pub fn unit(&self) -> Option<&str> {
        match self {
            Dimension::Set(_) => None,
            Dimension::Sampled(d) => d.unit(),
            Dimension::Range(d) => d.unit(),
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            Dimension::Set(_) => None,
            Dimension::Sampled(d) => d.label(),
            Dimension::Range(d) => d.label(),
        }
    }

    pub fn as_set(&self) -> Option<&SetDimension> {
        match self {
            Dimension::Set(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_sampled(&self) -> Option<&SampledDimension> {
        match self {
            Dimension::Sampled(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_range(&self) -> Option<&RangeDimension> {
        match self {
            Dimension::Range(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_set_mut(&mut self) -> Option<&mut SetDimension> {
        match self {
            Dimension::Set(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_sampled_mut(&mut self) -> Option<&mut SampledDimension> {
        match self {
            Dimension::Sampled(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_range_mut(&mut self) -> Option<&mut RangeDimension> {
        match self {
            Dimension::Range(d) => Some(d),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sampled_interval_must_be_positive() {
        assert!(SampledDimension::new(0.5).is_ok());
        assert!(matches!(
            SampledDimension::new(0.0),
            Err(DataError::InvalidArgument(_))
        ));
        assert!(SampledDimension::new(-1.0).is_err());
        assert!(SampledDimension::new(f64::NAN).is_err());

        let mut dim = SampledDimension::new(1.0).unwrap();
        assert!(dim.set_sampling_interval(-2.0).is_err());
        assert_eq!(dim.sampling_interval(), 1.0);
    }

    #[test]
    fn test_sampled_positions() {
        let mut dim = SampledDimension::new(0.5).unwrap();
        dim.set_offset(Some(10.0));
        assert_eq!(dim.position_at(0), 10.0);
        assert_eq!(dim.position_at(4), 12.0);
        assert_eq!(dim.index_of(12.1).unwrap(), 4);
        assert!(dim.index_of(5.0).is_err());
        assert_eq!(dim.axis(3, 1), vec![10.5, 11.0, 11.5]);
    }

    #[test]
    fn test_sampled_unit_rejection_keeps_previous() {
        let mut dim = SampledDimension::new(1.0).unwrap();
        dim.set_unit(Some("ms")).unwrap();
        assert!(dim.set_unit(Some("fortnight")).is_err());
        assert_eq!(dim.unit(), Some("ms"));
        dim.set_unit(None).unwrap();
        assert_eq!(dim.unit(), None);
    }

    #[test]
    fn test_range_rejects_empty_ticks() {
        assert!(matches!(
            RangeDimension::new(vec![]),
            Err(DataError::InvalidArgument(_))
        ));
        let mut dim = RangeDimension::new(vec![1.0, 2.0]).unwrap();
        assert!(dim.set_ticks(vec![]).is_err());
        assert_eq!(dim.ticks(), &[1.0, 2.0]);
    }

    #[test]
    fn test_range_lookup() {
        let dim = RangeDimension::new(vec![0.0, 1.5, 4.0, 9.0]).unwrap();
        assert!(dim.is_strictly_increasing());
        assert_eq!(dim.tick_at(2), Some(4.0));
        assert_eq!(dim.tick_at(4), None);
        assert_eq!(dim.index_of(1.0).unwrap(), 1);
        assert_eq!(dim.index_of(4.0).unwrap(), 2);
        assert!(dim.index_of(9.5).is_err());
        assert_eq!(dim.axis(2, 1).unwrap(), vec![1.5, 4.0]);
        assert!(dim.axis(2, 3).is_err());
    }

    #[test]
    fn test_range_ordering() {
        let dim = RangeDimension::new(vec![1.0, 1.0, 2.0]).unwrap();
        assert!(!dim.is_strictly_increasing());
    }

    #[test]
    fn test_dimension_accessors() {
        let dim = Dimension::sampled(2.0).unwrap();
        assert_eq!(dim.kind(), DimensionKind::Sampled);
        assert!(dim.as_sampled().is_some());
        assert!(dim.as_range().is_none());
        assert_eq!(Dimension::set().kind(), DimensionKind::Set);
        assert_eq!(Dimension::set().unit(), None);
    }

    #[test]
    fn test_dimension_serde_tagging() {
        let dim = Dimension::range(vec![1.0, 2.0]).unwrap();
        let json = serde_json::to_value(&dim).unwrap();
        assert_eq!(json["kind"], "range");
        let back: Dimension = serde_json::from_value(json).unwrap();
        assert_eq!(back, dim);
    }
}
