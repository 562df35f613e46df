//! Entity timestamps
//!
//! Persisted timestamps carry whole seconds only, so every timestamp held
//! in memory is truncated to the second as well. A value read back from
//! storage then compares equal to the value that was written.
//!
//! Two write paths exist per field:
//! - [`Timestamps::touch`] advances `updated_at` on attribute mutation
//! - `force_*` overwrites either field with any value, including the past

use chrono::{DateTime, SubsecRound, TimeZone, Utc};

use crate::errors::{DataError, DataResult};

/// Current time floored to the second
pub fn now_truncated() -> DateTime<Utc> {
    truncate(Utc::now())
}

/// Drop sub-second precision
pub fn truncate(t: DateTime<Utc>) -> DateTime<Utc> {
    t.trunc_subsecs(0)
}

/// Seconds since the Unix epoch
pub fn to_seconds(t: &DateTime<Utc>) -> i64 {
    t.timestamp()
}

/// Timestamp for seconds since the Unix epoch
pub fn from_seconds(seconds: i64) -> DataResult<DateTime<Utc>> {
    Utc.timestamp_opt(seconds, 0).single().ok_or_else(|| {
        DataError::InvalidArgument(format!("{} seconds is not a representable time", seconds))
    })
}

/// Creation and last-update time of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamps {
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Timestamps {
    /// Both fields set to now
    pub fn on_create() -> Self {
        let now = now_truncated();
        Self {
            created_at: now,
            updated_at: now,
        }
    }

    /// Restore persisted values verbatim (after truncation)
    pub fn restore(created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Self {
        Self {
            created_at: truncate(created_at),
            updated_at: truncate(updated_at),
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Record an attribute mutation. Never touches `created_at`.
    pub fn touch(&mut self) {
        self.updated_at = now_truncated();
    }

    /// Overwrite `created_at` unconditionally.
    pub fn force_created_at(&mut self, t: DateTime<Utc>) {
        self.created_at = truncate(t);
    }

    /// Overwrite `updated_at` unconditionally.
    pub fn force_updated_at(&mut self, t: DateTime<Utc>) {
        self.updated_at = truncate(t);
    }
}
