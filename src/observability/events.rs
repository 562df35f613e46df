//! Observable events
//!
//! Events are explicit and typed; each maps to a stable upper-case name.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    ConfigLoaded,

    // File lifecycle
    FileOpened,
    FileClosed,
    ManifestWritten,
    /// Manifest failed its checksum (FATAL)
    ManifestCorrupt,

    // Entities
    BlockCreated,
    BlockDeleted,
    ArrayCreated,
    ArrayDeleted,

    // Dimension catalog
    DimensionInserted,
    DimensionReplaced,
    DimensionDeleted,

    // Attribute rejections
    UnitRejected,

    // Payload
    RegionWritten,
    RegionRead,

    // Validation
    ValidationComplete,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::FileOpened => "FILE_OPENED",
            Event::FileClosed => "FILE_CLOSED",
            Event::ManifestWritten => "MANIFEST_WRITTEN",
            Event::ManifestCorrupt => "MANIFEST_CORRUPT",

            Event::BlockCreated => "BLOCK_CREATED",
            Event::BlockDeleted => "BLOCK_DELETED",
            Event::ArrayCreated => "ARRAY_CREATED",
            Event::ArrayDeleted => "ARRAY_DELETED",

            Event::DimensionInserted => "DIMENSION_INSERTED",
            Event::DimensionReplaced => "DIMENSION_REPLACED",
            Event::DimensionDeleted => "DIMENSION_DELETED",

            Event::UnitRejected => "UNIT_REJECTED",

            Event::RegionWritten => "REGION_WRITTEN",
            Event::RegionRead => "REGION_READ",

            Event::ValidationComplete => "VALIDATION_COMPLETE",
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::ManifestCorrupt)
    }

    /// High-volume payload events are logged at TRACE
    pub fn is_chatty(&self) -> bool {
        matches!(self, Event::RegionWritten | Event::RegionRead)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_events_have_string_representation() {
        let events = [
            Event::ConfigLoaded,
            Event::FileOpened,
            Event::FileClosed,
            Event::ManifestWritten,
            Event::ManifestCorrupt,
            Event::BlockCreated,
            Event::BlockDeleted,
            Event::ArrayCreated,
            Event::ArrayDeleted,
            Event::DimensionInserted,
            Event::DimensionReplaced,
            Event::DimensionDeleted,
            Event::UnitRejected,
            Event::RegionWritten,
            Event::RegionRead,
            Event::ValidationComplete,
        ];

        for event in events {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_fatal_events() {
        assert!(Event::ManifestCorrupt.is_fatal());
        assert!(!Event::FileOpened.is_fatal());
        assert!(!Event::UnitRejected.is_fatal());
    }

    #[test]
    fn test_event_display() {
        assert_eq!(format!("{}", Event::ArrayCreated), "ARRAY_CREATED");
    }
}
