//! File Persistence Tests
//!
//! A closed file must reopen with the same blocks, arrays, attributes,
//! dimensions, timestamps and payload. A manifest that fails its checksum
//! must never be loaded.

use std::fs;

use chrono::Duration;
use ndblock::manifest::MANIFEST_FILE;
use ndblock::store::StoreError;
use ndblock::timestamp::now_truncated;
use ndblock::{DataError, DataType, DimensionKind, File, FileMode, NdSize};
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

fn create_temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

/// Populate a fresh file at `dir` and close it
fn write_session(dir: &std::path::Path) {
    let mut file = File::open(dir, FileMode::Overwrite).unwrap();
    let block = file.create_block("session_one", "recording").unwrap();

    let array = block
        .create_data_array("voltage", "trace", DataType::Float, NdSize::from([2, 3]))
        .unwrap();
    array.set_label(Some("membrane potential"));
    array.set_unit(Some("mV")).unwrap();
    array.set_definition(Some("raw amplifier output"));
    array.set_polynom_coefficients(vec![0.5, 2.0]);
    array.set_expansion_origin(Some(1.0));
    array.append_set_dimension();
    array.append_sampled_dimension(0.1).unwrap();
    array
        .dimension_mut(2)
        .and_then(|d| d.as_sampled_mut())
        .unwrap()
        .set_unit(Some("s"))
        .unwrap();
    array
        .write_all(&[1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0])
        .unwrap();

    block
        .create_data_array("events", "marker", DataType::Int64, NdSize::from([4]))
        .unwrap()
        .append_range_dimension(vec![0.1, 0.4, 0.9, 1.6])
        .unwrap();

    file.close().unwrap();
}

// =============================================================================
// Round trip
// =============================================================================

#[test]
fn test_close_reopen_roundtrip() {
    let temp_dir = create_temp_dir();
    write_session(temp_dir.path());

    let file = File::open(temp_dir.path(), FileMode::ReadOnly).unwrap();
    assert_eq!(file.location(), temp_dir.path().display().to_string());

    let block = file.block("session_one").unwrap();
    assert_eq!(block.type_name(), "recording");
    assert_eq!(block.data_array_count(), 2);

    let voltage = block.data_array("voltage").unwrap();
    assert_eq!(voltage.data_type(), DataType::Float);
    assert_eq!(voltage.data_extent(), &NdSize::from([2, 3]));
    assert_eq!(voltage.label(), Some("membrane potential"));
    assert_eq!(voltage.unit(), Some("mV"));
    assert_eq!(voltage.definition(), Some("raw amplifier output"));
    assert_eq!(voltage.polynom_coefficients(), &[0.5, 2.0]);
    assert_eq!(voltage.expansion_origin(), Some(1.0));
    assert_eq!(voltage.dimension_count(), 2);
    assert_eq!(voltage.dimension(2).and_then(|d| d.unit()), Some("s"));
    assert_eq!(
        voltage.read_all::<f32>().unwrap(),
        vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]
    );

    let events = block.data_array("events").unwrap();
    let range = events.dimension(1).unwrap();
    assert_eq!(range.kind(), DimensionKind::Range);
    assert_eq!(
        range.as_range().map(|r| r.ticks().to_vec()),
        Some(vec![0.1, 0.4, 0.9, 1.6])
    );
}

#[test]
fn test_timestamps_survive_reopen() {
    let temp_dir = create_temp_dir();
    let past = now_truncated() - Duration::days(30);

    {
        let mut file = File::open(temp_dir.path(), FileMode::ReadWrite).unwrap();
        let array = file
            .create_block("b", "t")
            .unwrap()
            .create_data_array("a", "t", DataType::UInt8, NdSize::from([1]))
            .unwrap();
        array.force_created_at(past);
        array.force_updated_at(past);
        file.close().unwrap();
    }

    let file = File::open(temp_dir.path(), FileMode::ReadOnly).unwrap();
    let array = file.block("b").unwrap().data_array("a").unwrap();
    assert_eq!(array.created_at(), past);
    assert_eq!(array.updated_at(), past);
}

#[test]
fn test_read_write_reopen_appends() {
    let temp_dir = create_temp_dir();
    write_session(temp_dir.path());

    {
        let mut file = File::open(temp_dir.path(), FileMode::ReadWrite).unwrap();
        let block = file.block_mut("session_one").unwrap();
        block.delete_data_array("events").unwrap();
        block
            .create_data_array("current", "trace", DataType::Double, NdSize::from([3]))
            .unwrap();
        file.close().unwrap();
    }

    let file = File::open(temp_dir.path(), FileMode::ReadOnly).unwrap();
    let block = file.block("session_one").unwrap();
    assert!(block.has_data_array("voltage"));
    assert!(block.has_data_array("current"));
    assert!(!block.has_data_array("events"));
}

#[test]
fn test_read_only_refuses_changes() {
    let temp_dir = create_temp_dir();
    write_session(temp_dir.path());

    let mut file = File::open(temp_dir.path(), FileMode::ReadOnly).unwrap();
    assert_eq!(file.create_block("other", "t").unwrap_err(), DataError::ReadOnly);

    let block = file.block_mut("session_one").unwrap();
    assert_eq!(block.delete_data_array("voltage").unwrap_err(), DataError::ReadOnly);

    let voltage = block.data_array_mut("voltage").unwrap();
    assert_eq!(voltage.write_all(&[0.0f32; 6]).unwrap_err(), DataError::ReadOnly);

    // attribute edits stay in memory and are not persisted
    voltage.set_label(Some("changed"));
    file.close().unwrap();

    let file = File::open(temp_dir.path(), FileMode::ReadOnly).unwrap();
    let voltage = file.block("session_one").unwrap().data_array("voltage").unwrap();
    assert_eq!(voltage.label(), Some("membrane potential"));
}

// =============================================================================
// Integrity
// =============================================================================

#[test]
fn test_tampered_manifest_is_rejected() {
    let temp_dir = create_temp_dir();
    write_session(temp_dir.path());

    let path = temp_dir.path().join(MANIFEST_FILE);
    let tampered = fs::read_to_string(&path)
        .unwrap()
        .replace("membrane potential", "membrane potentiaL");
    fs::write(&path, tampered).unwrap();

    let err = File::open(temp_dir.path(), FileMode::ReadOnly).unwrap_err();
    assert_eq!(err, DataError::Store(StoreError::ChecksumMismatch));
    assert_eq!(err.code(), "NDB_STORE_FAILED");
}

#[test]
fn test_missing_payload_is_reported() {
    let temp_dir = create_temp_dir();
    write_session(temp_dir.path());

    for entry in fs::read_dir(temp_dir.path().join("data")).unwrap() {
        fs::remove_file(entry.unwrap().path()).unwrap();
    }

    let err = File::open(temp_dir.path(), FileMode::ReadOnly).unwrap_err();
    assert!(err.is_store_failure());
}

#[test]
fn test_unflushed_delete_keeps_container_openable() {
    let temp_dir = create_temp_dir();
    write_session(temp_dir.path());

    {
        let mut file = File::open(temp_dir.path(), FileMode::ReadWrite).unwrap();
        file.block_mut("session_one")
            .unwrap()
            .delete_data_array("voltage")
            .unwrap();
        file.delete_block("session_one").unwrap();
        // dropped without flush or close
    }

    let file = File::open(temp_dir.path(), FileMode::ReadOnly).unwrap();
    let block = file.block("session_one").unwrap();
    assert!(block.has_data_array("voltage"));
    assert_eq!(
        block.data_array("voltage").unwrap().read_all::<f32>().unwrap(),
        vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]
    );
    assert!(block.has_data_array("events"));
}

#[test]
fn test_delete_block_removes_payloads() {
    let temp_dir = create_temp_dir();
    write_session(temp_dir.path());

    let mut file = File::open(temp_dir.path(), FileMode::ReadWrite).unwrap();
    file.delete_block("session_one").unwrap();
    assert_eq!(file.block_count(), 0);
    assert!(matches!(
        file.delete_block("session_one"),
        Err(DataError::NotFound(_))
    ));
    file.close().unwrap();

    let remaining = fs::read_dir(temp_dir.path().join("data")).unwrap().count();
    assert_eq!(remaining, 0);
}
