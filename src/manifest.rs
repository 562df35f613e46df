//! Container manifest
//!
//! The manifest is the authoritative description of a file's blocks and
//! arrays. Payloads live in the store; everything else lives here.
//!
//! On disk:
//! - `manifest.json`: pretty-printed [`Manifest`]
//! - `manifest.crc32`: `crc32:XXXXXXXX` over the exact bytes of `manifest.json`
//!
//! Timestamps are stored as whole seconds since the Unix epoch.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::datatype::DataType;
use crate::dimension::DimensionCatalog;
use crate::shape::NdSize;
use crate::store::{StoreError, StoreResult};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const CHECKSUM_FILE: &str = "manifest.crc32";
pub const FORMAT_VERSION: u8 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub format_version: u8,
    pub blocks: Vec<BlockRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub id: Uuid,
    pub name: String,
    pub type_name: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub arrays: Vec<ArrayRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayRecord {
    pub id: Uuid,
    pub name: String,
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default)]
    pub polynom_coefficients: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expansion_origin: Option<f64>,
    pub data_type: DataType,
    pub shape: NdSize,
    pub dimensions: DimensionCatalog,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Manifest {
    pub fn new(blocks: Vec<BlockRecord>) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            blocks,
        }
    }

    pub fn to_json(&self) -> StoreResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| StoreError::Internal(format!("Failed to serialize manifest: {}", e)))
    }

    pub fn from_json(json: &str) -> StoreResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| StoreError::Corrupt(format!("Failed to parse manifest: {}", e)))
    }

    /// Whether a manifest exists under `dir`
    pub fn exists(dir: &Path) -> bool {
        dir.join(MANIFEST_FILE).is_file()
    }

    /// Write manifest and checksum sidecar, fsyncing both.
    pub fn write_to_dir(&self, dir: &Path) -> StoreResult<()> {
        let json = self.to_json()?;
        let checksum = format_checksum(compute_checksum(json.as_bytes()));

        write_synced(&dir.join(MANIFEST_FILE), json.as_bytes())?;
        write_synced(&dir.join(CHECKSUM_FILE), checksum.as_bytes())?;
        Ok(())
    }

    /// Read and verify the manifest under `dir`.
    ///
    /// # Errors
    ///
    /// - `ChecksumMismatch` if the manifest bytes do not match the sidecar
    /// - `Corrupt` if the sidecar or manifest cannot be parsed, or the
    ///   format version is unknown
    pub fn read_from_dir(dir: &Path) -> StoreResult<Self> {
        let content = fs::read(dir.join(MANIFEST_FILE))?;
        let sidecar = fs::read_to_string(dir.join(CHECKSUM_FILE))?;

        let expected = parse_checksum(sidecar.trim())
            .ok_or_else(|| StoreError::Corrupt(format!("Bad checksum sidecar: {}", sidecar.trim())))?;
        if !verify_checksum(&content, expected) {
            return Err(StoreError::ChecksumMismatch);
        }

        let json = String::from_utf8(content)
            .map_err(|_| StoreError::Corrupt("Manifest is not UTF-8".into()))?;
        let manifest = Self::from_json(&json)?;
        if manifest.format_version != FORMAT_VERSION {
            return Err(StoreError::Corrupt(format!(
                "Unsupported manifest format version {}",
                manifest.format_version
            )));
        }
        Ok(manifest)
    }

    /// Remove manifest files under `dir` if present
    pub fn remove_from_dir(dir: &Path) -> StoreResult<()> {
        for name in [MANIFEST_FILE, CHECKSUM_FILE] {
            let path = dir.join(name);
            if path.exists() {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    Ok(())
}

pub fn compute_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

pub fn verify_checksum(data: &[u8], expected: u32) -> bool {
    compute_checksum(data) == expected
}

/// Format: `crc32:XXXXXXXX` (lowercase hex, zero-padded)
pub fn format_checksum(checksum: u32) -> String {
    format!("crc32:{:08x}", checksum)
}

pub fn parse_checksum(formatted: &str) -> Option<u32> {
    let hex = formatted.strip_prefix("crc32:")?;
    if hex.len() != 8 {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}
