//! Files
//!
//! A [`File`] is the top-level container: a directory holding a checksummed
//! manifest plus one payload file per data array. Metadata changes are kept
//! in memory and persisted by [`File::flush`] or [`File::close`]; payload
//! writes go straight to the store.
//!
//! Payloads of deleted arrays and blocks are released only after a flush
//! has written a manifest that no longer lists them.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::block::Block;
use crate::errors::{DataError, DataResult};
use crate::manifest::Manifest;
use crate::observability::{log_event_with_fields, Event};
use crate::store::{LocalStore, MemoryStore, PersistentStore};

/// How a file is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileMode {
    /// Existing file; creating, deleting and payload writes are refused
    /// and nothing is persisted on close
    ReadOnly,
    /// Existing file, or a new one if none exists
    ReadWrite,
    /// Discard any existing content and start empty
    Overwrite,
}

impl FileMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileMode::ReadOnly => "read_only",
            FileMode::ReadWrite => "read_write",
            FileMode::Overwrite => "overwrite",
        }
    }

    pub fn is_writable(&self) -> bool {
        !matches!(self, FileMode::ReadOnly)
    }
}

impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub struct File {
    // None for in-memory files
    root: Option<PathBuf>,
    mode: FileMode,
    store: Arc<dyn PersistentStore>,
    blocks: Vec<Block>,
    deleted_blocks: Vec<Block>,
}

impl File {
    /// Open the container directory at `path`.
    ///
    /// # Errors
    ///
    /// - `NotFound` when opening read-only and no manifest exists
    /// - `Store(ChecksumMismatch)` / `Store(Corrupt)` when the manifest
    ///   cannot be trusted
    /// - `Store(BufferNotFound)` when a payload listed in the manifest is
    ///   missing
    pub fn open(path: impl AsRef<Path>, mode: FileMode) -> DataResult<Self> {
        let root = path.as_ref().to_path_buf();
        let writable = mode.is_writable();

        if mode == FileMode::Overwrite {
            Manifest::remove_from_dir(&root)?;
            LocalStore::purge(&root)?;
        }

        let exists = Manifest::exists(&root);
        if mode == FileMode::ReadOnly && !exists {
            return Err(DataError::NotFound(format!(
                "no container at '{}'",
                root.display()
            )));
        }

        let store: Arc<dyn PersistentStore> = if writable {
            Arc::new(LocalStore::open(root.clone())?)
        } else {
            Arc::new(LocalStore::open_existing(root.clone()))
        };

        let blocks = if exists {
            let manifest = Manifest::read_from_dir(&root).map_err(|e| {
                if e.is_integrity_failure() {
                    log_event_with_fields(
                        Event::ManifestCorrupt,
                        &[("path", &root.display().to_string()), ("error", &e.to_string())],
                    );
                }
                e
            })?;
            manifest
                .blocks
                .into_iter()
                .map(|b| Block::restore(store.clone(), b, writable))
                .collect::<DataResult<Vec<_>>>()?
        } else {
            Vec::new()
        };

        log_event_with_fields(
            Event::FileOpened,
            &[
                ("path", &root.display().to_string()),
                ("mode", mode.as_str()),
                ("blocks", &blocks.len().to_string()),
            ],
        );

        Ok(Self {
            root: Some(root),
            mode,
            store,
            blocks,
            deleted_blocks: Vec::new(),
        })
    }

    /// A writable file with no backing directory
    pub fn in_memory() -> Self {
        Self {
            root: None,
            mode: FileMode::ReadWrite,
            store: Arc::new(MemoryStore::new()),
            blocks: Vec::new(),
            deleted_blocks: Vec::new(),
        }
    }

    pub fn mode(&self) -> FileMode {
        self.mode
    }

    /// Where the file lives, for diagnostics
    pub fn location(&self) -> String {
        self.store.location()
    }

    fn position(&self, name_or_id: &str) -> Option<usize> {
        self.blocks
            .iter()
            .position(|b| b.name() == name_or_id || b.id().to_string() == name_or_id)
    }

    /// # Errors
    ///
    /// `AlreadyExists` if a block called `name` exists, `ReadOnly` for
    /// read-only files.
    pub fn create_block(&mut self, name: &str, type_name: &str) -> DataResult<&mut Block> {
        if !self.mode.is_writable() {
            return Err(DataError::ReadOnly);
        }
        if self.blocks.iter().any(|b| b.name() == name) {
            return Err(DataError::AlreadyExists(format!("block '{}'", name)));
        }

        let block = Block::create(self.store.clone(), name, type_name, true)?;
        self.blocks.push(block);
        let last = self.blocks.len() - 1;
        Ok(&mut self.blocks[last])
    }

    pub fn has_block(&self, name_or_id: &str) -> bool {
        self.position(name_or_id).is_some()
    }

    pub fn block(&self, name_or_id: &str) -> Option<&Block> {
        self.position(name_or_id).map(|i| &self.blocks[i])
    }

    pub fn block_mut(&mut self, name_or_id: &str) -> Option<&mut Block> {
        self.position(name_or_id).map(move |i| &mut self.blocks[i])
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Blocks in creation order
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    /// Delete a block with all its arrays and payloads
    pub fn delete_block(&mut self, name_or_id: &str) -> DataResult<()> {
        if !self.mode.is_writable() {
            return Err(DataError::ReadOnly);
        }
        let index = self
            .position(name_or_id)
            .ok_or_else(|| DataError::NotFound(format!("block '{}'", name_or_id)))?;

        let mut block = self.blocks.remove(index);
        block.discard_arrays();
        log_event_with_fields(
            Event::BlockDeleted,
            &[("name", block.name()), ("id", &block.id().to_string())],
        );
        self.deleted_blocks.push(block);
        Ok(())
    }

    /// Persist the manifest, then release the payloads of deleted arrays
    /// and blocks. Read-only files are left untouched; in-memory files
    /// only release payloads.
    pub fn flush(&mut self) -> DataResult<()> {
        if !self.mode.is_writable() {
            return Ok(());
        }

        if let Some(root) = &self.root {
            let manifest = Manifest::new(self.blocks.iter().map(Block::to_record).collect());
            manifest.write_to_dir(root)?;
            log_event_with_fields(
                Event::ManifestWritten,
                &[
                    ("path", &root.display().to_string()),
                    ("blocks", &manifest.blocks.len().to_string()),
                ],
            );
        }

        for block in &mut self.blocks {
            block.release_pending()?;
        }
        while let Some(block) = self.deleted_blocks.last_mut() {
            block.release_pending()?;
            self.deleted_blocks.pop();
        }
        Ok(())
    }

    /// Flush and close
    pub fn close(mut self) -> DataResult<()> {
        self.flush()?;
        log_event_with_fields(Event::FileClosed, &[("location", &self.location())]);
        Ok(())
    }
}

impl fmt::Debug for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("File")
            .field("location", &self.location())
            .field("mode", &self.mode)
            .field("blocks", &self.blocks)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatype::DataType;
    use crate::shape::NdSize;
    use tempfile::TempDir;

    #[test]
    fn test_in_memory_file() {
        let mut file = File::in_memory();
        file.create_block("block_one", "session").unwrap();
        assert!(file.has_block("block_one"));
        assert_eq!(file.location(), "memory");
        file.close().unwrap();
    }

    #[test]
    fn test_read_only_requires_existing() {
        let dir = TempDir::new().unwrap();
        let err = File::open(dir.path().join("nothing"), FileMode::ReadOnly).unwrap_err();
        assert_eq!(err.code(), "NDB_NOT_FOUND");
    }

    #[test]
    fn test_read_only_open_creates_nothing() {
        let dir = TempDir::new().unwrap();
        File::open(dir.path(), FileMode::ReadWrite)
            .unwrap()
            .close()
            .unwrap();
        std::fs::remove_dir(dir.path().join("data")).unwrap();

        let file = File::open(dir.path(), FileMode::ReadOnly).unwrap();
        assert_eq!(file.block_count(), 0);
        file.close().unwrap();
        assert!(!dir.path().join("data").exists());
    }

    #[test]
    fn test_duplicate_block_rejected() {
        let mut file = File::in_memory();
        file.create_block("b", "t").unwrap();
        assert!(matches!(
            file.create_block("b", "t"),
            Err(DataError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_overwrite_discards_content() {
        let dir = TempDir::new().unwrap();
        let mut file = File::open(dir.path(), FileMode::ReadWrite).unwrap();
        file.create_block("b", "t")
            .unwrap()
            .create_data_array("a", "t", DataType::Int8, NdSize::from([2]))
            .unwrap();
        file.close().unwrap();

        let file = File::open(dir.path(), FileMode::Overwrite).unwrap();
        assert_eq!(file.block_count(), 0);
        assert!(!dir.path().join("data").read_dir().unwrap().any(|_| true));
    }

    #[test]
    fn test_deleted_payloads_released_on_flush() {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("data");
        let payloads = || data.read_dir().unwrap().count();

        let mut file = File::open(dir.path(), FileMode::ReadWrite).unwrap();
        let block = file.create_block("b", "t").unwrap();
        for name in ["x", "y"] {
            block
                .create_data_array(name, "t", DataType::Int16, NdSize::from([3]))
                .unwrap();
        }
        file.create_block("c", "t")
            .unwrap()
            .create_data_array("z", "t", DataType::Int16, NdSize::from([3]))
            .unwrap();
        file.flush().unwrap();
        assert_eq!(payloads(), 3);

        file.block_mut("b").unwrap().delete_data_array("x").unwrap();
        file.delete_block("c").unwrap();
        assert_eq!(payloads(), 3);

        file.flush().unwrap();
        assert_eq!(payloads(), 1);
        assert!(file.deleted_blocks.is_empty());
        file.close().unwrap();
    }

    #[test]
    fn test_in_memory_flush_releases_deleted() {
        let mut file = File::in_memory();
        file.create_block("b", "t")
            .unwrap()
            .create_data_array("a", "t", DataType::UInt8, NdSize::from([1]))
            .unwrap();
        file.delete_block("b").unwrap();
        assert_eq!(file.deleted_blocks.len(), 1);

        file.flush().unwrap();
        assert!(file.deleted_blocks.is_empty());
    }

    #[test]
    fn test_mode_serde() {
        let mode: FileMode = serde_json::from_str("\"read_only\"").unwrap();
        assert_eq!(mode, FileMode::ReadOnly);
        assert_eq!(serde_json::to_string(&FileMode::Overwrite).unwrap(), "\"overwrite\"");
    }
}
