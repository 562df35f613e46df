//! # Local Filesystem Store
//!
//! One payload file per buffer under `<root>/data/`. Byte ranges are read
//! and written in place with positioned I/O; buffers are never resized.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::datatype::DataType;
use crate::shape::NdSize;

use super::backend::{check_range, checked_byte_len, BufferHandle, PersistentStore};
use super::errors::{StoreError, StoreResult};

const DATA_DIR: &str = "data";

/// Local filesystem payload store
#[derive(Debug)]
pub struct LocalStore {
    root: PathBuf,
    // key -> payload size in bytes
    sizes: RwLock<HashMap<String, u64>>,
}

impl LocalStore {
    /// Open (creating if needed) a store rooted at `root`
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(root.join(DATA_DIR))?;
        Ok(Self {
            root,
            sizes: RwLock::new(HashMap::new()),
        })
    }

    /// Open a store at `root` without touching the filesystem. Used for
    /// read-only access, where missing payloads surface on attach.
    pub fn open_existing(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            sizes: RwLock::new(HashMap::new()),
        }
    }

    /// Delete every payload under `root`
    pub fn purge(root: &Path) -> StoreResult<()> {
        let data = root.join(DATA_DIR);
        if data.exists() {
            fs::remove_dir_all(data)?;
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn payload_path(&self, key: &str) -> StoreResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::Internal(format!("unusable buffer key '{}'", key)));
        }
        Ok(self.root.join(DATA_DIR).join(format!("{}.bin", key)))
    }

    fn size_of(&self, key: &str) -> StoreResult<u64> {
        let sizes = self.sizes.read().map_err(|_| poisoned())?;
        sizes
            .get(key)
            .copied()
            .ok_or_else(|| StoreError::BufferNotFound(key.to_string()))
    }
}

fn poisoned() -> StoreError {
    StoreError::Internal("Lock poisoned".to_string())
}

impl PersistentStore for LocalStore {
    fn allocate(&self, key: &str, data_type: DataType, shape: &NdSize) -> StoreResult<BufferHandle> {
        let len = checked_byte_len(data_type, shape)?;
        let handle = BufferHandle::new(key, data_type, shape.clone());
        let path = self.payload_path(key)?;

        let mut sizes = self.sizes.write().map_err(|_| poisoned())?;
        if sizes.contains_key(key) || path.exists() {
            return Err(StoreError::BufferExists(key.to_string()));
        }

        let file = OpenOptions::new().write(true).create_new(true).open(&path)?;
        if let Err(e) = file.set_len(len).and_then(|_| file.sync_all()) {
            let _ = fs::remove_file(&path);
            return Err(e.into());
        }

        sizes.insert(key.to_string(), len);
        Ok(handle)
    }

    fn attach(&self, key: &str, data_type: DataType, shape: &NdSize) -> StoreResult<BufferHandle> {
        let len = checked_byte_len(data_type, shape)?;
        let handle = BufferHandle::new(key, data_type, shape.clone());
        let path = self.payload_path(key)?;

        let meta = fs::metadata(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::BufferNotFound(key.to_string())
            } else {
                StoreError::IoError(e.to_string())
            }
        })?;
        if meta.len() != len {
            return Err(StoreError::Corrupt(format!(
                "payload '{}' holds {} bytes, expected {}",
                key,
                meta.len(),
                len
            )));
        }

        let mut sizes = self.sizes.write().map_err(|_| poisoned())?;
        sizes.insert(key.to_string(), len);
        Ok(handle)
    }

    fn read_bytes(&self, handle: &BufferHandle, byte_offset: u64, len: usize) -> StoreResult<Vec<u8>> {
        let size = self.size_of(&handle.key)?;
        check_range(&handle.key, byte_offset, len, size)?;

        let mut file = OpenOptions::new().read(true).open(self.payload_path(&handle.key)?)?;
        file.seek(SeekFrom::Start(byte_offset))?;
        let mut buf = vec![0u8; len];
        file.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn write_bytes(&self, handle: &BufferHandle, byte_offset: u64, data: &[u8]) -> StoreResult<()> {
        // writers are serialized per store
        let sizes = self.sizes.write().map_err(|_| poisoned())?;
        let size = sizes
            .get(&handle.key)
            .copied()
            .ok_or_else(|| StoreError::BufferNotFound(handle.key.clone()))?;
        check_range(&handle.key, byte_offset, data.len(), size)?;

        let mut file = OpenOptions::new().write(true).open(self.payload_path(&handle.key)?)?;
        file.seek(SeekFrom::Start(byte_offset))?;
        file.write_all(data)?;
        file.flush()?;
        Ok(())
    }

    fn release(&self, handle: &BufferHandle) -> StoreResult<()> {
        let mut sizes = self.sizes.write().map_err(|_| poisoned())?;
        if sizes.remove(&handle.key).is_none() {
            return Err(StoreError::BufferNotFound(handle.key.clone()));
        }
        fs::remove_file(self.payload_path(&handle.key)?)?;
        Ok(())
    }

    fn location(&self) -> String {
        self.root.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::Hyperslab;
    use tempfile::TempDir;

    #[test]
    fn test_allocate_creates_sized_file() {
        let temp = TempDir::new().unwrap();
        let store = LocalStore::open(temp.path()).unwrap();
        let handle = store.allocate("arr1", DataType::Double, &NdSize::from([5, 5])).unwrap();

        let path = temp.path().join("data").join("arr1.bin");
        assert_eq!(fs::metadata(path).unwrap().len(), 200);
        assert_eq!(store.read_bytes(&handle, 0, 8).unwrap(), vec![0u8; 8]);
    }

    #[test]
    fn test_allocate_rejects_unaddressable_shape() {
        let temp = TempDir::new().unwrap();
        let store = LocalStore::open(temp.path()).unwrap();
        assert!(matches!(
            store.allocate("huge", DataType::Int64, &NdSize::from([1 << 40, 1 << 40])),
            Err(StoreError::TooLarge { .. })
        ));
        assert!(!temp.path().join("data").join("huge.bin").exists());
    }

    #[test]
    fn test_open_existing_does_not_create_dirs() {
        let temp = TempDir::new().unwrap();
        let store = LocalStore::open_existing(temp.path());
        assert!(!temp.path().join("data").exists());
        assert!(matches!(
            store.attach("a", DataType::UInt8, &NdSize::from([1])),
            Err(StoreError::BufferNotFound(_))
        ));
    }

    #[test]
    fn test_write_read_bytes() {
        let temp = TempDir::new().unwrap();
        let store = LocalStore::open(temp.path()).unwrap();
        let handle = store.allocate("a", DataType::UInt8, &NdSize::from([8])).unwrap();

        store.write_bytes(&handle, 3, b"abc").unwrap();
        assert_eq!(store.read_bytes(&handle, 2, 5).unwrap(), b"\0abc\0".to_vec());
        assert!(store.write_bytes(&handle, 7, b"xy").is_err());
    }

    #[test]
    fn test_region_survives_reattach() {
        let temp = TempDir::new().unwrap();
        let shape = NdSize::from([2, 3]);
        {
            let store = LocalStore::open(temp.path()).unwrap();
            let handle = store.allocate("a", DataType::UInt8, &shape).unwrap();
            store
                .write_region(&handle, &Hyperslab::whole(&shape), &[1, 2, 3, 4, 5, 6])
                .unwrap();
        }

        let store = LocalStore::open(temp.path()).unwrap();
        let handle = store.attach("a", DataType::UInt8, &shape).unwrap();
        let slab = Hyperslab::resolve(
            &shape,
            Some(&NdSize::from([0, 1])),
            Some(&NdSize::from([2, 2])),
        )
        .unwrap();
        assert_eq!(store.read_region(&handle, &slab).unwrap(), vec![2, 3, 5, 6]);
    }

    #[test]
    fn test_attach_checks_size() {
        let temp = TempDir::new().unwrap();
        let store = LocalStore::open(temp.path()).unwrap();
        store.allocate("a", DataType::UInt8, &NdSize::from([4])).unwrap();
        assert!(matches!(
            store.attach("a", DataType::UInt8, &NdSize::from([5])),
            Err(StoreError::Corrupt(_))
        ));
        assert!(matches!(
            store.attach("b", DataType::UInt8, &NdSize::from([4])),
            Err(StoreError::BufferNotFound(_))
        ));
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let temp = TempDir::new().unwrap();
        let store = LocalStore::open(temp.path()).unwrap();
        assert!(store.allocate("../escape", DataType::UInt8, &NdSize::from([1])).is_err());
    }

    #[test]
    fn test_release_removes_file() {
        let temp = TempDir::new().unwrap();
        let store = LocalStore::open(temp.path()).unwrap();
        let handle = store.allocate("gone", DataType::UInt8, &NdSize::from([1])).unwrap();
        store.release(&handle).unwrap();
        assert!(!temp.path().join("data").join("gone.bin").exists());
    }
}
