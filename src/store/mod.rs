//! # Persistent Store
//!
//! Durable byte storage for data array payloads. The data model talks to a
//! store only through [`PersistentStore`]: allocate a typed buffer of a
//! declared shape, then read and write byte ranges of it.

pub mod backend;
pub mod errors;
pub mod local;
pub mod memory;

pub use backend::{checked_byte_len, BufferHandle, PersistentStore};
pub use errors::{StoreError, StoreResult};
pub use local::LocalStore;
pub use memory::MemoryStore;
