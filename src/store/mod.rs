//! # In-Memory Secret Store
//!
//! The table of [`SecretRecord`]s shared by the provider and admin servers.
//!
//! A single reader/writer lock guards the whole table: readers (mount
//! snapshots, admin listings) run concurrently, while a writer holds the
//! lock exclusively for the duration of its mutation. Every read therefore
//! observes a state that existed at one instant, and a record's fields are
//! always replaced as a unit.
//!
//! Records are kept in a `BTreeMap` so that every consumer sees them sorted
//! by name. Nothing logs while a guard is held.

mod snapshot;

pub use snapshot::{MountSnapshot, MountedFile, ObjectVersion};

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::errors::StoreError;

/// Default file mode for mounted secrets (0644)
pub const DEFAULT_FILE_MODE: i32 = 0o644;

/// File name of the record seeded at startup
pub const SEED_SECRET_NAME: &str = "debug-secret.txt";

/// Contents of the record seeded at startup
pub const SEED_SECRET_VALUE: &str = "Initial value loaded at startup";

/// Version of the record seeded at startup
pub const SEED_SECRET_VERSION: &str = "v1";

/// One named secret file
#[derive(Clone, PartialEq, Eq)]
pub struct SecretRecord {
    /// Map key and the file path relative to the mount point
    pub name: String,
    /// Raw file contents
    pub value: Vec<u8>,
    /// Opaque version tag; a new tag tells the driver the contents changed
    pub version: String,
    /// POSIX permission bits applied to the mounted file
    pub mode: i32,
}

impl SecretRecord {
    pub fn new(
        name: impl Into<String>,
        value: impl Into<Vec<u8>>,
        version: impl Into<String>,
        mode: i32,
    ) -> Self {
        Self { name: name.into(), value: value.into(), version: version.into(), mode }
    }

    /// Contents decoded for display, replacing invalid UTF-8
    pub fn value_lossy(&self) -> String {
        String::from_utf8_lossy(&self.value).into_owned()
    }
}

// Contents are secret material; keep them out of logs.
impl fmt::Debug for SecretRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretRecord")
            .field("name", &self.name)
            .field("value", &format_args!("<{} bytes>", self.value.len()))
            .field("version", &self.version)
            .field("mode", &format_args!("{:#o}", self.mode))
            .finish()
    }
}

type Table = BTreeMap<String, SecretRecord>;

/// Thread-safe in-memory secret table
///
/// Share it between servers by wrapping it in an `Arc`.
#[derive(Debug, Default)]
pub struct SecretStore {
    records: RwLock<Table>,
}

impl SecretStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the placeholder record used at startup
    pub fn seeded() -> Result<Self, StoreError> {
        let store = Self::new();
        store.set(SEED_SECRET_NAME, SEED_SECRET_VALUE, SEED_SECRET_VERSION, DEFAULT_FILE_MODE)?;
        Ok(store)
    }

    fn read(&self, operation: &'static str) -> Result<RwLockReadGuard<'_, Table>, StoreError> {
        self.records.read().map_err(|_| StoreError::Poisoned { operation })
    }

    fn write(&self, operation: &'static str) -> Result<RwLockWriteGuard<'_, Table>, StoreError> {
        self.records.write().map_err(|_| StoreError::Poisoned { operation })
    }

    /// Insert or overwrite the record for `name`
    ///
    /// The store does not validate its inputs; callers reject empty names
    /// and values before reaching it.
    pub fn set(
        &self,
        name: impl Into<String>,
        value: impl Into<Vec<u8>>,
        version: impl Into<String>,
        mode: i32,
    ) -> Result<(), StoreError> {
        // Build the record before taking the lock so the critical section is a single insert.
        let record = SecretRecord::new(name, value, version, mode);
        let (name, version) = (record.name.clone(), record.version.clone());
        self.write("set")?.insert(name.clone(), record);

        debug!(%name, %version, "Stored secret record");
        Ok(())
    }

    /// Apply a batch of records under one exclusive lock acquisition
    ///
    /// Readers see either none or all of the batch. Later records with a
    /// duplicate name overwrite earlier ones.
    pub fn set_many(&self, batch: Vec<SecretRecord>) -> Result<usize, StoreError> {
        let count = batch.len();
        {
            let mut records = self.write("set_many")?;
            for record in batch {
                records.insert(record.name.clone(), record);
            }
        }
        debug!(count, "Stored secret record batch");
        Ok(count)
    }

    /// Remove the record for `name`; absent names are ignored
    ///
    /// Returns whether a record was removed.
    pub fn delete(&self, name: &str) -> Result<bool, StoreError> {
        let removed = self.write("delete")?.remove(name).is_some();
        debug!(name, removed, "Deleted secret record");
        Ok(removed)
    }

    /// Copy of every record, sorted ascending by name
    pub fn list(&self) -> Result<Vec<SecretRecord>, StoreError> {
        let records = self.read("list")?;
        Ok(records.values().cloned().collect())
    }

    /// Files and object versions for a mount, taken from one read of the table
    pub fn files_and_versions(&self) -> Result<MountSnapshot, StoreError> {
        let records = self.read("files_and_versions")?;
        Ok(MountSnapshot::from_records(records.values()))
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.read("len")?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.read("is_empty")?.is_empty())
    }
}
