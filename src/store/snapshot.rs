//! Mount snapshot builder
//!
//! Every mount receives the whole store. Request attributes never narrow the
//! selection.

use super::SecretRecord;

/// A file the driver writes into the mounted volume
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountedFile {
    pub path: String,
    pub mode: i32,
    pub contents: Vec<u8>,
}

/// Version tag reported for one mounted object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectVersion {
    pub id: String,
    pub version: String,
}

/// Files and versions derived from a single read of the store
///
/// `files[i]` and `object_versions[i]` always describe the same record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountSnapshot {
    pub files: Vec<MountedFile>,
    pub object_versions: Vec<ObjectVersion>,
}

impl MountSnapshot {
    pub(super) fn from_records<'a>(records: impl IntoIterator<Item = &'a SecretRecord>) -> Self {
        let records = records.into_iter();
        let (lower, _) = records.size_hint();
        let mut snapshot = Self {
            files: Vec::with_capacity(lower),
            object_versions: Vec::with_capacity(lower),
        };

        for record in records {
            snapshot.files.push(MountedFile {
                path: record.name.clone(),
                mode: record.mode,
                contents: record.value.clone(),
            });
            snapshot
                .object_versions
                .push(ObjectVersion { id: record.name.clone(), version: record.version.clone() });
        }

        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{SecretStore, DEFAULT_FILE_MODE};

    #[test]
    fn test_empty_store_yields_empty_snapshot() {
        let snapshot = SecretStore::new().files_and_versions().unwrap();
        assert!(snapshot.files.is_empty());
        assert!(snapshot.object_versions.is_empty());
    }

    #[test]
    fn test_files_and_versions_are_aligned() {
        let store = SecretStore::new();
        store.set("b.txt", "bee", "v2", 0o600).unwrap();
        store.set("a.txt", "ay", "v1", DEFAULT_FILE_MODE).unwrap();
        store.set("c.txt", "see", "", DEFAULT_FILE_MODE).unwrap();

        let snapshot = store.files_and_versions().unwrap();
        assert_eq!(snapshot.files.len(), snapshot.object_versions.len());
        for (file, version) in snapshot.files.iter().zip(&snapshot.object_versions) {
            assert_eq!(file.path, version.id);
        }

        assert_eq!(
            snapshot.files[1],
            MountedFile { path: "b.txt".into(), mode: 0o600, contents: b"bee".to_vec() }
        );
        assert_eq!(
            snapshot.object_versions[0],
            ObjectVersion { id: "a.txt".into(), version: "v1".into() }
        );
    }

    #[test]
    fn test_snapshot_order_matches_list() {
        let store = SecretStore::new();
        for name in ["gamma", "alpha", "beta"] {
            store.set(name, name, "v1", DEFAULT_FILE_MODE).unwrap();
        }

        let listed: Vec<String> = store.list().unwrap().into_iter().map(|r| r.name).collect();
        let mounted: Vec<String> =
            store.files_and_versions().unwrap().files.into_iter().map(|f| f.path).collect();
        assert_eq!(listed, mounted);
    }

    #[test]
    fn test_snapshot_is_detached_from_store() {
        let store = SecretStore::new();
        store.set("a", "1", "v1", DEFAULT_FILE_MODE).unwrap();
        let snapshot = store.files_and_versions().unwrap();

        store.set("a", "2", "v2", DEFAULT_FILE_MODE).unwrap();
        store.delete("a").unwrap();

        assert_eq!(snapshot.files[0].contents, b"1");
        assert_eq!(snapshot.object_versions[0].version, "v1");
    }
}
