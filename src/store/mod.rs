//! File store (C6): on-disk bytes plus in-memory metadata catalog.
//!
//! New module — the teacher is a stateless microservice framework with
//! nothing resembling persistent storage. The single-reader/writer-lock
//! discipline over catalog *and* directory together (§9 "Catalog + directory
//! coupling") is grounded in the teacher's habit of bundling all the state a
//! subsystem needs behind one guarded struct (`ConnLimits`/`ServerLimits`).

pub(crate) mod catalog;

use crate::errors::StoreError;
use catalog::{now_stamp, size_tag, type_tag, Catalog, FileEntry};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::warn;

/// Either half of §4.5's "Common URL tail shape": a numeric id or a file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Identifier {
    Id(u64),
    Name(String),
}

/// Guards the catalog and the managed directory behind one lock, per §9's
/// explicit instruction not to expose them independently mutable.
pub(crate) struct FileStore {
    root: PathBuf,
    metadata_path: PathBuf,
    id_key: String,
    data_key: String,
    catalog: RwLock<Catalog>,
}

impl FileStore {
    /// Loads an existing metadata file if present, starting from an empty
    /// catalog otherwise (a missing metadata file is not an error: it means
    /// a fresh deployment, not a corrupt one).
    pub(crate) async fn load(
        root: PathBuf,
        metadata_path: PathBuf,
        id_key: String,
        data_key: String,
    ) -> Result<Self, StoreError> {
        tokio::fs::create_dir_all(&root).await?;

        let catalog = match tokio::fs::read(&metadata_path).await {
            Ok(bytes) => {
                let value: serde_json::Value = serde_json::from_slice(&bytes)
                    .map_err(|_| StoreError::InvalidIdentifier)?;
                Catalog::from_json(&value, &id_key, &data_key).unwrap_or_default()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Catalog::default(),
            Err(e) => return Err(StoreError::Io(e)),
        };

        Ok(Self {
            root,
            metadata_path,
            id_key,
            data_key,
            catalog: RwLock::new(catalog),
        })
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    async fn resolve_name(&self, identifier: &Identifier) -> Result<String, StoreError> {
        match identifier {
            Identifier::Name(n) => Ok(n.clone()),
            Identifier::Id(id) => {
                let catalog = self.catalog.read().await;
                catalog
                    .entries
                    .get(id)
                    .map(|e| e.file_name.clone())
                    .ok_or_else(|| StoreError::NotFound(id.to_string()))
            }
        }
    }

    /// **add(name, bytes) → id** (§4.6). Rolls the file back if the write
    /// fails after creation; a failed rollback is reported as a distinct
    /// error kind rather than silently swallowed.
    pub(crate) async fn add(&self, name: &str, bytes: &[u8]) -> Result<u64, StoreError> {
        let path = self.path_for(name);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StoreError::NameCollision(name.to_string()));
        }

        if let Err(write_err) = tokio::fs::write(&path, bytes).await {
            if let Err(rollback_err) = tokio::fs::remove_file(&path).await {
                warn!(target: "store", "rollback of '{name}' failed after a write error: {rollback_err}; manual cleanup required");
                return Err(StoreError::RollbackFailed(name.to_string()));
            }
            return Err(StoreError::Io(write_err));
        }

        let mut catalog = self.catalog.write().await;
        catalog.current_id += 1;
        let id = catalog.current_id;

        let stamp = now_stamp();
        catalog.entries.insert(
            id,
            FileEntry {
                file_id: id,
                file_name: name.to_string(),
                file_type: type_tag(name),
                file_size: size_tag(bytes.len()),
                time_created: stamp.clone(),
                time_updated: stamp,
            },
        );

        Ok(id)
    }

    /// **get(identifier) → bytes** (§4.6).
    pub(crate) async fn get(&self, identifier: &Identifier) -> Result<Vec<u8>, StoreError> {
        let name = self.resolve_name(identifier).await?;
        let path = self.path_for(&name);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => StoreError::NotFound(name.clone()),
                _ => StoreError::Io(e),
            })?;
        if bytes.is_empty() {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "file exists but reads as empty",
            )));
        }
        Ok(bytes)
    }

    /// **view(identifier) → entry** (§4.6).
    pub(crate) async fn view(&self, identifier: &Identifier) -> Result<FileEntry, StoreError> {
        let catalog = self.catalog.read().await;
        match identifier {
            Identifier::Id(id) => catalog
                .entries
                .get(id)
                .cloned()
                .ok_or_else(|| StoreError::NotFound(id.to_string())),
            Identifier::Name(n) => catalog
                .entries
                .values()
                .find(|e| &e.file_name == n)
                .cloned()
                .ok_or_else(|| StoreError::NotFound(n.clone())),
        }
    }

    /// **list(query) → entries** (§4.6). `all` is a sentinel returning every
    /// entry; otherwise the asymmetric `(name contains query) OR (query
    /// contains id-as-string)` rule from §9's open question is replicated
    /// exactly, not "fixed".
    pub(crate) async fn list(&self, query: &str) -> Vec<FileEntry> {
        let catalog = self.catalog.read().await;
        let mut matches: Vec<FileEntry> = if query == "all" {
            catalog.entries.values().cloned().collect()
        } else {
            catalog
                .entries
                .values()
                .filter(|e| e.file_name.contains(query) || query.contains(&e.file_id.to_string()))
                .cloned()
                .collect()
        };
        matches.sort_by_key(|e| e.file_id);
        matches
    }

    /// **override(identifier, bytes)** (§4.6). Does not rename.
    pub(crate) async fn override_contents(&self, identifier: &Identifier, bytes: &[u8]) -> Result<(), StoreError> {
        let name = self.resolve_name(identifier).await?;
        let path = self.path_for(&name);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StoreError::NotFound(name));
        }
        tokio::fs::write(&path, bytes).await?;

        let mut catalog = self.catalog.write().await;
        if let Some(entry) = catalog.entries.values_mut().find(|e| e.file_name == name) {
            entry.file_size = size_tag(bytes.len());
            entry.time_updated = now_stamp();
        }
        Ok(())
    }

    /// **rename(identifier, new_name)** (§4.6). File-type equality is the
    /// handler's job, not the store's (§4.5 "Rename").
    pub(crate) async fn rename(&self, identifier: &Identifier, new_name: &str) -> Result<(), StoreError> {
        let old_name = self.resolve_name(identifier).await?;
        let new_path = self.path_for(new_name);
        if tokio::fs::try_exists(&new_path).await.unwrap_or(false) {
            return Err(StoreError::NameCollision(new_name.to_string()));
        }

        tokio::fs::rename(self.path_for(&old_name), &new_path).await?;

        let mut catalog = self.catalog.write().await;
        if let Some(entry) = catalog.entries.values_mut().find(|e| e.file_name == old_name) {
            entry.file_name = new_name.to_string();
            entry.time_updated = now_stamp();
        }
        Ok(())
    }

    /// **delete(identifier)** (§4.6). The id counter does not decrease.
    pub(crate) async fn delete(&self, identifier: &Identifier) -> Result<(), StoreError> {
        let name = self.resolve_name(identifier).await?;
        tokio::fs::remove_file(self.path_for(&name))
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => StoreError::NotFound(name.clone()),
                _ => StoreError::Io(e),
            })?;

        let mut catalog = self.catalog.write().await;
        let id = catalog
            .entries
            .iter()
            .find(|(_, e)| e.file_name == name)
            .map(|(id, _)| *id);
        if let Some(id) = id {
            catalog.entries.remove(&id);
        }
        Ok(())
    }

    /// **flush()** (§4.6/§4.8): the only durability point. Writes the
    /// counter and catalog to the metadata file in a single write.
    pub(crate) async fn flush(&self) -> Result<(), StoreError> {
        let catalog = self.catalog.read().await;
        let json = catalog.to_json(&self.id_key, &self.data_key);
        let bytes = serde_json::to_vec_pretty(&json).expect("catalog JSON is always well-formed");
        if let Some(parent) = self.metadata_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.metadata_path, bytes).await?;
        Ok(())
    }

    pub(crate) fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn temp_store() -> (FileStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("files");
        let metadata = dir.path().join("metadata.json");
        let store = FileStore::load(root, metadata, "currentId".into(), "data".into())
            .await
            .unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn add_then_get_round_trips() {
        let (store, _dir) = temp_store().await;
        let id = store.add("a.txt", b"HELLO").await.unwrap();
        assert_eq!(id, 1);
        assert_eq!(store.get(&Identifier::Id(id)).await.unwrap(), b"HELLO");
    }

    #[tokio::test]
    async fn add_rejects_name_collision() {
        let (store, _dir) = temp_store().await;
        store.add("a.txt", b"HELLO").await.unwrap();
        let err = store.add("a.txt", b"WORLD").await.unwrap_err();
        assert!(matches!(err, StoreError::NameCollision(n) if n == "a.txt"));
    }

    #[tokio::test]
    async fn delete_then_add_reuses_monotone_counter() {
        let (store, _dir) = temp_store().await;
        let id = store.add("a.txt", b"HELLO").await.unwrap();
        store.delete(&Identifier::Id(id)).await.unwrap();
        let id2 = store.add("a.txt", b"HELLO").await.unwrap();
        assert_eq!(id2, id + 1);
    }

    #[tokio::test]
    async fn rename_then_get_by_new_name_matches_get_by_id() {
        let (store, _dir) = temp_store().await;
        let id = store.add("a.txt", b"HELLO").await.unwrap();
        store.rename(&Identifier::Id(id), "b.txt").await.unwrap();
        let by_name = store.get(&Identifier::Name("b.txt".to_string())).await.unwrap();
        let by_id = store.get(&Identifier::Id(id)).await.unwrap();
        assert_eq!(by_name, by_id);
    }

    #[tokio::test]
    async fn list_all_sentinel_returns_everything_sorted() {
        let (store, _dir) = temp_store().await;
        store.add("b.txt", b"2").await.unwrap();
        store.add("a.txt", b"1").await.unwrap();
        let all = store.list("all").await;
        assert_eq!(all.iter().map(|e| e.file_id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[tokio::test]
    async fn flush_then_reload_preserves_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("files");
        let metadata = dir.path().join("metadata.json");

        let store = FileStore::load(root.clone(), metadata.clone(), "currentId".into(), "data".into())
            .await
            .unwrap();
        store.add("a.txt", b"HELLO").await.unwrap();
        store.flush().await.unwrap();

        let reloaded = FileStore::load(root, metadata, "currentId".into(), "data".into())
            .await
            .unwrap();
        let entries = reloaded.list("all").await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].file_name, "a.txt");
    }
}
