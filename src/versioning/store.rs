//! The two scheme store implementations: a durable JSON-file document
//! store and the transient in-process fallback.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::scheme::{IncentiveScheme, SchemeDocId, SchemeStatus};

use super::repository::{
    insert_checked, latest_versions, versions_of, Durability, RepositoryError, SchemeRepository,
};

/// Process-scoped fallback store. Documents are lost when the process
/// exits, which is why the service refuses `create_version` against it.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: Mutex<Vec<IncentiveScheme>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SchemeRepository for MemoryStore {
    fn find_latest_versions(&self) -> Result<Vec<IncentiveScheme>, RepositoryError> {
        let docs = self.docs.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(latest_versions(&docs))
    }

    fn find_versions(&self, scheme_id: &str) -> Result<Vec<IncentiveScheme>, RepositoryError> {
        let docs = self.docs.lock().unwrap_or_else(PoisonError::into_inner);
        let versions = versions_of(&docs, scheme_id);
        if versions.is_empty() {
            return Err(RepositoryError::NotFound);
        }
        Ok(versions)
    }

    fn find_by_id(&self, doc_id: &SchemeDocId) -> Result<IncentiveScheme, RepositoryError> {
        let docs = self.docs.lock().unwrap_or_else(PoisonError::into_inner);
        docs.iter()
            .find(|doc| &doc.doc_id == doc_id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    fn insert(&self, scheme: IncentiveScheme) -> Result<IncentiveScheme, RepositoryError> {
        let mut docs = self.docs.lock().unwrap_or_else(PoisonError::into_inner);
        insert_checked(&mut docs, scheme)
    }

    fn update_status(
        &self,
        doc_id: &SchemeDocId,
        status: SchemeStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<IncentiveScheme, RepositoryError> {
        let mut docs = self.docs.lock().unwrap_or_else(PoisonError::into_inner);
        let doc = docs
            .iter_mut()
            .find(|doc| &doc.doc_id == doc_id)
            .ok_or(RepositoryError::NotFound)?;
        doc.metadata.status = status;
        doc.metadata.updated_at = updated_at;
        Ok(doc.clone())
    }

    fn delete(&self, doc_id: &SchemeDocId) -> Result<bool, RepositoryError> {
        let mut docs = self.docs.lock().unwrap_or_else(PoisonError::into_inner);
        let before = docs.len();
        docs.retain(|doc| &doc.doc_id != doc_id);
        Ok(docs.len() < before)
    }

    fn durability(&self) -> Durability {
        Durability::Transient
    }
}

/// Durable document store persisting the full collection as one JSON
/// file, rewritten atomically on every mutation.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    docs: Mutex<Vec<IncentiveScheme>>,
}

impl JsonFileStore {
    /// Open the store, loading any existing document file. A missing
    /// file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let path = path.into();
        let docs = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|err| RepositoryError::Unavailable(format!("corrupt store file: {err}")))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(err) => return Err(RepositoryError::Unavailable(err.to_string())),
        };
        debug!(path = %path.display(), "opened scheme store");
        Ok(Self {
            path,
            docs: Mutex::new(docs),
        })
    }

    fn persist(&self, docs: &[IncentiveScheme]) -> Result<(), RepositoryError> {
        let bytes = serde_json::to_vec_pretty(docs)
            .map_err(|err| RepositoryError::Unavailable(err.to_string()))?;
        let tmp = tmp_path(&self.path);
        fs::write(&tmp, bytes).map_err(|err| RepositoryError::Unavailable(err.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|err| RepositoryError::Unavailable(err.to_string()))
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

impl SchemeRepository for JsonFileStore {
    fn find_latest_versions(&self) -> Result<Vec<IncentiveScheme>, RepositoryError> {
        let docs = self.docs.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(latest_versions(&docs))
    }

    fn find_versions(&self, scheme_id: &str) -> Result<Vec<IncentiveScheme>, RepositoryError> {
        let docs = self.docs.lock().unwrap_or_else(PoisonError::into_inner);
        let versions = versions_of(&docs, scheme_id);
        if versions.is_empty() {
            return Err(RepositoryError::NotFound);
        }
        Ok(versions)
    }

    fn find_by_id(&self, doc_id: &SchemeDocId) -> Result<IncentiveScheme, RepositoryError> {
        let docs = self.docs.lock().unwrap_or_else(PoisonError::into_inner);
        docs.iter()
            .find(|doc| &doc.doc_id == doc_id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    // Mutations roll back the in-memory collection when the file write
    // fails, so reads never report state that is not on disk.
    fn insert(&self, scheme: IncentiveScheme) -> Result<IncentiveScheme, RepositoryError> {
        let mut docs = self.docs.lock().unwrap_or_else(PoisonError::into_inner);
        let stored = insert_checked(&mut docs, scheme)?;
        if let Err(err) = self.persist(&docs) {
            docs.pop();
            return Err(err);
        }
        Ok(stored)
    }

    fn update_status(
        &self,
        doc_id: &SchemeDocId,
        status: SchemeStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<IncentiveScheme, RepositoryError> {
        let mut docs = self.docs.lock().unwrap_or_else(PoisonError::into_inner);
        let index = docs
            .iter()
            .position(|doc| &doc.doc_id == doc_id)
            .ok_or(RepositoryError::NotFound)?;
        let previous = (docs[index].metadata.status, docs[index].metadata.updated_at);
        docs[index].metadata.status = status;
        docs[index].metadata.updated_at = updated_at;
        if let Err(err) = self.persist(&docs) {
            docs[index].metadata.status = previous.0;
            docs[index].metadata.updated_at = previous.1;
            return Err(err);
        }
        Ok(docs[index].clone())
    }

    fn delete(&self, doc_id: &SchemeDocId) -> Result<bool, RepositoryError> {
        let mut docs = self.docs.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(index) = docs.iter().position(|doc| &doc.doc_id == doc_id) else {
            return Ok(false);
        };
        let removed = docs.remove(index);
        if let Err(err) = self.persist(&docs) {
            docs.insert(index, removed);
            return Err(err);
        }
        Ok(true)
    }

    fn durability(&self) -> Durability {
        Durability::Durable
    }
}
