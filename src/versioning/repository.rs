use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::scheme::{IncentiveScheme, SchemeDocId, SchemeStatus};

/// Whether a repository's documents survive the process. The versioning
/// service refuses to append versions to a transient store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Durability {
    Durable,
    Transient,
}

/// Error enumeration for scheme store failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("scheme document not found")]
    NotFound,
    #[error("a document with this scheme id and version already exists")]
    Conflict,
    #[error("scheme store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence collaborator for scheme documents. Storage is append-only
/// per version: stored documents are never rewritten except for the
/// status/updated-at stamp, and deletion removes exactly one version.
pub trait SchemeRepository: Send + Sync {
    /// One document per distinct scheme id (its highest version), sorted
    /// by `updated_at` descending.
    fn find_latest_versions(&self) -> Result<Vec<IncentiveScheme>, RepositoryError>;

    /// Every version for a scheme id, sorted by `version` descending.
    /// `NotFound` when none exist.
    fn find_versions(&self, scheme_id: &str) -> Result<Vec<IncentiveScheme>, RepositoryError>;

    fn find_by_id(&self, doc_id: &SchemeDocId) -> Result<IncentiveScheme, RepositoryError>;

    /// Insert a new version document. `(scheme_id, version)` and `doc_id`
    /// are unique; duplicates are a `Conflict`.
    fn insert(&self, scheme: IncentiveScheme) -> Result<IncentiveScheme, RepositoryError>;

    /// Stamp a new status and `updated_at` on one document, leaving its
    /// version untouched.
    fn update_status(
        &self,
        doc_id: &SchemeDocId,
        status: SchemeStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<IncentiveScheme, RepositoryError>;

    /// Remove one version document; sibling versions are unaffected.
    /// Returns whether anything was deleted.
    fn delete(&self, doc_id: &SchemeDocId) -> Result<bool, RepositoryError>;

    fn durability(&self) -> Durability;
}

pub(super) fn latest_versions(docs: &[IncentiveScheme]) -> Vec<IncentiveScheme> {
    let mut latest: BTreeMap<&str, &IncentiveScheme> = BTreeMap::new();
    for doc in docs {
        match latest.get(doc.scheme_id.as_str()) {
            Some(existing) if existing.metadata.version >= doc.metadata.version => {}
            _ => {
                latest.insert(doc.scheme_id.as_str(), doc);
            }
        }
    }
    let mut result: Vec<IncentiveScheme> = latest.into_values().cloned().collect();
    result.sort_by(|a, b| b.metadata.updated_at.cmp(&a.metadata.updated_at));
    result
}

pub(super) fn versions_of(docs: &[IncentiveScheme], scheme_id: &str) -> Vec<IncentiveScheme> {
    let mut versions: Vec<IncentiveScheme> = docs
        .iter()
        .filter(|doc| doc.scheme_id == scheme_id)
        .cloned()
        .collect();
    versions.sort_by(|a, b| b.metadata.version.cmp(&a.metadata.version));
    versions
}

pub(super) fn insert_checked(
    docs: &mut Vec<IncentiveScheme>,
    scheme: IncentiveScheme,
) -> Result<IncentiveScheme, RepositoryError> {
    let duplicate = docs.iter().any(|doc| {
        doc.doc_id == scheme.doc_id
            || (doc.scheme_id == scheme.scheme_id
                && doc.metadata.version == scheme.metadata.version)
    });
    if duplicate {
        return Err(RepositoryError::Conflict);
    }
    docs.push(scheme.clone());
    Ok(scheme)
}
