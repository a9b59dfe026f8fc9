use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::catalog::KpiCatalog;
use crate::scheme::{
    validate_scheme, IncentiveScheme, PlanMetadata, SchemeDocId, SchemeStatus,
    SchemeValidationError,
};

use super::repository::{Durability, RepositoryError, SchemeRepository};

// Doc ids derive from the scheme id and version so they stay stable
// across processes sharing one durable store. Uniqueness follows from
// the repository's (scheme_id, version) constraint.
fn doc_id_for(scheme_id: &str, version: u32) -> SchemeDocId {
    SchemeDocId(format!("{scheme_id}-v{version}"))
}

/// Error raised by the scheme versioning service.
#[derive(Debug, thiserror::Error)]
pub enum SchemeServiceError {
    #[error(transparent)]
    Validation(#[from] SchemeValidationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("scheme store is transient; a new version would lose its history")]
    UpstreamUnavailable,
    #[error("invalid status transition from {from} to {to}")]
    InvalidStatusTransition {
        from: SchemeStatus,
        to: SchemeStatus,
    },
}

/// Service composing validation, the versioning protocol, and the
/// persistence collaborator.
pub struct SchemeService<R> {
    repository: Arc<R>,
    catalog: Option<Arc<dyn KpiCatalog>>,
}

impl<R> SchemeService<R>
where
    R: SchemeRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            catalog: None,
        }
    }

    /// Attach a KPI catalog; rule fields are then validated against it
    /// on every write.
    pub fn with_catalog(repository: Arc<R>, catalog: Arc<dyn KpiCatalog>) -> Self {
        Self {
            repository,
            catalog: Some(catalog),
        }
    }

    fn validate(&self, scheme: &IncentiveScheme) -> Result<(), SchemeServiceError> {
        validate_scheme(scheme, self.catalog.as_deref())?;
        Ok(())
    }

    /// Store a brand-new scheme as version 1. The authored status is
    /// honored; provenance timestamps are stamped fresh.
    pub fn create(&self, mut scheme: IncentiveScheme) -> Result<IncentiveScheme, SchemeServiceError> {
        self.validate(&scheme)?;
        let now = Utc::now();
        scheme.doc_id = doc_id_for(&scheme.scheme_id, 1);
        scheme.metadata = PlanMetadata {
            created_at: now,
            updated_at: now,
            version: 1,
            status: scheme.metadata.status,
        };
        let stored = self.repository.insert(scheme)?;
        info!(scheme_id = %stored.scheme_id, doc_id = %stored.doc_id, "created scheme");
        Ok(stored)
    }

    /// Append the edited document as the next version of `scheme_id`.
    ///
    /// `created_at` is inherited from the current latest version,
    /// `updated_at` is stamped fresh, and prior documents are never
    /// touched. A concurrent append racing on the same version number
    /// surfaces as a repository `Conflict`; one re-read retry absorbs
    /// the benign case.
    pub fn create_version(
        &self,
        scheme_id: &str,
        edited: IncentiveScheme,
    ) -> Result<IncentiveScheme, SchemeServiceError> {
        if self.repository.durability() == Durability::Transient {
            return Err(SchemeServiceError::UpstreamUnavailable);
        }
        self.validate(&edited)?;

        let mut attempts = 0;
        loop {
            let versions = self.repository.find_versions(scheme_id)?;
            let latest = versions.first().ok_or(RepositoryError::NotFound)?;
            let version = latest.metadata.version + 1;

            let mut next = edited.clone();
            next.doc_id = doc_id_for(scheme_id, version);
            next.scheme_id = scheme_id.to_string();
            next.metadata = PlanMetadata {
                created_at: latest.metadata.created_at,
                updated_at: Utc::now(),
                version,
                status: edited.metadata.status,
            };

            match self.repository.insert(next) {
                Ok(stored) => {
                    info!(
                        scheme_id,
                        version = stored.metadata.version,
                        "created scheme version"
                    );
                    return Ok(stored);
                }
                Err(RepositoryError::Conflict) if attempts == 0 => {
                    attempts += 1;
                    debug!(scheme_id, "version conflict, re-reading current max");
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Promote one document along the status ladder. The version number
    /// never changes on a status write.
    pub fn set_status(
        &self,
        doc_id: &SchemeDocId,
        status: SchemeStatus,
    ) -> Result<IncentiveScheme, SchemeServiceError> {
        let current = self.repository.find_by_id(doc_id)?;
        if !current.metadata.status.can_transition_to(status) {
            return Err(SchemeServiceError::InvalidStatusTransition {
                from: current.metadata.status,
                to: status,
            });
        }
        let updated = self
            .repository
            .update_status(doc_id, status, Utc::now())?;
        info!(doc_id = %doc_id, status = %status, "updated scheme status");
        Ok(updated)
    }

    pub fn get(&self, doc_id: &SchemeDocId) -> Result<IncentiveScheme, SchemeServiceError> {
        Ok(self.repository.find_by_id(doc_id)?)
    }

    pub fn list_latest(&self) -> Result<Vec<IncentiveScheme>, SchemeServiceError> {
        Ok(self.repository.find_latest_versions()?)
    }

    pub fn list_versions(
        &self,
        scheme_id: &str,
    ) -> Result<Vec<IncentiveScheme>, SchemeServiceError> {
        Ok(self.repository.find_versions(scheme_id)?)
    }

    /// Delete one version document. Missing documents surface as
    /// `NotFound`, never as silent success.
    pub fn delete(&self, doc_id: &SchemeDocId) -> Result<(), SchemeServiceError> {
        if self.repository.delete(doc_id)? {
            info!(doc_id = %doc_id, "deleted scheme version");
            Ok(())
        } else {
            Err(RepositoryError::NotFound.into())
        }
    }
}
