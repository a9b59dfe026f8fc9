//! Administrator-owned KPI field catalog.
//!
//! The catalog maps logical KPI names to source data fields and declares
//! which functional section of a scheme each KPI may be used in. Scheme
//! rule blocks reference catalog entries by KPI name only; the catalog
//! never owns scheme documents.

use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

/// Functional section a KPI belongs to. The wire labels are the exact
/// strings stored by the scheme administrator configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KpiSection {
    #[serde(rename = "BASE_DATA")]
    BaseData,
    #[serde(rename = "QUAL_CRI")]
    Qualification,
    #[serde(rename = "ADJ_CRI")]
    Adjustment,
    #[serde(rename = "EX_CRI")]
    Exclusion,
    #[serde(rename = "CUSTOM_RULES")]
    CustomRules,
}

impl KpiSection {
    pub const fn label(self) -> &'static str {
        match self {
            KpiSection::BaseData => "BASE_DATA",
            KpiSection::Qualification => "QUAL_CRI",
            KpiSection::Adjustment => "ADJ_CRI",
            KpiSection::Exclusion => "EX_CRI",
            KpiSection::CustomRules => "CUSTOM_RULES",
        }
    }
}

/// Declared data type of a KPI's source field. Drives `==`/`!=`
/// comparison semantics during evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KpiDataType {
    Number,
    Text,
    Date,
}

/// One catalog entry: a logical KPI name bound to a source field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiFieldMapping {
    pub id: String,
    pub kpi_name: String,
    pub description: String,
    pub section: KpiSection,
    pub source_type: String,
    pub source_field: String,
    pub data_type: KpiDataType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<String>,
}

/// Catalog collaborator consumed by scheme authoring and evaluation.
pub trait KpiCatalog: Send + Sync {
    /// Every mapping registered for the given section.
    fn list_fields(&self, section: KpiSection) -> Vec<KpiFieldMapping>;

    /// Resolve a KPI by name across all sections.
    fn find(&self, kpi_name: &str) -> Option<KpiFieldMapping>;
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("KPI '{kpi_name}' is already mapped in section {section}", section = .section.label())]
    DuplicateKpi {
        kpi_name: String,
        section: KpiSection,
    },
}

/// Process-scoped catalog registry. Doubles as the test collaborator.
#[derive(Debug, Default)]
pub struct InMemoryKpiCatalog {
    entries: Mutex<Vec<KpiFieldMapping>>,
}

impl InMemoryKpiCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mappings(
        mappings: impl IntoIterator<Item = KpiFieldMapping>,
    ) -> Result<Self, CatalogError> {
        let catalog = Self::new();
        for mapping in mappings {
            catalog.insert(mapping)?;
        }
        Ok(catalog)
    }

    /// Register a mapping, enforcing KPI-name uniqueness per section.
    pub fn insert(&self, mapping: KpiFieldMapping) -> Result<(), CatalogError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries
            .iter()
            .any(|entry| entry.section == mapping.section && entry.kpi_name == mapping.kpi_name)
        {
            return Err(CatalogError::DuplicateKpi {
                kpi_name: mapping.kpi_name,
                section: mapping.section,
            });
        }
        entries.push(mapping);
        Ok(())
    }

    /// Remove a mapping by id, returning whether anything was deleted.
    pub fn remove(&self, id: &str) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        entries.len() < before
    }
}

impl KpiCatalog for InMemoryKpiCatalog {
    fn list_fields(&self, section: KpiSection) -> Vec<KpiFieldMapping> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .iter()
            .filter(|entry| entry.section == section)
            .cloned()
            .collect()
    }

    fn find(&self, kpi_name: &str) -> Option<KpiFieldMapping> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.iter().find(|entry| entry.kpi_name == kpi_name).cloned()
    }
}
