use crate::config::ConfigError;
use crate::dataset::DatasetError;
use crate::scheme::SchemeValidationError;
use crate::telemetry::TelemetryError;
use crate::versioning::SchemeServiceError;

/// Top-level error for the CLI binary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed scheme document: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("dataset error: {0}")]
    Dataset(#[from] DatasetError),
    #[error("validation error: {0}")]
    Validation(#[from] SchemeValidationError),
    #[error("scheme service error: {0}")]
    Service(#[from] SchemeServiceError),
}
