use eugestante_core::EuGestanteError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying SQLite / rusqlite error.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("medication not found: {id}")]
    NotFound { id: String },

    /// Name/times failed validation.
    #[error("invalid medication: {0}")]
    Invalid(String),

    #[error("corrupt row {id}: {reason}")]
    Corrupt { id: String, reason: String },

    #[error("store lock poisoned")]
    Poisoned,
}

impl From<EuGestanteError> for StoreError {
    fn from(e: EuGestanteError) -> Self {
        match e {
            EuGestanteError::MedicationNotFound { id } => StoreError::NotFound { id },
            EuGestanteError::InvalidMedication(reason) => StoreError::Invalid(reason),
            other => StoreError::Invalid(other.to_string()),
        }
    }
}

impl From<StoreError> for EuGestanteError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { id } => EuGestanteError::MedicationNotFound { id },
            StoreError::Invalid(reason) => EuGestanteError::InvalidMedication(reason),
            other => EuGestanteError::Database(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
