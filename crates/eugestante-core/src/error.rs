use thiserror::Error;

#[derive(Debug, Error)]
pub enum EuGestanteError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid time of day: {0:?} (expected HH:MM)")]
    InvalidTime(String),

    #[error("Invalid medication: {0}")]
    InvalidMedication(String),

    #[error("Medication not found: {id}")]
    MedicationNotFound { id: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl EuGestanteError {
    /// Short error code string returned to HTTP clients.
    pub fn code(&self) -> &'static str {
        match self {
            EuGestanteError::Config(_) => "CONFIG_ERROR",
            EuGestanteError::InvalidTime(_) => "INVALID_TIME",
            EuGestanteError::InvalidMedication(_) => "INVALID_MEDICATION",
            EuGestanteError::MedicationNotFound { .. } => "MEDICATION_NOT_FOUND",
            EuGestanteError::Database(_) => "DATABASE_ERROR",
            EuGestanteError::Serialization(_) => "SERIALIZATION_ERROR",
            EuGestanteError::Io(_) => "IO_ERROR",
            EuGestanteError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, EuGestanteError>;
