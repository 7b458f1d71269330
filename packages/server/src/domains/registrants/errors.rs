use thiserror::Error;

use super::models::RegistrantStatus;
use crate::common::RegistrantId;

/// Errors raised by the registrant identity and status workflow
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Strict mode only; default mode falls back to the generic prefix.
    #[error("Unknown sector: {0:?}")]
    InvalidSector(Option<String>),

    #[error("Member id allocation conflict for prefix {prefix}")]
    ConcurrentAllocationConflict { prefix: String },

    #[error("Could not allocate a member id for prefix {prefix} after {attempts} attempts")]
    IdentifierAllocationFailed { prefix: String, attempts: u32 },

    #[error("Registrant {0} has no status")]
    MissingStatus(RegistrantId),

    #[error("Cannot move registrant from {} to {to}", display_status(.from))]
    InvalidTransition {
        from: Option<RegistrantStatus>,
        to: RegistrantStatus,
    },

    /// The row no longer holds the status and member id the write was based on
    #[error("Registrant {0} changed while it was being updated")]
    StaleRecord(RegistrantId),

    #[error("Registrant not found: {0}")]
    NotFound(RegistrantId),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] anyhow::Error),
}

impl RegistryError {
    /// Allocation conflicts are the only errors worth retrying.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::ConcurrentAllocationConflict { .. })
    }
}

impl From<sqlx::Error> for RegistryError {
    fn from(err: sqlx::Error) -> Self {
        Self::Persistence(err.into())
    }
}

fn display_status(status: &Option<RegistrantStatus>) -> String {
    status
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "(none)".to_string())
}
