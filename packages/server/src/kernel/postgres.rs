//! Postgres implementations of the storage traits.
//!
//! SQL lives on the models; these adapters map sqlx failures onto
//! `RegistryError` so the retry logic can tell contention from real errors.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use crate::common::RegistrantId;
use crate::domains::registrants::models::{MemberIdSequence, Registrant, RegistrantFilter};
use crate::domains::registrants::RegistryError;
use crate::kernel::{BaseRegistrantStore, BaseSequenceAllocator};

/// SQLSTATE codes that mean "try again": serialization_failure, deadlock_detected
const RETRYABLE_SQLSTATES: [&str; 2] = ["40001", "40P01"];

fn is_retryable(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db
            .code()
            .map(|code| RETRYABLE_SQLSTATES.iter().any(|c| *c == code))
            .unwrap_or(false),
        _ => false,
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn member_id_conflict(registrant: &Registrant) -> RegistryError {
    RegistryError::ConcurrentAllocationConflict {
        prefix: registrant
            .member_id
            .as_ref()
            .map(|id| id.prefix().to_string())
            .unwrap_or_default(),
    }
}

// =============================================================================
// PgRegistrantStore
// =============================================================================

#[derive(Clone)]
pub struct PgRegistrantStore {
    pool: PgPool,
}

impl PgRegistrantStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseRegistrantStore for PgRegistrantStore {
    async fn create(&self, registrant: &Registrant) -> Result<Registrant, RegistryError> {
        match registrant.insert(&self.pool).await {
            Ok(created) => Ok(created),
            Err(e) if is_unique_violation(&e) || is_retryable(&e) => {
                debug!(registrant_id = %registrant.id, error = %e, "Member id insert conflict");
                Err(member_id_conflict(registrant))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_id(&self, id: RegistrantId) -> Result<Option<Registrant>, RegistryError> {
        Ok(Registrant::find_by_id(id, &self.pool).await?)
    }

    async fn find(&self, filter: &RegistrantFilter) -> Result<Vec<Registrant>, RegistryError> {
        Ok(Registrant::find(filter, &self.pool).await?)
    }

    async fn count(&self, filter: &RegistrantFilter) -> Result<i64, RegistryError> {
        Ok(Registrant::count(filter, &self.pool).await?)
    }

    async fn save_identity(
        &self,
        expected: &Registrant,
        registrant: &Registrant,
    ) -> Result<Registrant, RegistryError> {
        match registrant.update_identity(expected, &self.pool).await {
            Ok(Some(saved)) => Ok(saved),
            // Zero rows: either the row is gone or it moved on since `expected` was read
            Ok(None) => match Registrant::find_by_id(registrant.id, &self.pool).await? {
                Some(_) => Err(RegistryError::StaleRecord(registrant.id)),
                None => Err(RegistryError::NotFound(registrant.id)),
            },
            Err(e) if is_unique_violation(&e) || is_retryable(&e) => {
                debug!(registrant_id = %registrant.id, error = %e, "Member id save conflict");
                Err(member_id_conflict(registrant))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn ping(&self) -> Result<(), RegistryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

// =============================================================================
// PgSequenceAllocator
// =============================================================================

#[derive(Clone)]
pub struct PgSequenceAllocator {
    pool: PgPool,
}

impl PgSequenceAllocator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseSequenceAllocator for PgSequenceAllocator {
    async fn next_sequence(&self, prefix: &str) -> Result<u32, RegistryError> {
        let value = match MemberIdSequence::next_value(prefix, &self.pool).await {
            Ok(value) => value,
            Err(e) if is_retryable(&e) || is_unique_violation(&e) => {
                return Err(RegistryError::ConcurrentAllocationConflict {
                    prefix: prefix.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        u32::try_from(value).map_err(|_| {
            RegistryError::Persistence(anyhow::anyhow!(
                "Member id sequence for {} out of range: {}",
                prefix,
                value
            ))
        })
    }
}
