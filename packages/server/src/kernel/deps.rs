//! Server dependencies for activities (using traits for testability)
//!
//! This module provides the central dependency container used by every
//! registrant activity, the HTTP handlers and the scheduled jobs.

use anyhow::Result;
use sqlx::PgPool;
use std::sync::Arc;

use crate::config::Config;
use crate::domains::registrants::IdentityEngine;
use crate::kernel::{BaseRegistrantStore, BaseSequenceAllocator, PgRegistrantStore, PgSequenceAllocator};

/// Default page size for batch jobs
pub const DEFAULT_BATCH_SIZE: i64 = 100;

/// Server dependencies accessible to activities
#[derive(Clone)]
pub struct ServerDeps {
    pub store: Arc<dyn BaseRegistrantStore>,
    pub allocator: Arc<dyn BaseSequenceAllocator>,
    /// Shared, immutable member id rules (sector table loaded once at startup)
    pub engine: Arc<IdentityEngine>,
    /// Page size for reconcile / backfill sweeps
    pub batch_size: i64,
}

impl ServerDeps {
    pub fn new(
        store: Arc<dyn BaseRegistrantStore>,
        allocator: Arc<dyn BaseSequenceAllocator>,
        engine: Arc<IdentityEngine>,
        batch_size: i64,
    ) -> Self {
        Self {
            store,
            allocator,
            engine,
            batch_size: batch_size.max(1),
        }
    }

    /// Wire Postgres-backed collaborators from configuration
    pub fn from_config(pool: PgPool, config: &Config) -> Result<Self> {
        let sectors = Arc::new(config.load_sector_table()?);
        let engine = IdentityEngine::new(sectors)
            .with_strict_sectors(config.strict_sectors)
            .with_max_attempts(config.allocation_attempts);

        Ok(Self::new(
            Arc::new(PgRegistrantStore::new(pool.clone())),
            Arc::new(PgSequenceAllocator::new(pool)),
            Arc::new(engine),
            config.reconcile_batch_size,
        ))
    }
}
