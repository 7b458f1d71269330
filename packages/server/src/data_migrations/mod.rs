//! Data migration framework for repairing registrant data in place
//!
//! This module provides the infrastructure for running resumable, batch-oriented
//! data migrations with dry-run support, error budgets, and verification.
//!
//! Data migrations are different from schema migrations (sqlx):
//! - Schema migrations change the database structure
//! - Data migrations transform data within existing structures
//!
//! Migrations work through `ServerDeps` rather than raw SQL so the same member
//! id rules apply here as everywhere else, and so they can run against the
//! in-memory stores in tests.
//!
//! # Usage
//!
//! 1. Implement the `DataMigration` trait for your migration
//! 2. Register it in `all_migrations`
//! 3. Run via `migrate_cli run <name>`

pub mod backfill_member_ids;
pub mod reconcile_empty_status;
mod runner;

pub use runner::{run_migration, MigrationSummary, MIN_ITEMS_FOR_ERROR_BUDGET};

use anyhow::Result;
use async_trait::async_trait;

use crate::common::RegistrantId;
use crate::kernel::ServerDeps;

/// Result of executing a single item migration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationResult {
    /// Item was successfully migrated
    Migrated,
    /// Item was skipped (already migrated or not applicable)
    Skipped,
    /// Dry-run: item would have been migrated
    WouldMigrate,
    /// Dry-run: item would have been skipped
    WouldSkip,
}

/// Result of verification check
#[derive(Debug, PartialEq, Eq)]
pub enum VerifyResult {
    /// All items have been migrated
    Passed,
    /// Some items remain to be migrated
    Incomplete { remaining: i64 },
    /// Verification failed with issues
    Failed { issues: Vec<String> },
}

/// Context passed to migration execution
pub struct MigrationContext {
    pub deps: ServerDeps,
    /// Whether this is a dry-run (no mutations)
    pub dry_run: bool,
}

/// Trait for implementing data migrations
///
/// Each migration must be:
/// - Idempotent: running multiple times produces the same result
/// - Resumable: can continue from where it left off via cursor
/// - Verifiable: can check that migration completed correctly
#[async_trait]
pub trait DataMigration: Send + Sync + 'static {
    /// Unique name for this migration
    fn name(&self) -> &'static str;

    /// Optional description shown in migration list
    fn description(&self) -> &'static str {
        ""
    }

    /// Estimate total items to migrate
    async fn estimate(&self, deps: &ServerDeps) -> Result<i64>;

    /// Find the next batch of items to migrate
    ///
    /// Must return items ordered by id for stable cursoring.
    /// The cursor is the last processed id (exclusive).
    async fn find_work(
        &self,
        cursor: Option<RegistrantId>,
        limit: i64,
        deps: &ServerDeps,
    ) -> Result<Vec<RegistrantId>>;

    /// Execute migration for a single item
    async fn execute_one(&self, id: RegistrantId, ctx: &MigrationContext)
        -> Result<MigrationResult>;

    /// Verify that the migration is complete
    async fn verify(&self, deps: &ServerDeps) -> Result<VerifyResult>;

    /// Maximum acceptable error rate before stopping (default: 1%)
    fn error_budget(&self) -> f64 {
        0.01
    }
}

/// Get all registered migrations
pub fn all_migrations() -> Vec<Box<dyn DataMigration>> {
    vec![
        Box::new(reconcile_empty_status::ReconcileEmptyStatusMigration),
        Box::new(backfill_member_ids::BackfillMemberIdsMigration),
    ]
}

/// Find a migration by name
pub fn find_migration(name: &str) -> Option<Box<dyn DataMigration>> {
    all_migrations().into_iter().find(|m| m.name() == name)
}
