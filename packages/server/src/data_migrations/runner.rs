use anyhow::Result;
use serde::Serialize;
use tracing::{info, warn};

use super::{DataMigration, MigrationContext, MigrationResult};
use crate::common::RegistrantId;

/// Error rates are not judged until this many items have been processed
pub const MIN_ITEMS_FOR_ERROR_BUDGET: i64 = 10;

/// Totals for one run of a data migration
#[derive(Debug, Clone, Default, Serialize)]
pub struct MigrationSummary {
    pub completed: i64,
    pub skipped: i64,
    pub failed: i64,
    pub errors: Vec<String>,
    /// Stopped early because the error budget was exceeded
    pub aborted: bool,
}

impl MigrationSummary {
    pub fn processed(&self) -> i64 {
        self.completed + self.skipped + self.failed
    }

    pub fn error_rate(&self) -> f64 {
        let processed = self.processed();
        if processed == 0 {
            0.0
        } else {
            self.failed as f64 / processed as f64
        }
    }

    fn error_budget_exceeded(&self, budget: f64) -> bool {
        self.processed() >= MIN_ITEMS_FOR_ERROR_BUDGET && self.error_rate() > budget
    }
}

/// Run a migration to completion, one cursor page at a time.
///
/// Failed items are counted and the cursor moves past them, so a bad record
/// cannot wedge the run.
pub async fn run_migration(
    migration: &dyn DataMigration,
    ctx: &MigrationContext,
) -> Result<MigrationSummary> {
    let name = migration.name();
    let batch_size = ctx.deps.batch_size;
    let mut summary = MigrationSummary::default();
    let mut cursor: Option<RegistrantId> = None;

    info!(migration = name, dry_run = ctx.dry_run, "Starting data migration");

    loop {
        let work = migration.find_work(cursor, batch_size, &ctx.deps).await?;
        let Some(last) = work.last().copied() else {
            break;
        };
        cursor = Some(last);

        for id in work {
            match migration.execute_one(id, ctx).await {
                Ok(MigrationResult::Migrated | MigrationResult::WouldMigrate) => {
                    summary.completed += 1
                }
                Ok(MigrationResult::Skipped | MigrationResult::WouldSkip) => summary.skipped += 1,
                Err(e) => {
                    warn!(migration = name, registrant_id = %id, error = %e, "Migration item failed");
                    summary.failed += 1;
                    summary.errors.push(format!("{}: {}", id, e));
                }
            }
        }

        info!(
            migration = name,
            completed = summary.completed,
            skipped = summary.skipped,
            failed = summary.failed,
            "Migration batch processed"
        );

        if summary.error_budget_exceeded(migration.error_budget()) {
            warn!(
                migration = name,
                error_rate = summary.error_rate(),
                "Error budget exceeded, stopping migration"
            );
            summary.aborted = true;
            break;
        }
    }

    Ok(summary)
}
