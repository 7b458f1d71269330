//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! - Daily reconciliation of registrants with an empty status
//! - Hourly backfill of member ids for statused registrants that lack one
//!
//! Each run is a plain call into the registrant activities; the scheduler
//! knows nothing about member id rules.

use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::domains::registrants::activities::{backfill_member_ids, reconcile_missing_statuses};
use crate::kernel::ServerDeps;

/// Every day at 02:00
pub const RECONCILE_SCHEDULE: &str = "0 0 2 * * *";

/// Every hour at half past
pub const BACKFILL_SCHEDULE: &str = "0 30 * * * *";

/// Start all scheduled tasks
pub async fn start_scheduler(deps: ServerDeps) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let reconcile_deps = deps.clone();
    let reconcile_job = Job::new_async(RECONCILE_SCHEDULE, move |_uuid, _lock| {
        let deps = reconcile_deps.clone();
        Box::pin(async move {
            run_reconcile(&deps).await;
        })
    })?;
    scheduler.add(reconcile_job).await?;

    let backfill_deps = deps.clone();
    let backfill_job = Job::new_async(BACKFILL_SCHEDULE, move |_uuid, _lock| {
        let deps = backfill_deps.clone();
        Box::pin(async move {
            run_backfill(&deps).await;
        })
    })?;
    scheduler.add(backfill_job).await?;

    scheduler.start().await?;

    tracing::info!(
        reconcile = RECONCILE_SCHEDULE,
        backfill = BACKFILL_SCHEDULE,
        "Scheduled tasks started"
    );
    Ok(scheduler)
}

async fn run_reconcile(deps: &ServerDeps) {
    tracing::info!("Running scheduled status reconciliation");

    match reconcile_missing_statuses(deps).await {
        Ok(report) if !report.failed.is_empty() => tracing::warn!(
            updated = report.updated,
            failed = report.failed.len(),
            "Status reconciliation finished with failures"
        ),
        Ok(_) => {}
        Err(e) => tracing::error!(error = %e, "Status reconciliation task failed"),
    }
}

async fn run_backfill(deps: &ServerDeps) {
    tracing::info!("Running scheduled member id backfill");

    match backfill_member_ids(deps).await {
        Ok(report) if !report.failed.is_empty() => tracing::warn!(
            assigned = report.updated,
            failed = report.failed.len(),
            "Member id backfill finished with failures"
        ),
        Ok(_) => {}
        Err(e) => tracing::error!(error = %e, "Member id backfill task failed"),
    }
}
