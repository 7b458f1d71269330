//! Repair registrants whose status column is NULL or blank.
//!
//! Each record is saved on its own; one failure never aborts the batch.

use tracing::{debug, error, info};

use super::{persist_identity, BatchReport, Persisted};
use crate::common::RegistrantId;
use crate::domains::registrants::models::{RegistrantFilter, StatusFilter};
use crate::domains::registrants::{Registrant, RegistrantStatus, RegistryError};
use crate::kernel::ServerDeps;

/// Set a status-less registrant to `pending` and give it a temporary id.
///
/// The stored row is re-read first; `Ok(None)` means it already carries a
/// status and was left untouched.
pub async fn reconcile_registrant(
    id: RegistrantId,
    deps: &ServerDeps,
) -> Result<Option<Registrant>, RegistryError> {
    let persisted = persist_identity(id, deps, |registrant| {
        if registrant.status.is_some() {
            return Ok(false);
        }
        registrant.status = Some(RegistrantStatus::Pending);
        Ok(true)
    })
    .await?;

    match persisted {
        Persisted::Saved { registrant, .. } => Ok(Some(registrant)),
        Persisted::Declined(_) => Ok(None),
    }
}

/// Reconcile a batch of registrants with missing statuses.
///
/// Records that carry a status, either in the batch or by the time they are
/// re-read, are skipped untouched.
pub async fn reconcile_statuses(batch: Vec<Registrant>, deps: &ServerDeps) -> BatchReport {
    let mut report = BatchReport::default();

    for registrant in batch {
        report.examined += 1;

        if registrant.status.is_some() {
            report.skipped += 1;
            continue;
        }

        match reconcile_registrant(registrant.id, deps).await {
            Ok(Some(saved)) => {
                report.updated += 1;
                info!(
                    registrant_id = %saved.id,
                    member_id = ?saved.member_id.as_ref().map(|m| m.value()),
                    "Reconciled empty status to pending"
                );
            }
            Ok(None) => {
                report.skipped += 1;
                debug!(registrant_id = %registrant.id, "Status set since read, skipping");
            }
            Err(e) => {
                error!(registrant_id = %registrant.id, error = %e, "Failed to reconcile registrant");
                report.record_failure(registrant.id, e);
            }
        }
    }

    report
}

/// Page through every registrant with a missing status and reconcile it.
pub async fn reconcile_missing_statuses(deps: &ServerDeps) -> Result<BatchReport, RegistryError> {
    let mut report = BatchReport::default();
    let mut cursor = None;

    loop {
        let filter = RegistrantFilter::new()
            .status(StatusFilter::Missing)
            .after(cursor)
            .limit(deps.batch_size);
        let page = deps.store.find(&filter).await?;

        let Some(last) = page.last() else {
            break;
        };
        cursor = Some(last.id);

        report.merge(reconcile_statuses(page, deps).await);
    }

    info!(
        examined = report.examined,
        updated = report.updated,
        failed = report.failed.len(),
        "Status reconciliation complete"
    );

    Ok(report)
}
