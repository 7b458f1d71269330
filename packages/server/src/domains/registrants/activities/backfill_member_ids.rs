//! Assign member ids to registrants that have a live status but no id yet.

use tracing::{error, info};

use super::{persist_identity, BatchReport, Persisted};
use crate::domains::registrants::models::{RegistrantFilter, StatusFilter};
use crate::domains::registrants::{IdentityOutcome, RegistrantStatus, RegistryError};
use crate::kernel::ServerDeps;

/// Statuses that should always carry a member id
pub const BACKFILL_STATUSES: [RegistrantStatus; 4] = [
    RegistrantStatus::Pending,
    RegistrantStatus::Approved,
    RegistrantStatus::Incomplete,
    RegistrantStatus::NonCompliant,
];

pub fn backfill_filter() -> RegistrantFilter {
    RegistrantFilter::new()
        .status(StatusFilter::In(BACKFILL_STATUSES.to_vec()))
        .has_member_id(false)
}

pub async fn backfill_member_ids(deps: &ServerDeps) -> Result<BatchReport, RegistryError> {
    let mut report = BatchReport::default();
    let mut cursor = None;

    loop {
        let filter = backfill_filter().after(cursor).limit(deps.batch_size);
        let page = deps.store.find(&filter).await?;

        let Some(last) = page.last() else {
            break;
        };
        cursor = Some(last.id);

        for registrant in page {
            report.examined += 1;
            let persisted = persist_identity(registrant.id, deps, |current| {
                Ok(current.member_id.is_none()
                    && current.status.is_some_and(|s| BACKFILL_STATUSES.contains(&s)))
            })
            .await;

            match persisted.map(Persisted::into_parts) {
                Ok((saved, IdentityOutcome::Assigned { member_id, .. })) => {
                    report.updated += 1;
                    info!(registrant_id = %saved.id, member_id = %member_id, "Backfilled member id");
                }
                Ok((_, IdentityOutcome::Unchanged)) => report.skipped += 1,
                Err(e) => {
                    error!(registrant_id = %registrant.id, error = %e, "Failed to backfill member id");
                    report.record_failure(registrant.id, e);
                }
            }
        }
    }

    info!(
        examined = report.examined,
        assigned = report.updated,
        failed = report.failed.len(),
        "Member id backfill complete"
    );

    Ok(report)
}
