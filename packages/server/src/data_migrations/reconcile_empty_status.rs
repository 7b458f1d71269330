//! Give every registrant with a NULL or blank status the `pending` status
//! and the temporary member id that goes with it.

use anyhow::Result;
use async_trait::async_trait;

use super::{DataMigration, MigrationContext, MigrationResult, VerifyResult};
use crate::common::RegistrantId;
use crate::domains::registrants::activities::reconcile_registrant;
use crate::domains::registrants::models::{RegistrantFilter, StatusFilter};
use crate::kernel::ServerDeps;

pub struct ReconcileEmptyStatusMigration;

fn missing_status() -> RegistrantFilter {
    RegistrantFilter::new().status(StatusFilter::Missing)
}

#[async_trait]
impl DataMigration for ReconcileEmptyStatusMigration {
    fn name(&self) -> &'static str {
        "reconcile_empty_status"
    }

    fn description(&self) -> &'static str {
        "Set registrants with an empty status to pending and assign temporary member ids"
    }

    async fn estimate(&self, deps: &ServerDeps) -> Result<i64> {
        Ok(deps.store.count(&missing_status()).await?)
    }

    async fn find_work(
        &self,
        cursor: Option<RegistrantId>,
        limit: i64,
        deps: &ServerDeps,
    ) -> Result<Vec<RegistrantId>> {
        let filter = missing_status().after(cursor).limit(limit);
        let page = deps.store.find(&filter).await?;
        Ok(page.into_iter().map(|r| r.id).collect())
    }

    async fn execute_one(
        &self,
        id: RegistrantId,
        ctx: &MigrationContext,
    ) -> Result<MigrationResult> {
        // Re-read: the row may have been fixed since find_work
        match ctx.deps.store.find_by_id(id).await? {
            Some(r) if r.status.is_none() => {}
            _ if ctx.dry_run => return Ok(MigrationResult::WouldSkip),
            _ => return Ok(MigrationResult::Skipped),
        }

        if ctx.dry_run {
            return Ok(MigrationResult::WouldMigrate);
        }

        match reconcile_registrant(id, &ctx.deps).await? {
            Some(_) => Ok(MigrationResult::Migrated),
            None => Ok(MigrationResult::Skipped),
        }
    }

    async fn verify(&self, deps: &ServerDeps) -> Result<VerifyResult> {
        let remaining = deps.store.count(&missing_status()).await?;
        if remaining == 0 {
            Ok(VerifyResult::Passed)
        } else {
            Ok(VerifyResult::Incomplete { remaining })
        }
    }
}
