//! Assign member ids to registrants that have a status but were never given
//! an id (rows created before ids existed, or saves that failed mid-way).

use anyhow::Result;
use async_trait::async_trait;

use super::{DataMigration, MigrationContext, MigrationResult, VerifyResult};
use crate::common::RegistrantId;
use crate::domains::registrants::activities::{backfill_filter, ensure_member_id};
use crate::domains::registrants::identity::IdentityAction;
use crate::domains::registrants::IdentityOutcome;
use crate::kernel::ServerDeps;

pub struct BackfillMemberIdsMigration;

#[async_trait]
impl DataMigration for BackfillMemberIdsMigration {
    fn name(&self) -> &'static str {
        "backfill_member_ids"
    }

    fn description(&self) -> &'static str {
        "Assign member ids to non-archived registrants that have none"
    }

    async fn estimate(&self, deps: &ServerDeps) -> Result<i64> {
        Ok(deps.store.count(&backfill_filter()).await?)
    }

    async fn find_work(
        &self,
        cursor: Option<RegistrantId>,
        limit: i64,
        deps: &ServerDeps,
    ) -> Result<Vec<RegistrantId>> {
        let filter = backfill_filter().after(cursor).limit(limit);
        let page = deps.store.find(&filter).await?;
        Ok(page.into_iter().map(|r| r.id).collect())
    }

    async fn execute_one(
        &self,
        id: RegistrantId,
        ctx: &MigrationContext,
    ) -> Result<MigrationResult> {
        if ctx.dry_run {
            let Some(registrant) = ctx.deps.store.find_by_id(id).await? else {
                return Ok(MigrationResult::WouldSkip);
            };
            return match ctx.deps.engine.plan(&registrant)? {
                IdentityAction::Keep => Ok(MigrationResult::WouldSkip),
                IdentityAction::Assign { .. } => Ok(MigrationResult::WouldMigrate),
            };
        }

        match ensure_member_id(id, &ctx.deps).await? {
            (_, IdentityOutcome::Assigned { .. }) => Ok(MigrationResult::Migrated),
            (_, IdentityOutcome::Unchanged) => Ok(MigrationResult::Skipped),
        }
    }

    async fn verify(&self, deps: &ServerDeps) -> Result<VerifyResult> {
        let remaining = deps.store.count(&backfill_filter()).await?;
        if remaining == 0 {
            Ok(VerifyResult::Passed)
        } else {
            Ok(VerifyResult::Incomplete { remaining })
        }
    }
}
