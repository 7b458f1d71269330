use axum::{extract::Extension, Json};

use crate::domains::registrants::activities::{
    backfill_member_ids, reconcile_missing_statuses, BatchReport,
};
use crate::server::app::AppState;
use crate::server::ApiError;

/// Run status reconciliation now instead of waiting for the nightly job
pub async fn reconcile_handler(
    Extension(state): Extension<AppState>,
) -> Result<Json<BatchReport>, ApiError> {
    Ok(Json(reconcile_missing_statuses(&state.deps).await?))
}

pub async fn backfill_handler(
    Extension(state): Extension<AppState>,
) -> Result<Json<BatchReport>, ApiError> {
    Ok(Json(backfill_member_ids(&state.deps).await?))
}
