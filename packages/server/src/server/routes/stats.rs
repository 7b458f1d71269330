use axum::{extract::Extension, Json};

use crate::domains::registrants::activities::{registrant_stats, RegistrantStats};
use crate::server::app::AppState;
use crate::server::ApiError;

pub async fn stats_handler(
    Extension(state): Extension<AppState>,
) -> Result<Json<RegistrantStats>, ApiError> {
    Ok(Json(registrant_stats(&state.deps).await?))
}
