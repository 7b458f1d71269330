use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::common::RegistrantId;
use crate::domains::registrants::activities::{register_registrant, update_status};
use crate::domains::registrants::{NewRegistrant, Registrant, RegistrantStatus, RegistryError};
use crate::server::app::AppState;
use crate::server::ApiError;

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: RegistrantStatus,
}

pub async fn create_registrant_handler(
    Extension(state): Extension<AppState>,
    Json(input): Json<NewRegistrant>,
) -> Result<(StatusCode, Json<Registrant>), ApiError> {
    let registrant = register_registrant(input, &state.deps).await?;
    Ok((StatusCode::CREATED, Json(registrant)))
}

pub async fn get_registrant_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<RegistrantId>,
) -> Result<Json<Registrant>, ApiError> {
    let registrant = state
        .deps
        .store
        .find_by_id(id)
        .await?
        .ok_or(RegistryError::NotFound(id))?;
    Ok(Json(registrant))
}

pub async fn update_status_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<RegistrantId>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Registrant>, ApiError> {
    let registrant = update_status(id, request.status, &state.deps).await?;
    Ok(Json(registrant))
}
