//! Axum route handlers for sellers, witnesses and saved jobs.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::contract::ContractForm;
use crate::models::records::{SavedJobRow, SellerRow, WitnessRow};
use crate::records::jobs::{delete_job, list_jobs, save_job};
use crate::records::people::{
    create_seller, create_witness, delete_person, list_sellers, list_witnesses, NewSeller,
    NewWitness, PersonCollection,
};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SaveJobRequest {
    #[serde(alias = "formData")]
    pub form_data: ContractForm,
}

/// GET /api/v1/sellers
pub async fn handle_list_sellers(
    State(state): State<AppState>,
) -> Result<Json<Vec<SellerRow>>, AppError> {
    Ok(Json(list_sellers(&state.db).await?))
}

/// POST /api/v1/sellers
pub async fn handle_create_seller(
    State(state): State<AppState>,
    Json(req): Json<NewSeller>,
) -> Result<(StatusCode, Json<SellerRow>), AppError> {
    let row = create_seller(&state.db, &req).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// DELETE /api/v1/sellers/:id
pub async fn handle_delete_seller(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    delete_person(&state.db, PersonCollection::Sellers, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/witnesses
pub async fn handle_list_witnesses(
    State(state): State<AppState>,
) -> Result<Json<Vec<WitnessRow>>, AppError> {
    Ok(Json(list_witnesses(&state.db).await?))
}

/// POST /api/v1/witnesses
pub async fn handle_create_witness(
    State(state): State<AppState>,
    Json(req): Json<NewWitness>,
) -> Result<(StatusCode, Json<WitnessRow>), AppError> {
    let row = create_witness(&state.db, &req).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// DELETE /api/v1/witnesses/:id
pub async fn handle_delete_witness(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    delete_person(&state.db, PersonCollection::Witnesses, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/people/:collection/:id
pub async fn handle_delete_person(
    State(state): State<AppState>,
    Path((collection, id)): Path<(PersonCollection, Uuid)>,
) -> Result<StatusCode, AppError> {
    delete_person(&state.db, collection, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/jobs
///
/// Expired jobs are swept before the listing is read.
pub async fn handle_list_jobs(
    State(state): State<AppState>,
) -> Result<Json<Vec<SavedJobRow>>, AppError> {
    Ok(Json(
        list_jobs(&state.db, state.config.job_expiry_hours).await?,
    ))
}

/// POST /api/v1/jobs
pub async fn handle_save_job(
    State(state): State<AppState>,
    Json(req): Json<SaveJobRequest>,
) -> Result<(StatusCode, Json<SavedJobRow>), AppError> {
    let row = save_job(&state.db, &req.form_data).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// DELETE /api/v1/jobs/:id
pub async fn handle_delete_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    delete_job(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
