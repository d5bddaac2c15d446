//! Medication CRUD for the configured account.
//!
//! Every successful mutation runs through [`AppState::mutate`], which
//! republishes the active set so the foreground scheduler re-derives its
//! pending reminders.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use eugestante_core::{
    EuGestanteError, Medication, MedicationId, MedicationUpdate, NewMedication,
};
use eugestante_medications::MedicationStore;
use std::sync::Arc;
use tracing::info;

use crate::{app::AppState, error::ApiError};

/// GET /medications
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Medication>>, ApiError> {
    Ok(Json(state.store.list_for_user(&state.user_id)?))
}

/// POST /medications
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewMedication>,
) -> Result<(StatusCode, Json<Medication>), ApiError> {
    let med = state
        .mutate(|store| Ok(store.save(&state.user_id, body)?))
        .await?;
    info!(id = %med.id, name = %med.name, "medication created");
    Ok((StatusCode::CREATED, Json(med)))
}

/// PATCH /medications/{id}
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<MedicationUpdate>,
) -> Result<Json<Medication>, ApiError> {
    let med = state
        .mutate(|store| {
            let id = owned(store, &state, id)?;
            Ok(store.update(&id, body)?)
        })
        .await?;
    Ok(Json(med))
}

/// POST /medications/{id}/toggle
pub async fn toggle(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Medication>, ApiError> {
    let med = state
        .mutate(|store| {
            let id = owned(store, &state, id)?;
            Ok(store.toggle_active(&id)?)
        })
        .await?;
    info!(id = %med.id, active = med.active, "medication toggled");
    Ok(Json(med))
}

/// DELETE /medications/{id}
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .mutate(|store| {
            let id = owned(store, &state, id)?;
            Ok(store.delete(&id)?)
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// Another account's medication is reported as missing.
fn owned(store: &MedicationStore, state: &AppState, id: String) -> Result<MedicationId, ApiError> {
    let id = MedicationId::from(id);
    let med = store.get(&id)?;
    if med.user_id != state.user_id {
        return Err(EuGestanteError::MedicationNotFound { id: id.to_string() }.into());
    }
    Ok(id)
}
