//! Notification permission and page visibility, as reported by the client.

use axum::{extract::State, http::StatusCode, Json};
use eugestante_core::{Banner, PermissionState};
use serde::{Deserialize, Serialize};
use std::sync::{atomic::Ordering, Arc};
use tracing::debug;

use crate::app::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct PermissionView {
    pub state: PermissionState,
    pub banner: Banner,
    /// A prompt is waiting for the user's answer via `PUT /permission`.
    pub prompt_pending: bool,
}

#[derive(Deserialize)]
pub struct PermissionReport {
    pub state: PermissionState,
}

#[derive(Deserialize)]
pub struct VisibilityReport {
    pub visible: bool,
}

fn view(state: &AppState) -> PermissionView {
    PermissionView {
        state: state.permission.state(),
        banner: state.permission.banner(),
        prompt_pending: state.prompt.is_pending(),
    }
}

/// GET /permission
pub async fn show(State(state): State<Arc<AppState>>) -> Json<PermissionView> {
    Json(view(&state))
}

/// PUT /permission: the user's answer to the browser prompt.
pub async fn record(
    State(state): State<Arc<AppState>>,
    Json(report): Json<PermissionReport>,
) -> Json<PermissionView> {
    if state.prompt.answer(report.state) {
        debug!(state = %report.state, "permission prompt answered");
    }
    state.permission.set(report.state);
    Json(view(&state))
}

/// POST /permission/request: ask, but only while undecided.
pub async fn request(State(state): State<Arc<AppState>>) -> (StatusCode, Json<PermissionView>) {
    if state.permission.state() == PermissionState::Default {
        state.prompt_permission(false);
    }
    (StatusCode::ACCEPTED, Json(view(&state)))
}

/// POST /permission/retry: the blocked banner's retry action.
pub async fn retry(State(state): State<Arc<AppState>>) -> (StatusCode, Json<PermissionView>) {
    if !state.permission.state().is_granted() {
        state.prompt_permission(true);
    }
    (StatusCode::ACCEPTED, Json(view(&state)))
}

/// POST /permission/dismiss: hide the request banner.
pub async fn dismiss(State(state): State<Arc<AppState>>) -> Json<PermissionView> {
    state.permission.dismiss_banner();
    Json(view(&state))
}

/// PUT /visibility: whether the app is in the foreground.
pub async fn visibility(
    State(state): State<Arc<AppState>>,
    Json(report): Json<VisibilityReport>,
) -> StatusCode {
    debug!(visible = report.visible, "visibility changed");
    state.visible.store(report.visible, Ordering::Relaxed);
    StatusCode::NO_CONTENT
}
