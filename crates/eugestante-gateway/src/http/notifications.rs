//! Notification polling and activation.
//!
//! `GET /notifications` drains everything presented since the last poll.
//! `POST /notifications/{tag}/click` reports that the user activated a
//! notification; the response tells the host which window to focus, or
//! which URL to open.

use axum::{
    extract::{Path, State},
    Json,
};
use eugestante_core::{ClientWindow, InteractionOutcome, NotificationTag, PresentedNotification};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::app::AppState;

#[derive(Serialize)]
pub struct NotificationResponse {
    pub notifications: Vec<PresentedNotification>,
}

#[derive(Deserialize, Default)]
pub struct ClickRequest {
    /// Windows the host currently has open, in focus order.
    #[serde(default)]
    pub windows: Vec<ClientWindow>,
}

/// GET /notifications
pub async fn poll(State(state): State<Arc<AppState>>) -> Json<NotificationResponse> {
    Json(NotificationResponse {
        notifications: state.notifications.drain(),
    })
}

/// POST /notifications/{tag}/click
pub async fn click(
    State(state): State<Arc<AppState>>,
    Path(tag): Path<String>,
    body: Option<Json<ClickRequest>>,
) -> Json<InteractionOutcome> {
    let tag = NotificationTag::from(tag);
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let outcome = state.presentation.on_notification_interaction(
        state.notifications.as_ref(),
        &tag,
        &req.windows,
    );
    debug!(%tag, ?outcome, "notification activated");
    Json(outcome)
}
