//! What gets handed to the OS notification surface, and how a click on it is
//! routed back into the app.

use serde::{Deserialize, Serialize};

use crate::tag::NotificationTag;

/// Vibration pattern (ms on/off/on) used on mobile devices.
pub const VIBRATE_PATTERN: [u32; 3] = [200, 100, 200];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentedNotification {
    pub title: String,
    pub body: String,
    /// The notification surface also de-duplicates on this.
    pub tag: NotificationTag,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub require_interaction: bool,
    pub data: NotificationData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationData {
    /// Route the app navigates to when the notification is activated.
    pub url: String,
    /// Epoch milliseconds at presentation.
    pub timestamp: i64,
}

/// An application window known to the notification host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientWindow {
    pub id: String,
    pub url: String,
}

/// What the host should do after the user activates a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum InteractionOutcome {
    /// Bring an existing window forward and navigate it.
    Focus { window_id: String, navigate_to: String },
    /// No matching window: open a fresh one.
    Open { url: String },
}

/// Pick the first window whose URL belongs to `app_origin`, else open a new one.
/// Either way the destination is `route`.
pub fn resolve_interaction(
    windows: &[ClientWindow],
    app_origin: &str,
    route: &str,
) -> InteractionOutcome {
    let origin = app_origin.trim_end_matches('/');
    let matches_origin = |url: &str| {
        if origin.is_empty() {
            // Relative origin ("/"): any same-app path counts.
            url.starts_with('/')
        } else {
            url == origin || url.starts_with(&format!("{origin}/"))
        }
    };

    match windows.iter().find(|w| matches_origin(&w.url)) {
        Some(w) => InteractionOutcome::Focus {
            window_id: w.id.clone(),
            navigate_to: route.to_string(),
        },
        None => InteractionOutcome::Open {
            url: route.to_string(),
        },
    }
}
