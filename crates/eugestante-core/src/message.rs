//! Messages posted from the foreground scheduler to the delivery worker.
//!
//! Wire shape (one JSON object per message):
//!
//! ```text
//! { "type": "SCHEDULE_NOTIFICATION", "title": "...", "body": "...", "tag": "...", "scheduledTime": 1700000000000 }
//! { "type": "CANCEL_NOTIFICATION", "tag": "..." }
//! ```
//!
//! Delivery is fire-and-forget. There is no acknowledgement, so the worker
//! must tolerate duplicates (same tag supersedes) and the foreground must
//! tolerate loss (next resync re-sends).

use serde::{Deserialize, Serialize};

use crate::tag::NotificationTag;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerMessage {
    ScheduleNotification(ScheduleNotification),
    CancelNotification(CancelNotification),
}

/// Arm (or re-arm) the reminder identified by `tag` for an absolute instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleNotification {
    pub title: String,
    pub body: String,
    pub tag: NotificationTag,
    /// Epoch milliseconds.
    pub scheduled_time: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelNotification {
    pub tag: NotificationTag,
}

impl WorkerMessage {
    pub fn tag(&self) -> &NotificationTag {
        match self {
            WorkerMessage::ScheduleNotification(m) => &m.tag,
            WorkerMessage::CancelNotification(m) => &m.tag,
        }
    }
}

impl From<ScheduleNotification> for WorkerMessage {
    fn from(m: ScheduleNotification) -> Self {
        WorkerMessage::ScheduleNotification(m)
    }
}

impl From<CancelNotification> for WorkerMessage {
    fn from(m: CancelNotification) -> Self {
        WorkerMessage::CancelNotification(m)
    }
}
