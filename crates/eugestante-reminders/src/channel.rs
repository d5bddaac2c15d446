use eugestante_core::{
    message::{CancelNotification, ScheduleNotification, WorkerMessage},
    tag::NotificationTag,
};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;

use crate::error::{ChannelError, Result};

/// One-way path from the foreground scheduler to whatever arms timers.
///
/// Both calls are fire-and-forget: `Ok` means the request was handed off,
/// not that a timer exists. Callers treat cancellation as best-effort.
pub trait DeliveryChannel: Send + Sync {
    fn schedule(&self, msg: &ScheduleNotification) -> Result<()>;

    fn cancel(&self, tag: &NotificationTag) -> Result<()>;
}

/// Posts to the [`DeliveryWorker`](crate::worker::DeliveryWorker) mailbox.
///
/// Uses `try_send` so the foreground loop is never stalled by a slow worker.
#[derive(Debug, Clone)]
pub struct WorkerChannel {
    tx: mpsc::Sender<WorkerMessage>,
}

impl WorkerChannel {
    pub fn new(tx: mpsc::Sender<WorkerMessage>) -> Self {
        Self { tx }
    }

    pub fn is_available(&self) -> bool {
        !self.tx.is_closed()
    }

    fn post(&self, msg: WorkerMessage) -> Result<()> {
        match self.tx.try_send(msg) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(msg)) => {
                debug!(tag = %msg.tag(), "worker mailbox full");
                Err(ChannelError::Backpressure)
            }
            Err(TrySendError::Closed(_)) => Err(ChannelError::Unavailable),
        }
    }
}

impl DeliveryChannel for WorkerChannel {
    fn schedule(&self, msg: &ScheduleNotification) -> Result<()> {
        self.post(WorkerMessage::from(msg.clone()))
    }

    fn cancel(&self, tag: &NotificationTag) -> Result<()> {
        self.post(WorkerMessage::from(CancelNotification { tag: tag.clone() }))
    }
}
