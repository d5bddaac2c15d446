//! Test doubles shared by the unit tests in this crate.

use std::sync::{Arc, Mutex};

use eugestante_core::{
    message::{CancelNotification, ScheduleNotification, WorkerMessage},
    notification::PresentedNotification,
    tag::NotificationTag,
};

use crate::{
    channel::DeliveryChannel,
    error::{ChannelError, Result},
    notifier::Notifier,
};

#[derive(Clone, Default)]
pub struct RecordingNotifier {
    presented: Arc<Mutex<Vec<PresentedNotification>>>,
    dismissed: Arc<Mutex<Vec<NotificationTag>>>,
}

impl RecordingNotifier {
    pub fn presented(&self) -> Vec<PresentedNotification> {
        self.presented.lock().unwrap().clone()
    }

    pub fn dismissed(&self) -> Vec<NotificationTag> {
        self.dismissed.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn present(&self, notification: PresentedNotification) {
        self.presented.lock().unwrap().push(notification);
    }

    fn dismiss(&self, tag: &NotificationTag) {
        self.dismissed.lock().unwrap().push(tag.clone());
    }
}

/// Records every message; optionally refuses them all.
#[derive(Clone, Default)]
pub struct RecordingChannel {
    sent: Arc<Mutex<Vec<WorkerMessage>>>,
    failing: Arc<Mutex<Option<ChannelError>>>,
}

impl RecordingChannel {
    pub fn failing(err: ChannelError) -> Self {
        let channel = Self::default();
        channel.fail_with(Some(err));
        channel
    }

    pub fn fail_with(&self, err: Option<ChannelError>) {
        *self.failing.lock().unwrap() = err;
    }

    pub fn sent(&self) -> Vec<WorkerMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn scheduled(&self) -> Vec<ScheduleNotification> {
        self.sent()
            .into_iter()
            .filter_map(|m| match m {
                WorkerMessage::ScheduleNotification(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    pub fn cancelled(&self) -> Vec<NotificationTag> {
        self.sent()
            .into_iter()
            .filter_map(|m| match m {
                WorkerMessage::CancelNotification(c) => Some(c.tag),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }

    fn record(&self, msg: WorkerMessage) -> Result<()> {
        if let Some(err) = self.failing.lock().unwrap().clone() {
            return Err(err);
        }
        self.sent.lock().unwrap().push(msg);
        Ok(())
    }
}

impl DeliveryChannel for RecordingChannel {
    fn schedule(&self, msg: &ScheduleNotification) -> Result<()> {
        self.record(WorkerMessage::from(msg.clone()))
    }

    fn cancel(&self, tag: &NotificationTag) -> Result<()> {
        self.record(WorkerMessage::from(CancelNotification { tag: tag.clone() }))
    }
}
