//! In-process notification centre.
//!
//! Stands in for the OS notification surface: presented notifications are
//! kept while visible (keyed by tag, so a repeat replaces the previous one)
//! and queued for HTTP clients that poll `GET /notifications`.

use std::sync::Mutex;

use dashmap::DashMap;
use eugestante_core::{notification::PresentedNotification, tag::NotificationTag};
use eugestante_reminders::Notifier;
use tracing::info;

#[derive(Default)]
pub struct NotificationCenter {
    visible: DashMap<NotificationTag, PresentedNotification>,
    outbox: Mutex<Vec<PresentedNotification>>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain everything presented since the last poll.
    pub fn drain(&self) -> Vec<PresentedNotification> {
        let mut outbox = self.outbox.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *outbox)
    }

    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }
}

impl Notifier for NotificationCenter {
    fn present(&self, notification: PresentedNotification) {
        info!(tag = %notification.tag, title = %notification.title, "notification presented");
        self.visible
            .insert(notification.tag.clone(), notification.clone());
        self.outbox
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(notification);
    }

    fn dismiss(&self, tag: &NotificationTag) {
        self.visible.remove(tag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eugestante_reminders::Presentation;

    fn sample(tag: &str, title: &str) -> PresentedNotification {
        Presentation::default().notification(
            title.to_string(),
            "Lembrete".to_string(),
            NotificationTag::from(tag),
            0,
        )
    }

    #[test]
    fn drain_empties_the_outbox() {
        let center = NotificationCenter::new();
        center.present(sample("medication-a-08:00", "one"));
        center.present(sample("medication-a-20:00", "two"));
        assert_eq!(center.drain().len(), 2);
        assert!(center.drain().is_empty());
        // Draining does not close anything.
        assert_eq!(center.visible_count(), 2);
    }

    #[test]
    fn same_tag_replaces_visible_notification() {
        let center = NotificationCenter::new();
        center.present(sample("medication-a-08:00", "first"));
        center.present(sample("medication-a-08:00", "second"));
        assert_eq!(center.visible_count(), 1);

        center.dismiss(&NotificationTag::from("medication-a-08:00"));
        assert_eq!(center.visible_count(), 0);
        // Unknown tags are ignored.
        center.dismiss(&NotificationTag::from("medication-b-08:00"));
    }
}
