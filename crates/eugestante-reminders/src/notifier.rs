use eugestante_core::{
    config::RemindersConfig,
    notification::{
        resolve_interaction, ClientWindow, InteractionOutcome, NotificationData,
        PresentedNotification, VIBRATE_PATTERN,
    },
    tag::NotificationTag,
};

/// The system notification surface.
///
/// Implementations must not block: both actors call these from their event
/// loop.
pub trait Notifier: Send + Sync {
    fn present(&self, notification: PresentedNotification);

    /// Close a notification if it is still visible. Unknown tags are ignored.
    fn dismiss(&self, tag: &NotificationTag);
}

/// Static presentation settings shared by the worker and the in-tab fallback.
#[derive(Debug, Clone)]
pub struct Presentation {
    pub icon: String,
    pub navigation_route: String,
    pub app_origin: String,
}

impl Presentation {
    pub fn from_config(cfg: &RemindersConfig) -> Self {
        Self {
            icon: cfg.icon.clone(),
            navigation_route: cfg.navigation_route.clone(),
            app_origin: cfg.app_origin.clone(),
        }
    }

    /// Build the payload handed to the notification surface.
    pub fn notification(
        &self,
        title: String,
        body: String,
        tag: NotificationTag,
        presented_at_millis: i64,
    ) -> PresentedNotification {
        PresentedNotification {
            title,
            body,
            tag,
            icon: self.icon.clone(),
            badge: self.icon.clone(),
            vibrate: VIBRATE_PATTERN.to_vec(),
            require_interaction: false,
            data: NotificationData {
                url: self.navigation_route.clone(),
                timestamp: presented_at_millis,
            },
        }
    }

    /// User activated the notification `tag`: close it, then focus an app
    /// window or open one, landing on the reminders view.
    pub fn on_notification_interaction(
        &self,
        notifier: &dyn Notifier,
        tag: &NotificationTag,
        windows: &[ClientWindow],
    ) -> InteractionOutcome {
        notifier.dismiss(tag);
        resolve_interaction(windows, &self.app_origin, &self.navigation_route)
    }
}

impl Default for Presentation {
    fn default() -> Self {
        Self::from_config(&RemindersConfig::default())
    }
}
