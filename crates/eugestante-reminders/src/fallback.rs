use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

use eugestante_core::{message::ScheduleNotification, tag::NotificationTag, time::Clock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{
    channel::{DeliveryChannel, WorkerChannel},
    error::{ChannelError, Result},
    notifier::{Notifier, Presentation},
};

type TimerTable = Arc<Mutex<HashMap<NotificationTag, (u64, JoinHandle<()>)>>>;

/// Timers armed directly in the foreground when the worker is unreachable.
///
/// Strictly weaker than the worker: a notification is only shown while the
/// app is visible (`visible` flag) and nothing survives the process. Same
/// last-write-wins per tag.
pub struct InTabFallback {
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    presentation: Presentation,
    visible: Arc<AtomicBool>,
    auto_close: Duration,
    timers: TimerTable,
    generation: AtomicU64,
}

impl InTabFallback {
    pub fn new(
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
        presentation: Presentation,
        visible: Arc<AtomicBool>,
        auto_close: Duration,
    ) -> Self {
        Self {
            clock,
            notifier,
            presentation,
            visible,
            auto_close,
            timers: Arc::new(Mutex::new(HashMap::new())),
            generation: AtomicU64::new(0),
        }
    }

    pub fn armed_count(&self) -> usize {
        self.timers.lock().map(|t| t.len()).unwrap_or(0)
    }
}

impl DeliveryChannel for InTabFallback {
    fn schedule(&self, msg: &ScheduleNotification) -> Result<()> {
        let delay_ms = msg.scheduled_time - self.clock.now_millis();
        if delay_ms <= 0 {
            return Ok(());
        }

        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let tag = msg.tag.clone();
        let title = msg.title.clone();
        let body = msg.body.clone();
        let clock = Arc::clone(&self.clock);
        let notifier = Arc::clone(&self.notifier);
        let presentation = self.presentation.clone();
        let visible = Arc::clone(&self.visible);
        let auto_close = self.auto_close;
        let timers = Arc::clone(&self.timers);

        let mut table = self
            .timers
            .lock()
            .map_err(|_| ChannelError::Fallback("timer table poisoned".to_string()))?;
        if let Some((_, prev)) = table.remove(&tag) {
            prev.abort();
        }

        let task_tag = tag.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(delay_ms as u64)).await;
            if let Ok(mut t) = timers.lock() {
                if t.get(&task_tag).is_some_and(|(g, _)| *g == generation) {
                    t.remove(&task_tag);
                }
            }
            if !visible.load(Ordering::Relaxed) {
                debug!(tag = %task_tag, "app hidden; in-tab reminder skipped");
                return;
            }
            let notification =
                presentation.notification(title, body, task_tag.clone(), clock.now_millis());
            notifier.present(notification);
            tokio::time::sleep(auto_close).await;
            notifier.dismiss(&task_tag);
        });
        table.insert(tag, (generation, handle));
        Ok(())
    }

    fn cancel(&self, tag: &NotificationTag) -> Result<()> {
        if let Ok(mut table) = self.timers.lock() {
            if let Some((_, handle)) = table.remove(tag) {
                handle.abort();
            }
        }
        Ok(())
    }
}

impl Drop for InTabFallback {
    fn drop(&mut self) {
        if let Ok(mut table) = self.timers.lock() {
            for (_, (_, handle)) in table.drain() {
                handle.abort();
            }
        }
    }
}

/// Worker first, in-tab timers when the worker cannot be reached.
///
/// Never returns an error for a schedule: a reminder is a convenience, so a
/// failed hand-off is logged and degraded rather than surfaced.
pub struct FallbackChannel {
    primary: Option<WorkerChannel>,
    fallback: InTabFallback,
}

impl FallbackChannel {
    pub fn new(primary: Option<WorkerChannel>, fallback: InTabFallback) -> Self {
        if primary.is_none() {
            info!("delivery worker disabled; reminders use in-tab timers");
        }
        Self { primary, fallback }
    }

    pub fn fallback(&self) -> &InTabFallback {
        &self.fallback
    }
}

impl DeliveryChannel for FallbackChannel {
    fn schedule(&self, msg: &ScheduleNotification) -> Result<()> {
        if let Some(ref primary) = self.primary {
            match primary.schedule(msg) {
                Ok(()) => return Ok(()),
                Err(e) => warn!(tag = %msg.tag, error = %e, "worker unreachable; using in-tab timer"),
            }
        }
        self.fallback.schedule(msg)
    }

    fn cancel(&self, tag: &NotificationTag) -> Result<()> {
        if let Some(ref primary) = self.primary {
            if let Err(e) = primary.cancel(tag) {
                debug!(%tag, error = %e, "cancel not delivered to worker");
            }
        }
        self.fallback.cancel(tag)
    }
}
