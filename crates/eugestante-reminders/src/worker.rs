use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use eugestante_core::{
    message::{ScheduleNotification, WorkerMessage},
    tag::NotificationTag,
    time::Clock,
};
use futures_util::StreamExt;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::time::{delay_queue, DelayQueue};
use tracing::{debug, info};

use crate::{
    channel::WorkerChannel,
    notifier::{Notifier, Presentation},
};

/// Result of a schedule request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmOutcome {
    /// No timer existed for the tag; one is now armed.
    Armed,
    /// A timer for the tag was cancelled and replaced.
    Superseded,
    /// `scheduled_time` was not in the future; nothing armed.
    Dropped,
}

struct ArmedReminder {
    key: delay_queue::Key,
    title: String,
    body: String,
    scheduled_time: i64,
}

/// Background delivery actor.
///
/// Owns the tag → timer table outright; it is only touched from the task
/// running [`DeliveryWorker::run`], so no locking. Each tag moves through
/// `absent → armed → (fired | cancelled) → absent`, and a repeat schedule for
/// an armed tag replaces its timer instead of adding a second one.
///
/// Armed timers live in memory only. A restart loses them; the foreground
/// resync re-arms within one interval.
pub struct DeliveryWorker {
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    presentation: Presentation,
    timers: DelayQueue<NotificationTag>,
    armed: HashMap<NotificationTag, ArmedReminder>,
}

impl DeliveryWorker {
    pub fn new(clock: Arc<dyn Clock>, notifier: Arc<dyn Notifier>, presentation: Presentation) -> Self {
        Self {
            clock,
            notifier,
            presentation,
            timers: DelayQueue::new(),
            armed: HashMap::new(),
        }
    }

    pub fn handle(&mut self, msg: WorkerMessage) {
        match msg {
            WorkerMessage::ScheduleNotification(req) => {
                self.handle_schedule(req);
            }
            WorkerMessage::CancelNotification(req) => {
                self.handle_cancel(&req.tag);
            }
        }
    }

    /// Arm a timer for `req.tag`, replacing any timer already armed for it.
    pub fn handle_schedule(&mut self, req: ScheduleNotification) -> ArmOutcome {
        let delay_ms = req.scheduled_time - self.clock.now_millis();
        if delay_ms <= 0 {
            // Stale or clock-skewed; the next resync sends a corrected one.
            debug!(tag = %req.tag, delay_ms, "schedule request not in the future; dropped");
            return ArmOutcome::Dropped;
        }

        let outcome = match self.armed.remove(&req.tag) {
            Some(prev) => {
                self.timers.remove(&prev.key);
                ArmOutcome::Superseded
            }
            None => ArmOutcome::Armed,
        };

        let key = self
            .timers
            .insert(req.tag.clone(), Duration::from_millis(delay_ms as u64));
        debug!(tag = %req.tag, delay_ms, ?outcome, "reminder armed");
        self.armed.insert(
            req.tag,
            ArmedReminder {
                key,
                title: req.title,
                body: req.body,
                scheduled_time: req.scheduled_time,
            },
        );
        outcome
    }

    /// Cancel the timer for `tag`. Returns whether one was armed.
    pub fn handle_cancel(&mut self, tag: &NotificationTag) -> bool {
        match self.armed.remove(tag) {
            Some(entry) => {
                self.timers.remove(&entry.key);
                debug!(%tag, "reminder cancelled");
                true
            }
            None => false,
        }
    }

    /// Present the notification for an expired tag and drop its entry.
    fn fire(&mut self, tag: NotificationTag) {
        let Some(entry) = self.armed.remove(&tag) else {
            return;
        };
        let now = self.clock.now_millis();
        info!(%tag, late_ms = now - entry.scheduled_time, "presenting reminder");
        let notification = self
            .presentation
            .notification(entry.title, entry.body, tag, now);
        self.notifier.present(notification);
    }

    pub fn is_armed(&self, tag: &NotificationTag) -> bool {
        self.armed.contains_key(tag)
    }

    pub fn armed_count(&self) -> usize {
        self.armed.len()
    }

    /// Epoch millis at which `tag` is due, if armed.
    pub fn scheduled_time(&self, tag: &NotificationTag) -> Option<i64> {
        self.armed.get(tag).map(|e| e.scheduled_time)
    }

    /// Event loop: mailbox messages and timer expiries, until the mailbox
    /// closes or `shutdown` flips to `true`.
    pub async fn run(
        mut self,
        mut mailbox: mpsc::Receiver<WorkerMessage>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!("delivery worker started");
        loop {
            tokio::select! {
                msg = mailbox.recv() => match msg {
                    Some(msg) => self.handle(msg),
                    None => {
                        info!("delivery worker mailbox closed");
                        break;
                    }
                },
                Some(expired) = self.timers.next(), if !self.timers.is_empty() => {
                    self.fire(expired.into_inner());
                }
                res = shutdown.changed() => {
                    if res.is_err() || *shutdown.borrow() {
                        info!("delivery worker shutting down");
                        break;
                    }
                }
            }
        }
        if !self.armed.is_empty() {
            info!(count = self.armed.len(), "discarding armed reminders");
        }
    }
}

/// Spawn `worker` on the current runtime and return the channel that feeds it.
pub fn spawn_worker(
    worker: DeliveryWorker,
    mailbox_capacity: usize,
    shutdown: watch::Receiver<bool>,
) -> (WorkerChannel, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(mailbox_capacity.max(1));
    let handle = tokio::spawn(worker.run(rx, shutdown));
    (WorkerChannel::new(tx), handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::DeliveryChannel;
    use crate::testing::RecordingNotifier;
    use chrono::Local;
    use eugestante_core::time::FixedClock;

    fn worker(clock: Arc<FixedClock>, notifier: RecordingNotifier) -> DeliveryWorker {
        DeliveryWorker::new(clock, Arc::new(notifier), Presentation::default())
    }

    fn req(tag: &str, scheduled_time: i64) -> ScheduleNotification {
        ScheduleNotification {
            title: "Hora de tomar: Ferro".into(),
            body: format!("at {scheduled_time}"),
            tag: NotificationTag::from(tag),
            scheduled_time,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn past_or_present_requests_are_dropped() {
        let clock = Arc::new(FixedClock::at(Local::now()));
        let now = clock.now_millis();
        let mut w = worker(clock, RecordingNotifier::default());

        assert_eq!(w.handle_schedule(req("a", now)), ArmOutcome::Dropped);
        assert_eq!(w.handle_schedule(req("b", now - 10_000)), ArmOutcome::Dropped);
        assert_eq!(w.armed_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_same_tag_supersedes() {
        let clock = Arc::new(FixedClock::at(Local::now()));
        let now = clock.now_millis();
        let mut w = worker(clock, RecordingNotifier::default());

        assert_eq!(w.handle_schedule(req("a", now + 5_000)), ArmOutcome::Armed);
        assert_eq!(w.handle_schedule(req("a", now + 9_000)), ArmOutcome::Superseded);
        assert_eq!(w.armed_count(), 1);
        assert_eq!(w.scheduled_time(&NotificationTag::from("a")), Some(now + 9_000));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_unknown_tag_is_noop() {
        let clock = Arc::new(FixedClock::at(Local::now()));
        let mut w = worker(clock, RecordingNotifier::default());
        assert!(!w.handle_cancel(&NotificationTag::from("never-armed")));
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_at_latest_instant_after_supersede() {
        let clock = Arc::new(FixedClock::at(Local::now()));
        let now = clock.now_millis();
        let notifier = RecordingNotifier::default();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (channel, handle) =
            spawn_worker(worker(clock.clone(), notifier.clone()), 16, shutdown_rx);

        channel.schedule(&req("a", now + 5_000)).unwrap();
        channel.schedule(&req("a", now + 10_000)).unwrap();

        tokio::time::sleep(Duration::from_millis(6_000)).await;
        assert!(notifier.presented().is_empty(), "superseded timer must not fire");

        clock.advance(chrono::Duration::milliseconds(10_000));
        tokio::time::sleep(Duration::from_millis(5_000)).await;
        let presented = notifier.presented();
        assert_eq!(presented.len(), 1);
        assert_eq!(presented[0].body, format!("at {}", now + 10_000));
        assert_eq!(presented[0].tag.as_str(), "a");

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_never_fires() {
        let clock = Arc::new(FixedClock::at(Local::now()));
        let now = clock.now_millis();
        let notifier = RecordingNotifier::default();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let (channel, handle) =
            spawn_worker(worker(clock.clone(), notifier.clone()), 16, shutdown_rx);

        channel.schedule(&req("a", now + 1_000)).unwrap();
        channel.schedule(&req("b", now + 2_000)).unwrap();
        channel.cancel(&NotificationTag::from("a")).unwrap();

        tokio::time::sleep(Duration::from_millis(3_000)).await;
        let tags: Vec<String> = notifier
            .presented()
            .into_iter()
            .map(|n| n.tag.to_string())
            .collect();
        assert_eq!(tags, ["b"]);

        drop(channel);
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn fired_tag_can_be_rearmed() {
        let clock = Arc::new(FixedClock::at(Local::now()));
        let now = clock.now_millis();
        let notifier = RecordingNotifier::default();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let (channel, handle) =
            spawn_worker(worker(clock.clone(), notifier.clone()), 16, shutdown_rx);

        channel.schedule(&req("a", now + 1_000)).unwrap();
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        assert_eq!(notifier.presented().len(), 1);

        // Next slot for the same tag arms a fresh timer.
        clock.advance(chrono::Duration::milliseconds(1_500));
        channel.schedule(&req("a", now + 2_000)).unwrap();
        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert_eq!(notifier.presented().len(), 2);

        drop(channel);
        handle.await.unwrap();
    }
}
