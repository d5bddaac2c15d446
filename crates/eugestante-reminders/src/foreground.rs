use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use eugestante_core::{
    config::RemindersConfig,
    medication::Medication,
    message::ScheduleNotification,
    permission::PermissionState,
    tag::NotificationTag,
    time::Clock,
};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::{channel::DeliveryChannel, schedule::next_fire_instant};

/// A reminder handed to the delivery channel and not yet released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReminder {
    pub fire_at: DateTime<Local>,
    /// After this instant the tag is forgotten so the next pass re-arms it
    /// for the following day.
    pub release_at: DateTime<Local>,
    pub title: String,
    pub body: String,
}

/// Counts from one synchronize pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub armed: usize,
    /// Already pending; left alone.
    pub skipped: usize,
    pub failed: usize,
    /// Pending entries released because their slot has passed.
    pub released: usize,
}

/// Keeps exactly one reminder armed per (active medication, time of day).
///
/// Owns the pending-tag table for its whole lifetime. The table is the
/// idempotence guard: a tag already pending is never re-sent by
/// [`synchronize`](Self::synchronize), and is released `cleanup_grace` after
/// its fire instant so the following day's slot can be armed.
pub struct ForegroundScheduler<C> {
    channel: C,
    clock: Arc<dyn Clock>,
    cleanup_grace: chrono::Duration,
    resync_interval: Duration,
    pending: HashMap<NotificationTag, PendingReminder>,
}

impl<C: DeliveryChannel> ForegroundScheduler<C> {
    pub fn new(channel: C, clock: Arc<dyn Clock>, cfg: &RemindersConfig) -> Self {
        Self {
            channel,
            clock,
            cleanup_grace: cfg.cleanup_grace(),
            resync_interval: cfg.resync_interval(),
            pending: HashMap::new(),
        }
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn pending(&self) -> &HashMap<NotificationTag, PendingReminder> {
        &self.pending
    }

    pub fn is_pending(&self, tag: &NotificationTag) -> bool {
        self.pending.contains_key(tag)
    }

    /// One full pass over `medications`.
    pub fn synchronize(&mut self, medications: &[Medication]) -> SyncReport {
        let now = self.clock.now();
        let mut report = SyncReport {
            released: self.release_elapsed(now),
            ..Default::default()
        };

        for med in medications.iter().filter(|m| m.active) {
            for (time, tag) in med.tags() {
                if self.pending.contains_key(&tag) {
                    report.skipped += 1;
                    continue;
                }

                let Some(fire_at) = next_fire_instant(time, &now) else {
                    warn!(%tag, "no valid local instant for reminder slot");
                    report.failed += 1;
                    continue;
                };

                let msg = ScheduleNotification {
                    title: med.reminder_title(),
                    body: med.reminder_body(time),
                    tag: tag.clone(),
                    scheduled_time: fire_at.timestamp_millis(),
                };
                match self.channel.schedule(&msg) {
                    Ok(()) => {
                        debug!(%tag, fire_at = %fire_at, "reminder scheduled");
                        self.pending.insert(
                            tag,
                            PendingReminder {
                                fire_at,
                                release_at: fire_at + self.cleanup_grace,
                                title: msg.title,
                                body: msg.body,
                            },
                        );
                        report.armed += 1;
                    }
                    Err(e) => {
                        warn!(%tag, error = %e, "failed to schedule reminder");
                        report.failed += 1;
                    }
                }
            }
        }

        if report.armed > 0 || report.failed > 0 {
            info!(
                armed = report.armed,
                skipped = report.skipped,
                failed = report.failed,
                released = report.released,
                "reminders synchronized"
            );
        }
        report
    }

    /// Forget pending entries whose slot (plus grace) has passed.
    fn release_elapsed(&mut self, now: DateTime<Local>) -> usize {
        let before = self.pending.len();
        self.pending.retain(|_, p| p.release_at > now);
        before - self.pending.len()
    }

    /// The medication set changed: cancel what is no longer wanted, then
    /// synchronize.
    ///
    /// A pending tag is cancelled when its medication was deleted or
    /// deactivated, its time was removed, or its title/body changed (the
    /// re-arm in the following pass carries the new text). Tags that already
    /// fired and were released need no cancel.
    pub fn apply_change(&mut self, medications: &[Medication]) -> SyncReport {
        let released = self.release_elapsed(self.clock.now());

        let desired: HashMap<NotificationTag, (String, String)> = medications
            .iter()
            .filter(|m| m.active)
            .flat_map(|m| {
                m.tags()
                    .map(move |(time, tag)| (tag, (m.reminder_title(), m.reminder_body(time))))
            })
            .collect();

        let stale: Vec<NotificationTag> = self
            .pending
            .iter()
            .filter(|(tag, p)| match desired.get(*tag) {
                Some((title, body)) => *title != p.title || *body != p.body,
                None => true,
            })
            .map(|(tag, _)| tag.clone())
            .collect();

        for tag in stale {
            self.pending.remove(&tag);
            if let Err(e) = self.channel.cancel(&tag) {
                debug!(%tag, error = %e, "cancel not delivered");
            }
        }

        let mut report = self.synchronize(medications);
        report.released += released;
        report
    }

    /// Cancel every pending reminder and forget them all.
    pub fn teardown(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        info!(count = self.pending.len(), "tearing down pending reminders");
        for (tag, _) in self.pending.drain() {
            if let Err(e) = self.channel.cancel(&tag) {
                debug!(%tag, error = %e, "cancel not delivered");
            }
        }
    }

    /// Drive the scheduler until `shutdown` flips or a sender goes away.
    ///
    /// Synchronizes immediately when the medication set changes and on every
    /// resync tick, but only while permission is granted and at least one
    /// medication is active. Losing permission tears everything down; so does
    /// leaving the loop.
    pub async fn run(
        mut self,
        mut medications: watch::Receiver<Vec<Medication>>,
        mut permission: watch::Receiver<PermissionState>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!(interval_secs = self.resync_interval.as_secs(), "foreground scheduler started");
        let mut ticker = tokio::time::interval(self.resync_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let granted = permission.borrow().is_granted();
                    let meds = medications.borrow().clone();
                    if granted && meds.iter().any(|m| m.active) {
                        self.synchronize(&meds);
                    }
                }
                res = medications.changed() => {
                    if res.is_err() {
                        break;
                    }
                    let meds = medications.borrow_and_update().clone();
                    if permission.borrow().is_granted() {
                        self.apply_change(&meds);
                        ticker.reset();
                    }
                }
                res = permission.changed() => {
                    if res.is_err() {
                        break;
                    }
                    let state = *permission.borrow_and_update();
                    if state.is_granted() {
                        let meds = medications.borrow().clone();
                        self.apply_change(&meds);
                        ticker.reset();
                    } else {
                        info!(%state, "notification permission not granted; reminders off");
                        self.teardown();
                    }
                }
                res = shutdown.changed() => {
                    if res.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        self.teardown();
        info!("foreground scheduler stopped");
    }
}
