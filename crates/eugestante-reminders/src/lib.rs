//! `eugestante-reminders`: daily medication reminders delivered by two
//! cooperating actors.
//!
//! # Overview
//!
//! The [`foreground::ForegroundScheduler`] turns every (active medication,
//! time of day) pair into the next absolute fire instant and posts it to the
//! [`worker::DeliveryWorker`] over an mpsc mailbox. The worker owns its own
//! timer table keyed by [`NotificationTag`](eugestante_core::NotificationTag)
//! and presents the notification when a timer expires.
//!
//! The channel is fire-and-forget. Correctness rests on tags being
//! deterministic: a duplicate schedule supersedes, a lost one is re-sent on
//! the next resync pass.
//!
//! | Piece                         | Owns                                     |
//! |-------------------------------|------------------------------------------|
//! | [`ForegroundScheduler`]       | pending-tag table, resync cadence        |
//! | [`DeliveryWorker`]            | armed timers, notification presentation  |
//! | [`FallbackChannel`]           | worker-or-in-tab routing                 |
//! | [`PermissionGate`]            | notification permission and banner       |

pub mod channel;
pub mod error;
pub mod fallback;
pub mod foreground;
pub mod notifier;
pub mod permission;
pub mod schedule;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use channel::{DeliveryChannel, WorkerChannel};
pub use error::{ChannelError, Result};
pub use fallback::{FallbackChannel, InTabFallback};
pub use foreground::{ForegroundScheduler, PendingReminder, SyncReport};
pub use notifier::{Notifier, Presentation};
pub use permission::{PermissionGate, PermissionPrompt, StaticPrompt};
pub use schedule::next_fire_instant;
pub use worker::{spawn_worker, ArmOutcome, DeliveryWorker};
