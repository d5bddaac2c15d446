//! `eugestante-core`: types shared by the medication store, the reminder
//! actors and the gateway.

pub mod config;
pub mod error;
pub mod medication;
pub mod message;
pub mod notification;
pub mod permission;
pub mod tag;
pub mod time;
pub mod types;

pub use error::{EuGestanteError, Result};
pub use medication::{Medication, MedicationUpdate, NewMedication};
pub use message::{CancelNotification, ScheduleNotification, WorkerMessage};
pub use notification::{ClientWindow, InteractionOutcome, PresentedNotification};
pub use permission::{Banner, PermissionState};
pub use tag::NotificationTag;
pub use time::{Clock, FixedClock, SystemClock, TimeOfDay};
pub use types::{MedicationId, UserId};
