//! `eugestante-medications`: SQLite persistence for the medications a user
//! takes on a daily schedule.
//!
//! The store is the single source for the foreground reminder scheduler: after
//! every mutation the caller republishes [`MedicationStore::list_active`] so
//! pending reminders are re-derived.

pub mod db;
pub mod error;
pub mod store;

pub use error::{Result, StoreError};
pub use store::MedicationStore;
