pub mod health;
pub mod medications;
pub mod notifications;
pub mod permission;
