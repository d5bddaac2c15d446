use thiserror::Error;

/// Why a message could not be handed to a delivery channel.
///
/// All of these are recoverable: the foreground scheduler logs them and
/// either falls back to in-tab timers or retries on the next resync pass.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// The worker is not running (mailbox closed, never spawned).
    #[error("delivery worker unavailable")]
    Unavailable,

    /// The mailbox is full; the message was not queued.
    #[error("delivery worker mailbox full")]
    Backpressure,

    /// The in-tab fallback could not arm a timer.
    #[error("fallback timer failed: {0}")]
    Fallback(String),
}

pub type Result<T> = std::result::Result<T, ChannelError>;
