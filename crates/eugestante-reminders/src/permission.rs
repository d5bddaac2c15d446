use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use eugestante_core::permission::{Banner, PermissionState};
use tokio::sync::watch;
use tracing::info;

/// Asks the user for notification consent.
#[async_trait]
pub trait PermissionPrompt: Send + Sync {
    /// `None` when the prompt closed without an answer.
    async fn ask(&self) -> Option<PermissionState>;
}

/// Prompt that always answers the same way.
#[derive(Debug, Clone, Copy)]
pub struct StaticPrompt(pub PermissionState);

#[async_trait]
impl PermissionPrompt for StaticPrompt {
    async fn ask(&self) -> Option<PermissionState> {
        Some(self.0)
    }
}

/// Current notification permission, published to the foreground scheduler.
///
/// Only explicit user consent changes the state; the worker never sees it.
pub struct PermissionGate {
    tx: watch::Sender<PermissionState>,
    request_dismissed: AtomicBool,
}

impl PermissionGate {
    pub fn new(initial: PermissionState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self {
            tx,
            request_dismissed: AtomicBool::new(false),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<PermissionState> {
        self.tx.subscribe()
    }

    pub fn state(&self) -> PermissionState {
        *self.tx.borrow()
    }

    /// Record a state reported by the host (e.g. the browser's answer).
    pub fn set(&self, state: PermissionState) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
        if changed {
            info!(%state, "notification permission changed");
        }
    }

    /// Ask only when undecided; a decided state is returned as-is.
    pub async fn request(&self, prompt: &dyn PermissionPrompt) -> PermissionState {
        match self.state() {
            PermissionState::Default => self.ask(prompt).await,
            decided => decided,
        }
    }

    /// The banner's retry action: ask again even after a denial.
    pub async fn retry(&self, prompt: &dyn PermissionPrompt) -> PermissionState {
        self.ask(prompt).await
    }

    async fn ask(&self, prompt: &dyn PermissionPrompt) -> PermissionState {
        match prompt.ask().await {
            Some(answer) => {
                self.set(answer);
                answer
            }
            None => self.state(),
        }
    }

    /// Hide the one-time request banner. A `Blocked` banner stays.
    pub fn dismiss_banner(&self) {
        self.request_dismissed.store(true, Ordering::Relaxed);
    }

    pub fn banner(&self) -> Banner {
        match self.state().banner() {
            Banner::RequestPermission if self.request_dismissed.load(Ordering::Relaxed) => {
                Banner::None
            }
            other => other,
        }
    }
}
