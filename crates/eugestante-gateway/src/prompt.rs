//! Permission prompt answered by the client over HTTP.
//!
//! `ask` parks until the client reports the user's choice through
//! `PUT /permission`. While parked, `GET /permission` shows
//! `prompt_pending: true` so the client knows to show the browser dialog.

use std::sync::Mutex;

use async_trait::async_trait;
use eugestante_core::PermissionState;
use eugestante_reminders::PermissionPrompt;
use tokio::sync::oneshot;
use tracing::debug;

#[derive(Default)]
pub struct HostPrompt {
    pending: Mutex<Option<oneshot::Sender<PermissionState>>>,
}

impl HostPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .map(|p| p.as_ref().is_some_and(|tx| !tx.is_closed()))
            .unwrap_or(false)
    }

    /// Hand the user's answer to a parked prompt. Returns false if none waits.
    pub fn answer(&self, state: PermissionState) -> bool {
        let tx = match self.pending.lock() {
            Ok(mut p) => p.take(),
            Err(_) => None,
        };
        match tx {
            Some(tx) => tx.send(state).is_ok(),
            None => false,
        }
    }
}

#[async_trait]
impl PermissionPrompt for HostPrompt {
    async fn ask(&self) -> Option<PermissionState> {
        let (tx, rx) = oneshot::channel();
        match self.pending.lock() {
            // A newer prompt replaces the old one; the old ask resolves to None.
            Ok(mut p) => *p = Some(tx),
            Err(_) => return None,
        }
        debug!("waiting for the client to answer the permission prompt");
        rx.await.ok()
    }
}
