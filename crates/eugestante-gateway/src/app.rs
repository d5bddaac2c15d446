use axum::{
    routing::{get, patch, post, put},
    Router,
};
use eugestante_core::{config::EuGestanteConfig, medication::Medication, types::UserId};
use eugestante_medications::MedicationStore;
use eugestante_reminders::{PermissionGate, Presentation};
use std::sync::{atomic::AtomicBool, Arc};
use tokio::sync::{watch, Mutex};
use tracing::info;

use crate::center::NotificationCenter;
use crate::error::ApiError;
use crate::prompt::HostPrompt;

/// Shared state, passed as `Arc<AppState>` to every handler.
pub struct AppState {
    pub config: EuGestanteConfig,
    pub user_id: UserId,
    pub store: MedicationStore,
    /// Active medications, watched by the foreground scheduler.
    pub medications: watch::Sender<Vec<Medication>>,
    /// Held across a store mutation and its publish so sets go out in order.
    mutation: Mutex<()>,
    pub permission: Arc<PermissionGate>,
    pub prompt: Arc<HostPrompt>,
    pub notifications: Arc<NotificationCenter>,
    pub presentation: Presentation,
    /// Whether the app is in the foreground; gates in-tab fallback reminders.
    pub visible: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(
        config: EuGestanteConfig,
        store: MedicationStore,
        medications: watch::Sender<Vec<Medication>>,
        permission: Arc<PermissionGate>,
        prompt: Arc<HostPrompt>,
        notifications: Arc<NotificationCenter>,
        visible: Arc<AtomicBool>,
    ) -> Self {
        Self {
            user_id: UserId::from(config.account.user_id.clone()),
            presentation: Presentation::from_config(&config.reminders),
            config,
            store,
            medications,
            mutation: Mutex::new(()),
            permission,
            prompt,
            notifications,
            visible,
        }
    }

    /// Run a store mutation, then push the resulting active set to the
    /// scheduler before any other mutation can start.
    pub async fn mutate<T>(
        &self,
        f: impl FnOnce(&MedicationStore) -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        let _guard = self.mutation.lock().await;
        let out = f(&self.store)?;
        let active = self.store.list_active(&self.user_id)?;
        self.medications.send_replace(active);
        Ok(out)
    }

    /// Start a permission prompt in the background unless one is already
    /// waiting. `retry` asks again even after a denial.
    pub fn prompt_permission(&self, retry: bool) {
        if self.prompt.is_pending() {
            return;
        }
        let gate = Arc::clone(&self.permission);
        let prompt = Arc::clone(&self.prompt);
        tokio::spawn(async move {
            let state = if retry {
                gate.retry(prompt.as_ref()).await
            } else {
                gate.request(prompt.as_ref()).await
            };
            info!(%state, retry, "permission prompt finished");
        });
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    use crate::http::{health, medications, notifications, permission};

    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/medications",
            get(medications::list).post(medications::create),
        )
        .route(
            "/medications/{id}",
            patch(medications::update).delete(medications::remove),
        )
        .route("/medications/{id}/toggle", post(medications::toggle))
        .route("/notifications", get(notifications::poll))
        .route("/notifications/{tag}/click", post(notifications::click))
        .route(
            "/permission",
            get(permission::show).put(permission::record),
        )
        .route("/permission/request", post(permission::request))
        .route("/permission/retry", post(permission::retry))
        .route("/permission/dismiss", post(permission::dismiss))
        .route("/visibility", put(permission::visibility))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use eugestante_core::{NewMedication, PermissionState, TimeOfDay};
    use eugestante_reminders::Notifier;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct Harness {
        state: Arc<AppState>,
        medications: watch::Receiver<Vec<Medication>>,
    }

    fn harness() -> Harness {
        let config = EuGestanteConfig::default();
        let store =
            MedicationStore::new(rusqlite::Connection::open_in_memory().unwrap()).unwrap();
        let (tx, rx) = watch::channel(Vec::new());
        let state = Arc::new(AppState::new(
            config,
            store,
            tx,
            Arc::new(PermissionGate::new(PermissionState::Default)),
            Arc::new(HostPrompt::new()),
            Arc::new(NotificationCenter::new()),
            Arc::new(AtomicBool::new(true)),
        ));
        Harness {
            state,
            medications: rx,
        }
    }

    async fn call(
        state: &Arc<AppState>,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(v) => builder
                .header("content-type", "application/json")
                .body(Body::from(v.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let resp = build_router(state.clone()).oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn folic_acid() -> Value {
        json!({ "name": "Ácido Fólico", "times": ["09:00"], "notes": "Com água" })
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let h = harness();
        let (status, body) = call(&h.state, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["permission"], "default");
    }

    #[tokio::test]
    async fn create_publishes_active_set() {
        let h = harness();
        let (status, body) = call(&h.state, "POST", "/medications", Some(folic_acid())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["name"], "Ácido Fólico");
        assert_eq!(body["active"], true);

        let active = h.medications.borrow().clone();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].times, vec![TimeOfDay::new(9, 0).unwrap()]);

        let (_, list) = call(&h.state, "GET", "/medications", None).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_times_are_rejected() {
        let h = harness();
        let (status, body) = call(
            &h.state,
            "POST",
            "/medications",
            Some(json!({ "name": "Ferro", "times": [] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_MEDICATION");
        assert!(h.medications.borrow().is_empty());
    }

    #[tokio::test]
    async fn toggle_removes_from_active_set() {
        let h = harness();
        let (_, created) = call(&h.state, "POST", "/medications", Some(folic_acid())).await;
        let id = created["id"].as_str().unwrap().to_string();

        let (status, body) =
            call(&h.state, "POST", &format!("/medications/{id}/toggle"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["active"], false);
        assert!(h.medications.borrow().is_empty());
    }

    #[tokio::test]
    async fn patch_changes_times() {
        let h = harness();
        let (_, created) = call(&h.state, "POST", "/medications", Some(folic_acid())).await;
        let id = created["id"].as_str().unwrap().to_string();

        let (status, body) = call(
            &h.state,
            "PATCH",
            &format!("/medications/{id}"),
            Some(json!({ "times": ["21:00", "08:00"] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["times"], json!(["08:00", "21:00"]));
        assert_eq!(h.medications.borrow()[0].times.len(), 2);
    }

    #[tokio::test]
    async fn delete_then_missing() {
        let h = harness();
        let (_, created) = call(&h.state, "POST", "/medications", Some(folic_acid())).await;
        let id = created["id"].as_str().unwrap().to_string();

        let (status, _) = call(&h.state, "DELETE", &format!("/medications/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(h.medications.borrow().is_empty());

        let (status, body) = call(&h.state, "DELETE", &format!("/medications/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "MEDICATION_NOT_FOUND");
    }

    #[tokio::test]
    async fn other_accounts_medication_is_hidden() {
        let h = harness();
        let theirs = h
            .state
            .store
            .save(
                &UserId::from("someone-else"),
                NewMedication {
                    name: "Ferro".to_string(),
                    times: vec![TimeOfDay::new(12, 0).unwrap()],
                    active: true,
                    notes: None,
                },
            )
            .unwrap();

        let (status, _) = call(
            &h.state,
            "POST",
            &format!("/medications/{}/toggle", theirs.id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(h.state.store.get(&theirs.id).unwrap().active);

        let (_, list) = call(&h.state, "GET", "/medications", None).await;
        assert!(list.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn permission_report_and_banner() {
        let h = harness();
        let (_, body) = call(&h.state, "GET", "/permission", None).await;
        assert_eq!(body["state"], "default");
        assert_eq!(body["banner"]["kind"], "request_permission");

        let (_, body) = call(&h.state, "POST", "/permission/dismiss", None).await;
        assert_eq!(body["banner"]["kind"], "none");

        let (status, body) = call(
            &h.state,
            "PUT",
            "/permission",
            Some(json!({ "state": "denied" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["banner"], json!({ "kind": "blocked", "retry": true }));
        assert_eq!(h.state.permission.state(), PermissionState::Denied);
    }

    #[tokio::test]
    async fn click_focuses_open_window() {
        let h = harness();
        let (status, body) = call(
            &h.state,
            "POST",
            "/notifications/medication-abc-09:00/click",
            Some(json!({ "windows": [{ "id": "w1", "url": "/dashboard" }] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "action": "focus", "window_id": "w1", "navigate_to": "/my-notes" })
        );
    }

    #[tokio::test]
    async fn click_without_windows_opens_one() {
        let h = harness();
        let (_, body) = call(
            &h.state,
            "POST",
            "/notifications/medication-abc-09:00/click",
            None,
        )
        .await;
        assert_eq!(body, json!({ "action": "open", "url": "/my-notes" }));
    }

    #[tokio::test]
    async fn poll_drains_presented_notifications() {
        let h = harness();
        let n = h.state.presentation.notification(
            "Hora de tomar: Ácido Fólico".to_string(),
            "Lembrete: Ácido Fólico às 09:00".to_string(),
            "medication-abc-09:00".into(),
            1_700_000_000_000,
        );
        h.state.notifications.present(n);

        let (_, body) = call(&h.state, "GET", "/notifications", None).await;
        let list = body["notifications"].as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["tag"], "medication-abc-09:00");
        assert_eq!(list[0]["data"]["url"], "/my-notes");

        let (_, body) = call(&h.state, "GET", "/notifications", None).await;
        assert!(body["notifications"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn visibility_report_updates_flag() {
        let h = harness();
        let (status, _) = call(
            &h.state,
            "PUT",
            "/visibility",
            Some(json!({ "visible": false })),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(!h.state.visible.load(std::sync::atomic::Ordering::Relaxed));
    }

    async fn settle(mut done: impl FnMut() -> bool) {
        for _ in 0..100 {
            if done() {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("condition never reached");
    }

    #[tokio::test]
    async fn request_parks_prompt_until_answered() {
        let h = harness();
        let (status, _) = call(&h.state, "POST", "/permission/request", None).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        settle(|| h.state.prompt.is_pending()).await;

        let (_, body) = call(&h.state, "GET", "/permission", None).await;
        assert_eq!(body["prompt_pending"], true);

        let (_, body) = call(
            &h.state,
            "PUT",
            "/permission",
            Some(json!({ "state": "granted" })),
        )
        .await;
        assert_eq!(body["state"], "granted");
        assert_eq!(body["banner"]["kind"], "none");
        assert_eq!(body["prompt_pending"], false);
    }

    #[tokio::test]
    async fn request_is_skipped_once_decided() {
        let h = harness();
        h.state.permission.set(PermissionState::Denied);
        let (status, body) = call(&h.state, "POST", "/permission/request", None).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["prompt_pending"], false);
        tokio::task::yield_now().await;
        assert!(!h.state.prompt.is_pending());
    }

    #[tokio::test]
    async fn retry_reasks_after_denial() {
        let h = harness();
        h.state.permission.set(PermissionState::Denied);
        let mut permission = h.state.permission.subscribe();

        call(&h.state, "POST", "/permission/retry", None).await;
        settle(|| h.state.prompt.is_pending()).await;
        assert!(h.state.prompt.answer(PermissionState::Granted));

        permission.changed().await.unwrap();
        assert_eq!(*permission.borrow(), PermissionState::Granted);
        let (_, body) = call(&h.state, "GET", "/permission", None).await;
        assert_eq!(body["banner"]["kind"], "none");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_mutations_publish_the_final_set() {
        let h = harness();
        let mut ids = Vec::new();
        for _ in 0..8 {
            let (_, created) = call(&h.state, "POST", "/medications", Some(folic_acid())).await;
            ids.push(created["id"].as_str().unwrap().to_string());
        }

        let mut tasks = Vec::new();
        for (i, id) in ids.into_iter().enumerate() {
            let state = h.state.clone();
            tasks.push(tokio::spawn(async move {
                let uri = if i % 2 == 0 {
                    format!("/medications/{id}")
                } else {
                    format!("/medications/{id}/toggle")
                };
                let method = if i % 2 == 0 { "DELETE" } else { "POST" };
                call(&state, method, &uri, None).await
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let stored = h.state.store.list_active(&h.state.user_id).unwrap();
        assert!(stored.is_empty());
        assert_eq!(*h.medications.borrow(), stored);
    }
}
