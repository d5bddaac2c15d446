use clap::Parser;
use eugestante_core::{
    config::EuGestanteConfig,
    time::{Clock, SystemClock},
    PermissionState, UserId,
};
use eugestante_medications::MedicationStore;
use eugestante_reminders::{
    spawn_worker, DeliveryWorker, FallbackChannel, ForegroundScheduler, InTabFallback,
    Notifier, PermissionGate, Presentation,
};
use std::net::SocketAddr;
use std::sync::{atomic::AtomicBool, Arc};
use tracing::info;

mod app;
mod center;
mod error;
mod http;
mod prompt;

#[derive(Debug, Parser)]
#[command(name = "eugestante-gateway", version, about = "Medication reminder gateway")]
struct Args {
    /// Path to eugestante.toml (defaults to ~/.eugestante/eugestante.toml).
    #[arg(long)]
    config: Option<String>,

    /// Override gateway.bind.
    #[arg(long)]
    bind: Option<String>,

    /// Override gateway.port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "eugestante_gateway=info,eugestante_reminders=info,tower_http=debug".into()
            }),
        )
        .init();

    let args = Args::parse();
    // explicit --config > EUGESTANTE_CONFIG env > ~/.eugestante/eugestante.toml
    let config_path = args
        .config
        .clone()
        .or_else(|| std::env::var("EUGESTANTE_CONFIG").ok());
    let mut config = EuGestanteConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        EuGestanteConfig::default()
    });
    if let Some(bind) = args.bind {
        config.gateway.bind = bind;
    }
    if let Some(port) = args.port {
        config.gateway.port = port;
    }

    let db_path = config.database.path.clone();
    ensure_parent_dir(&db_path);
    info!(path = %db_path, "opening SQLite database");

    let db = rusqlite::Connection::open(&db_path)?;
    db.execute_batch("PRAGMA journal_mode=WAL;")?;
    let store = MedicationStore::new(db)?;
    info!("database migrations complete");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let notifications = Arc::new(center::NotificationCenter::new());
    let notifier: Arc<dyn Notifier> = notifications.clone();
    let presentation = Presentation::from_config(&config.reminders);
    let visible = Arc::new(AtomicBool::new(true));
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    // Delivery worker: owns the timers once a reminder is handed over.
    let (primary, worker_task) = if config.reminders.worker_enabled {
        let delivery = DeliveryWorker::new(clock.clone(), notifier.clone(), presentation.clone());
        let (channel, handle) = spawn_worker(
            delivery,
            config.reminders.mailbox_capacity,
            shutdown_rx.clone(),
        );
        (Some(channel), Some(handle))
    } else {
        (None, None)
    };

    let fallback = InTabFallback::new(
        clock.clone(),
        notifier,
        presentation,
        visible.clone(),
        config.reminders.auto_close(),
    );
    let scheduler = ForegroundScheduler::new(
        FallbackChannel::new(primary, fallback),
        clock,
        &config.reminders,
    );

    let user_id = UserId::from(config.account.user_id.clone());
    let (medications_tx, medications_rx) =
        tokio::sync::watch::channel(store.list_active(&user_id)?);
    let permission = Arc::new(PermissionGate::new(PermissionState::Default));
    let permission_rx = permission.subscribe();

    let scheduler_task = tokio::spawn(scheduler.run(
        medications_rx,
        permission_rx,
        shutdown_rx,
    ));

    let addr: SocketAddr = format!("{}:{}", config.gateway.bind, config.gateway.port).parse()?;
    let state = Arc::new(app::AppState::new(
        config,
        store,
        medications_tx,
        permission,
        Arc::new(prompt::HostPrompt::new()),
        notifications,
        visible,
    ));
    // undecided on startup: ask right away
    if state.permission.state() == PermissionState::Default {
        state.prompt_permission(false);
    }
    let router = app::build_router(state);

    info!("euGestante gateway listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown requested");
        })
        .await?;

    // stop both actors; the scheduler cancels its pending reminders on exit
    let _ = shutdown_tx.send(true);
    let _ = scheduler_task.await;
    if let Some(handle) = worker_task {
        let _ = handle.await;
    }
    Ok(())
}

fn ensure_parent_dir(path: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            tracing::warn!(dir = %parent.display(), "Could not create database directory ({})", e);
        }
    }
}
