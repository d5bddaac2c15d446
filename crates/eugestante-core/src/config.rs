use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 18790;
pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_RESYNC_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_CLEANUP_GRACE_MS: u64 = 1_000;
pub const DEFAULT_MAILBOX_CAPACITY: usize = 256;
pub const DEFAULT_AUTO_CLOSE_SECS: u64 = 5;
pub const REMINDERS_ROUTE: &str = "/my-notes";
pub const APP_ICON: &str = "/euGestante-logo.png";

/// Top-level config (eugestante.toml + EUGESTANTE_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EuGestanteConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub account: AccountConfig,
    #[serde(default)]
    pub reminders: RemindersConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// The account whose medications this process schedules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    #[serde(default = "default_user_id")]
    pub user_id: String,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            user_id: default_user_id(),
        }
    }
}

/// Reminder scheduling tunables.
///
/// The resync interval and cleanup grace are empirical; neither is
/// load-bearing for correctness, only for jitter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemindersConfig {
    /// Full foreground resynchronisation cadence.
    #[serde(default = "default_resync_interval_secs")]
    pub resync_interval_secs: u64,
    /// How long after the expected fire time a pending tag is released.
    #[serde(default = "default_cleanup_grace_ms")]
    pub cleanup_grace_ms: u64,
    /// Worker mailbox depth.
    #[serde(default = "default_mailbox_capacity")]
    pub mailbox_capacity: usize,
    /// When false the worker is never spawned and every arm goes to the
    /// in-tab fallback.
    #[serde(default = "bool_true")]
    pub worker_enabled: bool,
    #[serde(default = "default_navigation_route")]
    pub navigation_route: String,
    #[serde(default = "default_app_origin")]
    pub app_origin: String,
    #[serde(default = "default_icon")]
    pub icon: String,
    /// In-tab fallback notifications close after this many seconds.
    #[serde(default = "default_auto_close_secs")]
    pub auto_close_secs: u64,
}

impl Default for RemindersConfig {
    fn default() -> Self {
        Self {
            resync_interval_secs: DEFAULT_RESYNC_INTERVAL_SECS,
            cleanup_grace_ms: DEFAULT_CLEANUP_GRACE_MS,
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            worker_enabled: true,
            navigation_route: default_navigation_route(),
            app_origin: default_app_origin(),
            icon: default_icon(),
            auto_close_secs: DEFAULT_AUTO_CLOSE_SECS,
        }
    }
}

impl RemindersConfig {
    pub fn resync_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.resync_interval_secs.max(1))
    }

    pub fn cleanup_grace(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.cleanup_grace_ms as i64)
    }

    pub fn auto_close(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.auto_close_secs)
    }
}

fn bool_true() -> bool {
    true
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_user_id() -> String {
    "local".to_string()
}
fn default_resync_interval_secs() -> u64 {
    DEFAULT_RESYNC_INTERVAL_SECS
}
fn default_cleanup_grace_ms() -> u64 {
    DEFAULT_CLEANUP_GRACE_MS
}
fn default_mailbox_capacity() -> usize {
    DEFAULT_MAILBOX_CAPACITY
}
fn default_navigation_route() -> String {
    REMINDERS_ROUTE.to_string()
}
fn default_app_origin() -> String {
    "/".to_string()
}
fn default_icon() -> String {
    APP_ICON.to_string()
}
fn default_auto_close_secs() -> u64 {
    DEFAULT_AUTO_CLOSE_SECS
}
fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.eugestante/eugestante.db", home)
}

impl EuGestanteConfig {
    /// Load config from a TOML file with EUGESTANTE_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.eugestante/eugestante.toml
    ///
    /// A missing file is not an error; every field has a default.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);
        if std::path::Path::new(&path).exists() {
            tracing::debug!(path = %path, "loading config");
        } else {
            tracing::warn!(path = %path, "config file not found, using defaults");
        }

        Self::figment(&path)
            .extract()
            .map_err(|e| crate::error::EuGestanteError::Config(e.to_string()))
    }

    fn figment(path: &str) -> Figment {
        Figment::from(Serialized::defaults(EuGestanteConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("EUGESTANTE_").split("__"))
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.eugestante/eugestante.toml", home)
}
