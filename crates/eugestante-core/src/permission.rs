use serde::{Deserialize, Serialize};
use std::fmt;

/// Notification permission as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    Granted,
    Denied,
    /// Not asked yet.
    #[default]
    Default,
}

impl PermissionState {
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionState::Granted)
    }

    /// Banner to show for this state.
    pub fn banner(&self) -> Banner {
        match self {
            PermissionState::Granted => Banner::None,
            PermissionState::Default => Banner::RequestPermission,
            PermissionState::Denied => Banner::Blocked { retry: true },
        }
    }
}

impl fmt::Display for PermissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PermissionState::Granted => "granted",
            PermissionState::Denied => "denied",
            PermissionState::Default => "default",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for PermissionState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "granted" => Ok(PermissionState::Granted),
            "denied" => Ok(PermissionState::Denied),
            "default" => Ok(PermissionState::Default),
            other => Err(format!("unknown permission state: {other}")),
        }
    }
}

/// User-visible prompt tied to the permission state.
///
/// `RequestPermission` is dismissible and shown once; `Blocked` stays until
/// the user retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Banner {
    None,
    RequestPermission,
    Blocked { retry: bool },
}
