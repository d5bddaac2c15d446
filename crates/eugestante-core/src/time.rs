//! Wall-clock time of day (`HH:MM`) and the clock seam used by both actors.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EuGestanteError;

/// An hour:minute value with no date attached.
///
/// Serialised as the zero-padded `"HH:MM"` string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> Result<Self, EuGestanteError> {
        if hour > 23 || minute > 59 {
            return Err(EuGestanteError::InvalidTime(format!("{hour:02}:{minute:02}")));
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn to_naive(&self) -> NaiveTime {
        // Range is checked in `new`, so this never falls back.
        NaiveTime::from_hms_opt(self.hour as u32, self.minute as u32, 0).unwrap_or(NaiveTime::MIN)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = EuGestanteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EuGestanteError::InvalidTime(s.to_string());
        let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;
        if h.is_empty() || h.len() > 2 || m.len() != 2 {
            return Err(invalid());
        }
        let hour: u8 = h.parse().map_err(|_| invalid())?;
        let minute: u8 = m.parse().map_err(|_| invalid())?;
        Self::new(hour, minute).map_err(|_| invalid())
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = EuGestanteError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(t: TimeOfDay) -> Self {
        t.to_string()
    }
}

/// Source of "now" for the schedulers.
///
/// Production code uses [`SystemClock`]; tests pin the instant with
/// [`FixedClock`] so next-fire computations are deterministic.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;

    fn now_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock frozen at a given instant. `set` moves it.
#[derive(Debug)]
pub struct FixedClock {
    millis: std::sync::atomic::AtomicI64,
}

impl FixedClock {
    pub fn at(instant: DateTime<Local>) -> Self {
        Self {
            millis: std::sync::atomic::AtomicI64::new(instant.timestamp_millis()),
        }
    }

    pub fn set(&self, instant: DateTime<Local>) {
        self.millis
            .store(instant.timestamp_millis(), std::sync::atomic::Ordering::SeqCst);
    }

    pub fn advance(&self, by: chrono::Duration) {
        self.millis
            .fetch_add(by.num_milliseconds(), std::sync::atomic::Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        let millis = self.millis.load(std::sync::atomic::Ordering::SeqCst);
        Utc.timestamp_millis_opt(millis)
            .single()
            .unwrap_or_default()
            .with_timezone(&Local)
    }
}
