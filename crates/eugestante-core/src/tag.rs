use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{time::TimeOfDay, types::MedicationId};

/// De-duplication and cancellation key for one (medication, time-of-day) slot.
///
/// Format: `medication-{medication_id}-{HH:MM}`. Both the foreground scheduler
/// and the delivery worker rely on the same inputs always producing the same
/// tag, since the message channel carries no acknowledgements.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationTag(String);

impl NotificationTag {
    pub fn new(medication_id: &MedicationId, time: TimeOfDay) -> Self {
        Self(format!("medication-{}-{}", medication_id, time))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NotificationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tags arriving over the wire are taken verbatim.
impl From<String> for NotificationTag {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for NotificationTag {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_inputs_same_tag() {
        let id = MedicationId::from("abc");
        let time: TimeOfDay = "08:00".parse().unwrap();
        assert_eq!(NotificationTag::new(&id, time), NotificationTag::new(&id, time));
        assert_eq!(NotificationTag::new(&id, time).as_str(), "medication-abc-08:00");
    }

    #[test]
    fn different_slots_different_tags() {
        let a = MedicationId::from("abc");
        let b = MedicationId::from("abd");
        let eight: TimeOfDay = "08:00".parse().unwrap();
        let twenty: TimeOfDay = "20:00".parse().unwrap();
        assert_ne!(NotificationTag::new(&a, eight), NotificationTag::new(&a, twenty));
        assert_ne!(NotificationTag::new(&a, eight), NotificationTag::new(&b, eight));
    }
}
