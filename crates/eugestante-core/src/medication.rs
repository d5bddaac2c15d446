use serde::{Deserialize, Serialize};

use crate::{
    error::{EuGestanteError, Result},
    tag::NotificationTag,
    time::TimeOfDay,
    types::{MedicationId, UserId},
};

/// A medication the user takes at fixed times every day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medication {
    pub id: MedicationId,
    pub user_id: UserId,
    pub name: String,
    /// Sorted ascending, no duplicates.
    pub times: Vec<TimeOfDay>,
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Medication {
    /// Tag for each daily slot of this medication.
    pub fn tags(&self) -> impl Iterator<Item = (TimeOfDay, NotificationTag)> + '_ {
        self.times
            .iter()
            .map(move |t| (*t, NotificationTag::new(&self.id, *t)))
    }

    pub fn reminder_title(&self) -> String {
        format!("Hora de tomar: {}", self.name)
    }

    pub fn reminder_body(&self, time: TimeOfDay) -> String {
        match self.notes.as_deref() {
            Some(notes) => format!("Lembrete: {} às {} - {}", self.name, time, notes),
            None => format!("Lembrete: {} às {}", self.name, time),
        }
    }
}

/// Payload for creating a medication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMedication {
    pub name: String,
    pub times: Vec<TimeOfDay>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_active() -> bool {
    true
}

impl NewMedication {
    /// Trim, deduplicate and check the fields a medication must carry.
    pub fn validated(self) -> Result<Self> {
        Ok(Self {
            name: validate_name(&self.name)?,
            times: normalize_times(self.times)?,
            active: self.active,
            notes: normalize_notes(self.notes),
        })
    }
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MedicationUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub times: Option<Vec<TimeOfDay>>,
    #[serde(default)]
    pub active: Option<bool>,
    /// `Some("")` clears the note.
    #[serde(default)]
    pub notes: Option<String>,
}

impl MedicationUpdate {
    /// Apply the update onto `current`, validating the changed fields.
    pub fn apply(self, current: &Medication) -> Result<Medication> {
        let mut next = current.clone();
        if let Some(name) = self.name {
            next.name = validate_name(&name)?;
        }
        if let Some(times) = self.times {
            next.times = normalize_times(times)?;
        }
        if let Some(active) = self.active {
            next.active = active;
        }
        if let Some(notes) = self.notes {
            next.notes = normalize_notes(Some(notes));
        }
        Ok(next)
    }
}

fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(EuGestanteError::InvalidMedication(
            "name must not be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

/// Sort and deduplicate; at least one time is required.
pub fn normalize_times(mut times: Vec<TimeOfDay>) -> Result<Vec<TimeOfDay>> {
    times.sort();
    times.dedup();
    if times.is_empty() {
        return Err(EuGestanteError::InvalidMedication(
            "at least one time is required".to_string(),
        ));
    }
    Ok(times)
}

fn normalize_notes(notes: Option<String>) -> Option<String> {
    notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
}
