use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use eugestante_core::{
    medication::{Medication, MedicationUpdate, NewMedication},
    time::TimeOfDay,
    types::{MedicationId, UserId},
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;

use crate::{
    db::init_db,
    error::{Result, StoreError},
};

const SELECT_COLUMNS: &str =
    "SELECT id, user_id, name, times, active, notes, created_at, updated_at FROM medications";

/// CRUD over the `medications` table.
///
/// Cheap to clone; clones share one connection.
#[derive(Clone)]
pub struct MedicationStore {
    conn: Arc<Mutex<Connection>>,
}

impl MedicationStore {
    pub fn new(conn: Connection) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Validate and insert a new medication for `user_id`.
    pub fn save(&self, user_id: &UserId, new: NewMedication) -> Result<Medication> {
        let new = new.validated()?;
        let now = Utc::now().to_rfc3339();
        let med = Medication {
            id: MedicationId::new(),
            user_id: user_id.clone(),
            name: new.name,
            times: new.times,
            active: new.active,
            notes: new.notes,
            created_at: now.clone(),
            updated_at: now,
        };

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO medications
             (id, user_id, name, times, active, notes, created_at, updated_at)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8)",
            params![
                med.id.as_str(),
                med.user_id.as_str(),
                med.name,
                encode_times(&med.times),
                med.active,
                med.notes,
                med.created_at,
                med.updated_at
            ],
        )?;
        info!(medication_id = %med.id, user_id = %med.user_id, name = %med.name, "medication saved");
        Ok(med)
    }

    pub fn get(&self, id: &MedicationId) -> Result<Medication> {
        let conn = self.lock()?;
        Self::get_locked(&conn, id)
    }

    fn get_locked(conn: &Connection, id: &MedicationId) -> Result<Medication> {
        let row = conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                [id.as_str()],
                raw_row,
            )
            .optional()?;
        match row {
            Some(raw) => raw.decode(),
            None => Err(StoreError::NotFound { id: id.to_string() }),
        }
    }

    /// Apply a partial update. Returns the stored result.
    pub fn update(&self, id: &MedicationId, update: MedicationUpdate) -> Result<Medication> {
        let conn = self.lock()?;
        Self::update_locked(&conn, id, |_| update)
    }

    /// Read, build the update from the current row, and write, all under one
    /// lock.
    fn update_locked(
        conn: &Connection,
        id: &MedicationId,
        build: impl FnOnce(&Medication) -> MedicationUpdate,
    ) -> Result<Medication> {
        let current = Self::get_locked(conn, id)?;
        let mut next = build(&current).apply(&current)?;
        next.updated_at = Utc::now().to_rfc3339();

        conn.execute(
            "UPDATE medications SET name=?1, times=?2, active=?3, notes=?4, updated_at=?5
             WHERE id=?6",
            params![
                next.name,
                encode_times(&next.times),
                next.active,
                next.notes,
                next.updated_at,
                id.as_str()
            ],
        )?;
        info!(medication_id = %id, active = next.active, "medication updated");
        Ok(next)
    }

    /// Flip the `active` flag.
    pub fn toggle_active(&self, id: &MedicationId) -> Result<Medication> {
        let conn = self.lock()?;
        Self::update_locked(&conn, id, |current| MedicationUpdate {
            active: Some(!current.active),
            ..Default::default()
        })
    }

    /// Delete by ID. Returns `NotFound` if no row is deleted.
    pub fn delete(&self, id: &MedicationId) -> Result<()> {
        let conn = self.lock()?;
        let n = conn.execute("DELETE FROM medications WHERE id = ?1", [id.as_str()])?;
        if n == 0 {
            return Err(StoreError::NotFound { id: id.to_string() });
        }
        info!(medication_id = %id, "medication deleted");
        Ok(())
    }

    /// All medications owned by `user_id`, oldest first.
    pub fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Medication>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(&format!(
            "{SELECT_COLUMNS} WHERE user_id = ?1 ORDER BY created_at, rowid"
        ))?;
        let rows: Vec<RawRow> = stmt
            .query_map([user_id.as_str()], raw_row)?
            .collect::<rusqlite::Result<_>>()?;
        rows.into_iter().map(RawRow::decode).collect()
    }

    /// Only the medications that should produce reminders.
    pub fn list_active(&self, user_id: &UserId) -> Result<Vec<Medication>> {
        Ok(self
            .list_for_user(user_id)?
            .into_iter()
            .filter(|m| m.active)
            .collect())
    }
}

struct RawRow {
    id: String,
    user_id: String,
    name: String,
    times: String,
    active: bool,
    notes: Option<String>,
    created_at: String,
    updated_at: String,
}

fn raw_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        times: row.get(3)?,
        active: row.get(4)?,
        notes: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

impl RawRow {
    fn decode(self) -> Result<Medication> {
        let times: Vec<TimeOfDay> =
            serde_json::from_str(&self.times).map_err(|e| StoreError::Corrupt {
                id: self.id.clone(),
                reason: e.to_string(),
            })?;
        Ok(Medication {
            id: MedicationId(self.id),
            user_id: UserId(self.user_id),
            name: self.name,
            times,
            active: self.active,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn encode_times(times: &[TimeOfDay]) -> String {
    let rendered: Vec<String> = times.iter().map(ToString::to_string).collect();
    serde_json::Value::from(rendered).to_string()
}
