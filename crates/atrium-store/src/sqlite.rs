use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::Connection;
use tracing::info;
use uuid::Uuid;

use atrium_types::models::{Appointment, AppointmentStatus, NewAppointment};

use crate::RecordStore;

/// Durable backend: a single SQLite database behind a mutex.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;

        run_migrations(&conn)?;

        info!("Appointment database opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
        f(&conn)
    }
}

impl RecordStore for SqliteStore {
    fn create(&self, new: NewAppointment) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        // Fixed-width fractional seconds so lexicographic order in SQL is
        // chronological order.
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO appointments
                     (id, name, email, phone, preferred_country, consultation_type,
                      message, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                rusqlite::params![
                    id,
                    new.name,
                    new.email,
                    new.phone,
                    new.preferred_country,
                    new.consultation_type,
                    new.message,
                    AppointmentStatus::Pending.as_str(),
                    created_at,
                ],
            )?;
            Ok(())
        })?;

        Ok(id)
    }

    fn list(&self) -> Result<Vec<Appointment>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, email, phone, preferred_country, consultation_type,
                        message, status, appointment_date, appointment_time, created_at
                 FROM appointments
                 ORDER BY created_at DESC, rowid DESC",
            )?;

            let rows = stmt
                .query_map([], row_to_raw)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            rows.into_iter().map(hydrate).collect()
        })
    }

    fn confirm(&self, id: &str, date: NaiveDate, time: &str) -> Result<Option<Appointment>> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE appointments
                 SET status = ?2, appointment_date = ?3, appointment_time = ?4
                 WHERE id = ?1",
                rusqlite::params![
                    id,
                    AppointmentStatus::Confirmed.as_str(),
                    date.to_string(),
                    time,
                ],
            )?;
            if updated == 0 {
                return Ok(None);
            }

            let mut stmt = conn.prepare(
                "SELECT id, name, email, phone, preferred_country, consultation_type,
                        message, status, appointment_date, appointment_time, created_at
                 FROM appointments
                 WHERE id = ?1",
            )?;
            let raw = stmt.query_row([id], row_to_raw)?;
            Ok(Some(hydrate(raw)?))
        })
    }

    fn delete(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM appointments WHERE id = ?1", [id])?;
            Ok(deleted > 0)
        })
    }
}

/// Column values as SQLite hands them over, before parsing into domain types.
struct RawRow {
    id: String,
    name: String,
    email: String,
    phone: String,
    preferred_country: String,
    consultation_type: String,
    message: Option<String>,
    status: String,
    appointment_date: Option<String>,
    appointment_time: Option<String>,
    created_at: String,
}

fn row_to_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        preferred_country: row.get(4)?,
        consultation_type: row.get(5)?,
        message: row.get(6)?,
        status: row.get(7)?,
        appointment_date: row.get(8)?,
        appointment_time: row.get(9)?,
        created_at: row.get(10)?,
    })
}

fn hydrate(raw: RawRow) -> Result<Appointment> {
    let status: AppointmentStatus = raw
        .status
        .parse()
        .with_context(|| format!("appointment {}", raw.id))?;

    let appointment_date = raw
        .appointment_date
        .map(|d| d.parse::<NaiveDate>())
        .transpose()
        .with_context(|| format!("corrupt appointment_date on {}", raw.id))?;

    let created_at = DateTime::parse_from_rfc3339(&raw.created_at)
        .with_context(|| format!("corrupt created_at on {}", raw.id))?
        .with_timezone(&Utc);

    Ok(Appointment {
        id: raw.id,
        name: raw.name,
        email: raw.email,
        phone: raw.phone,
        preferred_country: raw.preferred_country,
        consultation_type: raw.consultation_type,
        message: raw.message,
        status,
        appointment_date,
        appointment_time: raw.appointment_time,
        created_at,
    })
}

fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| {
            r.get(0)
        })?;

    if version < 1 {
        info!("Appointment DB: running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE appointments (
                id                TEXT PRIMARY KEY,
                name              TEXT NOT NULL,
                email             TEXT NOT NULL,
                phone             TEXT NOT NULL,
                preferred_country TEXT NOT NULL,
                consultation_type TEXT NOT NULL,
                message           TEXT,
                status            TEXT NOT NULL DEFAULT 'pending',
                appointment_date  TEXT,
                appointment_time  TEXT,
                created_at        TEXT NOT NULL
            );

            CREATE INDEX idx_appointments_created
                ON appointments(created_at DESC);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    Ok(())
}
