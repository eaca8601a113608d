pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;

use atrium_types::models::{Appointment, NewAppointment};

/// Persistence contract shared by both backends. Methods are blocking;
/// handlers call them through `spawn_blocking`.
pub trait RecordStore: Send + Sync {
    /// Insert a new pending appointment and return its assigned id.
    fn create(&self, new: NewAppointment) -> Result<String>;

    /// All appointments, newest first.
    fn list(&self) -> Result<Vec<Appointment>>;

    /// Mark an appointment confirmed and attach the agreed date and time.
    /// Returns the updated record, or `None` when the id is unknown.
    /// Re-confirming overwrites date and time; the status stays confirmed.
    fn confirm(&self, id: &str, date: NaiveDate, time: &str) -> Result<Option<Appointment>>;

    /// Remove an appointment. Returns `false` when the id is unknown.
    fn delete(&self, id: &str) -> Result<bool>;
}

pub type SharedStore = Arc<dyn RecordStore>;
