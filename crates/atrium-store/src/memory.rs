use std::sync::Mutex;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use tracing::warn;

use atrium_types::models::{Appointment, AppointmentStatus, NewAppointment};

use crate::RecordStore;

/// Volatile fallback used when the durable backend cannot be opened.
/// Owns its state outright; nothing survives a restart.
pub struct MemoryStore {
    inner: Mutex<MemoryState>,
}

struct MemoryState {
    records: Vec<Appointment>,
    next_id: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        warn!("Using in-memory appointment store; records will not survive a restart");
        Self {
            inner: Mutex::new(MemoryState {
                records: Vec::new(),
                next_id: 1,
            }),
        }
    }

    fn with_state<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut MemoryState) -> T,
    {
        let mut state = self
            .inner
            .lock()
            .map_err(|e| anyhow::anyhow!("store lock poisoned: {}", e))?;
        Ok(f(&mut state))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for MemoryStore {
    fn create(&self, new: NewAppointment) -> Result<String> {
        self.with_state(|state| {
            let id = state.next_id.to_string();
            state.next_id += 1;
            state.records.push(Appointment {
                id: id.clone(),
                name: new.name,
                email: new.email,
                phone: new.phone,
                preferred_country: new.preferred_country,
                consultation_type: new.consultation_type,
                message: new.message,
                status: AppointmentStatus::Pending,
                appointment_date: None,
                appointment_time: None,
                created_at: Utc::now(),
            });
            id
        })
    }

    fn list(&self) -> Result<Vec<Appointment>> {
        self.with_state(|state| {
            let mut records = state.records.clone();
            // Counter ids break the tie when two records share a timestamp.
            records.sort_by(|a, b| {
                b.created_at
                    .cmp(&a.created_at)
                    .then_with(|| numeric_id(&b.id).cmp(&numeric_id(&a.id)))
            });
            records
        })
    }

    fn confirm(&self, id: &str, date: NaiveDate, time: &str) -> Result<Option<Appointment>> {
        self.with_state(|state| {
            let record = state.records.iter_mut().find(|r| r.id == id)?;
            record.status = AppointmentStatus::Confirmed;
            record.appointment_date = Some(date);
            record.appointment_time = Some(time.to_string());
            Some(record.clone())
        })
    }

    fn delete(&self, id: &str) -> Result<bool> {
        self.with_state(|state| {
            let before = state.records.len();
            state.records.retain(|r| r.id != id);
            state.records.len() < before
        })
    }
}

fn numeric_id(id: &str) -> u64 {
    id.parse().unwrap_or(0)
}
