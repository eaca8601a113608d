use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A client's consultation request, tracked from public submission through
/// admin confirmation or deletion. Ids are opaque strings because the two
/// store backends assign them differently (UUIDs vs. a counter).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub preferred_country: String,
    pub consultation_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub status: AppointmentStatus,
    /// Set only when the appointment is confirmed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_date: Option<NaiveDate>,
    /// Set only when the appointment is confirmed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_time: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    pub fn is_confirmed(&self) -> bool {
        self.status == AppointmentStatus::Confirmed
    }
}

/// Fields a public submission provides. The store assigns id, status, and
/// creation time.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub preferred_country: String,
    pub consultation_type: String,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
}

impl AppointmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown appointment status: {0}")]
pub struct ParseStatusError(String);

impl std::str::FromStr for AppointmentStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AppointmentStatus::Pending),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}
