use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::NewAppointment;

// -- Appointments --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub preferred_country: String,
    pub consultation_type: String,
    pub message: Option<String>,
}

impl From<CreateAppointmentRequest> for NewAppointment {
    fn from(req: CreateAppointmentRequest) -> Self {
        NewAppointment {
            name: req.name,
            email: req.email,
            phone: req.phone,
            preferred_country: req.preferred_country,
            consultation_type: req.consultation_type,
            message: req.message,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentResponse {
    pub message: String,
    pub appointment_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfirmAppointmentRequest {
    pub appointment_date: NaiveDate,
    pub appointment_time: String,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    pub user: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthStatusResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}
