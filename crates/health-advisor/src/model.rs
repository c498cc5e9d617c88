//! Domain Models
//!
//! Core data types for the care-provider directory and appointment booking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A care provider listed in the directory
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Doctor {
    /// Stable identifier (UUID in the backing store)
    pub id: String,

    /// Display name
    pub name: String,

    /// Medical specialty
    pub specialty: String,
}

impl Doctor {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        specialty: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            specialty: specialty.into(),
        }
    }
}

/// A validated booking request. All fields are required; the tool layer
/// refuses to build one until the model has collected everything.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BookingRequest {
    /// Provider identifier (preferred) or their name
    pub doctor: String,

    pub patient_name: String,

    pub patient_age: u32,

    /// Reason for the visit
    pub reason: String,

    /// Street address
    pub address: String,

    pub zipcode: String,
}

/// A confirmed appointment. Created only by a successful booking; never
/// mutated afterward.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BookingRecord {
    /// Booking identifier assigned by the gateway
    pub id: String,

    /// Resolved provider identifier
    pub provider_id: String,

    /// Human-readable provider name
    pub provider_display_name: String,

    pub patient_name: String,

    pub patient_age: u32,

    pub reason: String,

    pub address: String,

    pub zipcode: String,

    pub created_at: DateTime<Utc>,
}

impl BookingRecord {
    /// Build a record for a resolved provider
    pub fn confirm(doctor: &Doctor, request: &BookingRequest) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            provider_id: doctor.id.clone(),
            provider_display_name: doctor.name.clone(),
            patient_name: request.patient_name.clone(),
            patient_age: request.patient_age,
            reason: request.reason.clone(),
            address: request.address.clone(),
            zipcode: request.zipcode.clone(),
            created_at: Utc::now(),
        }
    }
}
