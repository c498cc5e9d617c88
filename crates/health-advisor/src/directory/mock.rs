//! In-Memory Directory
//!
//! For testing and demo purposes. Seeded with a realistic provider list;
//! bookings are appended under a lock and readable back for assertions.

use std::sync::RwLock;

use async_trait::async_trait;

use super::{BookingGateway, resolve_provider};
use crate::error::{AdvisorError, Result};
use crate::model::{BookingRecord, BookingRequest, Doctor};

/// In-memory booking gateway with a seeded doctor list
pub struct InMemoryDirectory {
    doctors: Vec<Doctor>,
    bookings: RwLock<Vec<BookingRecord>>,
    /// When set, both operations fail with this message (connectivity-failure
    /// simulation for tests)
    outage: Option<String>,
}

impl Default for InMemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::with_doctors(vec![
            Doctor::new("0b6f2c1a-8a6e-4f0e-9d2e-1f4c6a7b8c9d", "Dr. Elena Torres", "Dermatology"),
            Doctor::new("1c7e3d2b-9b7f-4a1f-8e3f-2a5d7b8c9d0e", "Dr. Wei Chen", "Pediatrics"),
            Doctor::new("2d8f4e3c-ac80-4b20-9f40-3b6e8c9d0e1f", "Dr. Meera Patel", "Cardiology"),
            Doctor::new("3e905f4d-bd91-4c31-a051-4c7f9d0e1f20", "Dr. James Okafor", "General Practice"),
        ])
    }

    /// Create with a specific provider list (possibly empty)
    pub fn with_doctors(doctors: Vec<Doctor>) -> Self {
        Self {
            doctors,
            bookings: RwLock::new(Vec::new()),
            outage: None,
        }
    }

    /// Create a gateway whose calls all fail (for connectivity tests)
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            doctors: Vec::new(),
            bookings: RwLock::new(Vec::new()),
            outage: Some(message.into()),
        }
    }

    /// Bookings persisted so far
    pub fn bookings(&self) -> Vec<BookingRecord> {
        self.bookings.read().unwrap().clone()
    }
}

#[async_trait]
impl BookingGateway for InMemoryDirectory {
    async fn list_providers(&self) -> Result<Vec<Doctor>> {
        if let Some(message) = &self.outage {
            return Err(AdvisorError::Directory(message.clone()));
        }
        Ok(self.doctors.clone())
    }

    async fn create_booking(&self, request: &BookingRequest) -> Result<BookingRecord> {
        if let Some(message) = &self.outage {
            return Err(AdvisorError::Directory(message.clone()));
        }

        let doctor = resolve_provider(&self.doctors, &request.doctor)
            .ok_or_else(|| AdvisorError::ProviderNotFound(request.doctor.clone()))?;

        let record = BookingRecord::confirm(doctor, request);
        self.bookings.write().unwrap().push(record.clone());
        tracing::info!(booking_id = %record.id, provider = %record.provider_display_name, "booking persisted");
        Ok(record)
    }

    async fn health_check(&self) -> bool {
        self.outage.is_none()
    }

    fn name(&self) -> &str {
        "InMemoryDirectory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(doctor: &str) -> BookingRequest {
        BookingRequest {
            doctor: doctor.into(),
            patient_name: "Sam Doe".into(),
            patient_age: 34,
            reason: "persistent cough".into(),
            address: "12 Elm St".into(),
            zipcode: "02139".into(),
        }
    }

    #[tokio::test]
    async fn test_booking_by_fuzzy_name() {
        let directory = InMemoryDirectory::new();
        let record = directory.create_booking(&request("chen")).await.unwrap();

        assert_eq!(record.provider_display_name, "Dr. Wei Chen");
        assert_eq!(directory.bookings().len(), 1);
    }

    #[tokio::test]
    async fn test_unresolvable_provider_is_an_error_not_a_record() {
        let directory = InMemoryDirectory::new();
        let result = directory.create_booking(&request("Dr. Nobody")).await;

        assert!(matches!(result, Err(AdvisorError::ProviderNotFound(_))));
        assert!(directory.bookings().is_empty());
    }

    #[tokio::test]
    async fn test_outage() {
        let directory = InMemoryDirectory::unavailable("connection refused");
        assert!(directory.list_providers().await.is_err());
        assert!(!directory.health_check().await);
    }
}
