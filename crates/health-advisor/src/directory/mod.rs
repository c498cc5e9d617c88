//! Provider Directory / Booking Gateway
//!
//! Abstractions and implementations for the two external capabilities the
//! orchestrator may invoke: listing care providers and persisting bookings.

mod mock;
mod rest;

pub use mock::InMemoryDirectory;
pub use rest::{PostgrestConfig, PostgrestDirectory};

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{BookingRecord, BookingRequest, Doctor};

/// Booking gateway trait (Strategy pattern)
///
/// Implementations must resolve the requested provider either by exact
/// identifier or by fuzzy name match, and must refuse to create a booking
/// with a dangling provider reference. An empty provider list is a valid,
/// distinct outcome from a connectivity failure.
#[async_trait]
pub trait BookingGateway: Send + Sync {
    /// List all available care providers
    async fn list_providers(&self) -> Result<Vec<Doctor>>;

    /// Resolve the provider and persist a booking record
    async fn create_booking(&self, request: &BookingRequest) -> Result<BookingRecord>;

    /// Check if the gateway is available
    async fn health_check(&self) -> bool;

    /// Gateway name for logging
    fn name(&self) -> &str;
}

/// Resolve a provider by exact id, falling back to a case-insensitive
/// substring match on the name (the directory equivalent of `ilike '%x%'`).
pub(crate) fn resolve_provider<'a>(doctors: &'a [Doctor], id_or_name: &str) -> Option<&'a Doctor> {
    if let Some(doctor) = doctors.iter().find(|d| d.id == id_or_name) {
        return Some(doctor);
    }
    let needle = id_or_name.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    doctors
        .iter()
        .find(|d| d.name.to_lowercase().contains(&needle))
}
