//! PostgREST Directory
//!
//! Booking gateway backed by a PostgREST-style API (Supabase and
//! compatibles): a `doctors` table for the provider list and a `patients`
//! table for booking rows.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookingGateway, resolve_provider};
use crate::error::{AdvisorError, Result};
use crate::model::{BookingRecord, BookingRequest, Doctor};

/// PostgREST gateway configuration
#[derive(Clone, Debug)]
pub struct PostgrestConfig {
    /// Project base URL (e.g., "https://xyz.supabase.co")
    pub base_url: String,

    /// Publishable API key
    pub api_key: String,

    /// Per-call timeout at the transport boundary
    pub timeout_secs: u64,
}

impl PostgrestConfig {
    /// Read configuration from `SUPABASE_URL` / `SUPABASE_KEY`
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("SUPABASE_URL").ok()?;
        let api_key = std::env::var("SUPABASE_KEY").ok()?;
        Some(Self {
            base_url,
            api_key,
            timeout_secs: 30,
        })
    }
}

/// Booking gateway over a PostgREST API
pub struct PostgrestDirectory {
    client: reqwest::Client,
    config: PostgrestConfig,
}

#[derive(Debug, Deserialize)]
struct DoctorRow {
    id: String,
    name: String,
    #[serde(default)]
    specialty: Option<String>,
}

#[derive(Debug, Serialize)]
struct BookingRow<'a> {
    doctor_id: &'a str,
    patient_name: &'a str,
    patient_age: u32,
    reason_for_appointment: &'a str,
    street_address: &'a str,
    zipcode: &'a str,
}

#[derive(Debug, Deserialize)]
struct InsertedRow {
    id: String,
    created_at: DateTime<Utc>,
}

impl PostgrestDirectory {
    pub fn from_config(config: PostgrestConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AdvisorError::Directory(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.config.base_url)
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
    }

    async fn fetch_doctors(&self) -> Result<Vec<Doctor>> {
        let response = self
            .authed(self.client.get(self.table_url("doctors")).query(&[("select", "*")]))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdvisorError::Directory(format!("doctors query failed ({status}): {body}")));
        }

        let rows: Vec<DoctorRow> = response.json().await?;
        Ok(rows
            .into_iter()
            .map(|row| Doctor {
                id: row.id,
                name: row.name,
                specialty: row.specialty.unwrap_or_else(|| "General Practice".into()),
            })
            .collect())
    }
}

#[async_trait]
impl BookingGateway for PostgrestDirectory {
    async fn list_providers(&self) -> Result<Vec<Doctor>> {
        self.fetch_doctors().await
    }

    async fn create_booking(&self, request: &BookingRequest) -> Result<BookingRecord> {
        // Resolution happens against the live list so a renamed or removed
        // provider can never yield a dangling reference.
        let doctors = self.fetch_doctors().await?;
        let doctor = resolve_provider(&doctors, &request.doctor)
            .ok_or_else(|| AdvisorError::ProviderNotFound(request.doctor.clone()))?;

        let row = BookingRow {
            doctor_id: &doctor.id,
            patient_name: &request.patient_name,
            patient_age: request.patient_age,
            reason_for_appointment: &request.reason,
            street_address: &request.address,
            zipcode: &request.zipcode,
        };

        let response = self
            .authed(self.client.post(self.table_url("patients")))
            .header("Prefer", "return=representation")
            .json(&[&row])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdvisorError::BookingRejected(format!("({status}): {body}")));
        }

        let inserted: Vec<InsertedRow> = response.json().await?;
        let inserted = inserted
            .into_iter()
            .next()
            .ok_or_else(|| AdvisorError::BookingRejected("insert returned no rows".into()))?;

        let mut record = BookingRecord::confirm(doctor, request);
        record.id = inserted.id;
        record.created_at = inserted.created_at;
        tracing::info!(booking_id = %record.id, "booking persisted via PostgREST");
        Ok(record)
    }

    async fn health_check(&self) -> bool {
        self.fetch_doctors().await.is_ok()
    }

    fn name(&self) -> &str {
        "PostgrestDirectory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_row_column_names() {
        let row = BookingRow {
            doctor_id: "d-1",
            patient_name: "Sam Doe",
            patient_age: 34,
            reason_for_appointment: "checkup",
            street_address: "12 Elm St",
            zipcode: "02139",
        };
        let json = serde_json::to_value(row).unwrap();
        assert_eq!(json["doctor_id"], "d-1");
        assert_eq!(json["reason_for_appointment"], "checkup");
        assert_eq!(json["street_address"], "12 Elm St");
    }

    #[test]
    fn test_doctor_row_defaults_specialty() {
        let row: DoctorRow =
            serde_json::from_str(r#"{"id": "d-1", "name": "Dr. Chen"}"#).unwrap();
        assert!(row.specialty.is_none());
    }
}
