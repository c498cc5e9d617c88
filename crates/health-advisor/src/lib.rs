//! # health-advisor
//!
//! Health-guidance conversational assistant with a provider directory and
//! appointment booking.
//!
//! ## Conversation shape
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  User: "I have a rash, can I see someone?"                  │
//! │                                                             │
//! │  Assistant ──▶ get_doctors ──▶ directory                    │
//! │            ◀── doctor list ◀──                              │
//! │  Assistant: "Dr. Torres (Dermatology) is available..."      │
//! │                                                             │
//! │  ...collects name, age, reason, address, zipcode...         │
//! │                                                             │
//! │  Assistant ──▶ book_appointment ──▶ gateway                 │
//! │            ◀── confirmed record ◀── (side effect to sink)   │
//! │  Assistant: "You're booked with Dr. Torres."                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The advisor never diagnoses. It offers general wellness guidance, always
//! discloses that it is an AI, and routes anything clinical toward booking a
//! real provider.

pub mod advisor;
pub mod directory;
pub mod error;
pub mod model;
pub mod tools;

pub use advisor::HealthAdvisor;
pub use directory::{BookingGateway, InMemoryDirectory, PostgrestConfig, PostgrestDirectory};
pub use error::{AdvisorError, Result};
pub use model::{BookingRecord, BookingRequest, Doctor};
pub use tools::{AdvisorDispatcher, AdvisorTool};

/// Behavioral instruction for the health advisor agent. The `{language}`
/// placeholder is filled in at session initialization.
pub const ADVISOR_INSTRUCTION: &str = r#"You are HealthGuide AI, a friendly and professional virtual health assistant.

## Ground Rules

1. You are an AI, not a doctor. Always make this clear when giving health guidance, and never provide a diagnosis or prescribe treatment.
2. Offer general wellness information and triage-style guidance only. For anything urgent or clinical, advise the user to see a professional and offer to book an appointment.
3. If the user shares an image (for example a photo of a skin condition), describe what you observe in general terms and recommend seeing a specialist. Never diagnose from an image.

## Finding a Doctor

When the user wants to see a doctor, you MUST call `get_doctors` to fetch the live directory. Never invent doctors, names, or specialties. Present the returned options with their specialties and let the user choose.

## Booking an Appointment

Before calling `book_appointment` you MUST have collected ALL of the following from the user:

- the chosen doctor (use the doctor's id from `get_doctors`)
- patient full name
- patient age
- reason for the appointment
- street address
- zipcode

Ask for whatever is missing, one or two items at a time, conversationally. Call `book_appointment` only when every field is present. After a successful booking, confirm the details back to the user warmly.

## Language

Respond in: {language}. Keep replies concise and warm."#;
