//! Tool Vocabulary
//!
//! The fixed, statically declared set of capabilities the model may invoke:
//! `get_doctors` and `book_appointment`. Dispatch is a closed enum match, so
//! adding a tool is a compile-time-checked enumeration change rather than a
//! silent no-op on a typo.

use std::sync::Arc;

use agent_core::{
    Dispatch, ParameterSchema, ToolCall, ToolDeclaration, ToolDispatcher, ToolOutcome,
};
use async_trait::async_trait;
use serde_json::json;

use crate::directory::BookingGateway;
use crate::model::{BookingRecord, BookingRequest};

/// The closed tool set
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdvisorTool {
    GetDoctors,
    BookAppointment,
}

impl AdvisorTool {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "get_doctors" => Some(Self::GetDoctors),
            "book_appointment" => Some(Self::BookAppointment),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::GetDoctors => "get_doctors",
            Self::BookAppointment => "book_appointment",
        }
    }
}

/// Static declarations handed to the model provider on every turn
pub fn declarations() -> Vec<ToolDeclaration> {
    vec![
        ToolDeclaration {
            name: AdvisorTool::GetDoctors.name().into(),
            description: "Fetch the list of available doctors from the directory.".into(),
            parameters: Vec::new(),
        },
        ToolDeclaration {
            name: AdvisorTool::BookAppointment.name().into(),
            description:
                "Save patient details and confirm an appointment. Call only once every \
                 argument has been collected from the user."
                    .into(),
            parameters: vec![
                ParameterSchema::required(
                    "doctor_id",
                    "string",
                    "The id of the doctor (preferred) or their full name.",
                ),
                ParameterSchema::required("patient_name", "string", "Patient name."),
                ParameterSchema::required("patient_age", "number", "Patient age."),
                ParameterSchema::required("reason", "string", "Reason for visit."),
                ParameterSchema::required("address", "string", "Street address."),
                ParameterSchema::required("zipcode", "string", "Zipcode."),
            ],
        },
    ]
}

/// Dispatcher wiring the tool set to a booking gateway
pub struct AdvisorDispatcher {
    gateway: Arc<dyn BookingGateway>,
}

impl AdvisorDispatcher {
    pub fn new(gateway: Arc<dyn BookingGateway>) -> Self {
        Self { gateway }
    }

    async fn get_doctors(&self, call: &ToolCall) -> Dispatch<BookingRecord> {
        match self.gateway.list_providers().await {
            Ok(doctors) if doctors.is_empty() => Dispatch::outcome(ToolOutcome::success(
                call,
                json!({ "info": "no providers available" }),
            )),
            Ok(doctors) => {
                Dispatch::outcome(ToolOutcome::success(call, json!({ "doctors": doctors })))
            }
            Err(e) => {
                tracing::warn!(error = %e, "provider listing failed");
                Dispatch::outcome(ToolOutcome::error(call, format!("Database error: {e}")))
            }
        }
    }

    async fn book_appointment(&self, call: &ToolCall) -> Dispatch<BookingRecord> {
        let request = match parse_booking_request(call) {
            Ok(request) => request,
            // Refused locally; the model is told what to collect.
            Err(message) => return Dispatch::outcome(ToolOutcome::error(call, message)),
        };

        match self.gateway.create_booking(&request).await {
            Ok(record) => {
                let outcome =
                    ToolOutcome::success(call, json!({ "success": true, "booking": record }));
                Dispatch::with_effect(outcome, record)
            }
            Err(e) => {
                tracing::warn!(error = %e, "booking failed");
                Dispatch::outcome(ToolOutcome::error(call, e.to_string()))
            }
        }
    }
}

/// Validate arguments against the declared schema and build a request.
/// Every field is required; the first problem is reported back so the model
/// can ask the user for it.
fn parse_booking_request(call: &ToolCall) -> std::result::Result<BookingRequest, String> {
    let declaration = declarations()
        .into_iter()
        .find(|d| d.name == AdvisorTool::BookAppointment.name())
        .expect("book_appointment is declared");

    if let Some(missing) = declaration.missing_argument(call) {
        return Err(format!(
            "Missing required argument '{missing}'. Collect it from the user before booking."
        ));
    }

    let str_arg = |name: &'static str| -> std::result::Result<String, String> {
        call.str_arg(name)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
            .ok_or_else(|| format!("Argument '{name}' must be a non-empty string."))
    };

    let patient_age = call
        .u64_arg("patient_age")
        .and_then(|age| u32::try_from(age).ok())
        .filter(|age| (1..=130).contains(age))
        .ok_or_else(|| "Argument 'patient_age' must be a realistic age in years.".to_string())?;

    Ok(BookingRequest {
        doctor: str_arg("doctor_id")?,
        patient_name: str_arg("patient_name")?,
        patient_age,
        reason: str_arg("reason")?,
        address: str_arg("address")?,
        zipcode: str_arg("zipcode")?,
    })
}

#[async_trait]
impl ToolDispatcher for AdvisorDispatcher {
    type Effect = BookingRecord;

    fn declarations(&self) -> Vec<ToolDeclaration> {
        declarations()
    }

    async fn dispatch(&self, call: &ToolCall) -> Dispatch<BookingRecord> {
        match AdvisorTool::parse(&call.name) {
            Some(AdvisorTool::GetDoctors) => self.get_doctors(call).await,
            Some(AdvisorTool::BookAppointment) => self.book_appointment(call).await,
            // Not expected with a statically declared set, but a hallucinated
            // name must not crash the round.
            None => {
                tracing::warn!(tool = %call.name, "unknown tool requested");
                Dispatch::outcome(ToolOutcome::error(
                    call,
                    format!("Unknown tool '{}'", call.name),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::InMemoryDirectory;
    use serde_json::Value;
    use std::collections::HashMap;

    fn call(name: &str, args: &[(&str, Value)]) -> ToolCall {
        let arguments: HashMap<String, Value> = args
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect();
        ToolCall::new(name, arguments)
    }

    fn full_booking_args() -> Vec<(&'static str, Value)> {
        vec![
            ("doctor_id", json!("torres")),
            ("patient_name", json!("Sam Doe")),
            ("patient_age", json!(34)),
            ("reason", json!("rash on arm")),
            ("address", json!("12 Elm St")),
            ("zipcode", json!("02139")),
        ]
    }

    #[tokio::test]
    async fn test_get_doctors_lists_directory() {
        let dispatcher = AdvisorDispatcher::new(Arc::new(InMemoryDirectory::new()));
        let dispatch = dispatcher.dispatch(&call("get_doctors", &[])).await;

        assert!(!dispatch.outcome.is_error());
        assert!(dispatch.effect.is_none());
        let doctors = dispatch.outcome.payload["doctors"].as_array().unwrap();
        assert_eq!(doctors.len(), 4);
    }

    #[tokio::test]
    async fn test_get_doctors_empty_is_info_not_error() {
        let dispatcher =
            AdvisorDispatcher::new(Arc::new(InMemoryDirectory::with_doctors(Vec::new())));
        let dispatch = dispatcher.dispatch(&call("get_doctors", &[])).await;

        assert!(!dispatch.outcome.is_error());
        assert_eq!(dispatch.outcome.payload["info"], "no providers available");
    }

    #[tokio::test]
    async fn test_get_doctors_outage_is_error_payload() {
        let dispatcher =
            AdvisorDispatcher::new(Arc::new(InMemoryDirectory::unavailable("timeout")));
        let dispatch = dispatcher.dispatch(&call("get_doctors", &[])).await;

        assert!(dispatch.outcome.is_error());
    }

    #[tokio::test]
    async fn test_booking_success_carries_effect() {
        let dispatcher = AdvisorDispatcher::new(Arc::new(InMemoryDirectory::new()));
        let dispatch = dispatcher
            .dispatch(&call("book_appointment", &full_booking_args()))
            .await;

        assert!(!dispatch.outcome.is_error());
        assert_eq!(dispatch.outcome.payload["success"], true);
        let record = dispatch.effect.expect("booking effect");
        assert_eq!(record.provider_display_name, "Dr. Elena Torres");
        assert!(!record.id.is_empty());
    }

    #[tokio::test]
    async fn test_missing_argument_refused_locally() {
        let gateway = Arc::new(InMemoryDirectory::new());
        let dispatcher = AdvisorDispatcher::new(gateway.clone());

        let mut args = full_booking_args();
        args.retain(|(name, _)| *name != "zipcode");
        let dispatch = dispatcher.dispatch(&call("book_appointment", &args)).await;

        assert!(dispatch.outcome.is_error());
        assert!(
            dispatch.outcome.payload["error"]
                .as_str()
                .unwrap()
                .contains("zipcode")
        );
        assert!(dispatch.effect.is_none());
        // The gateway was never touched.
        assert!(gateway.bookings().is_empty());
    }

    #[tokio::test]
    async fn test_age_as_numeric_string_is_accepted() {
        let dispatcher = AdvisorDispatcher::new(Arc::new(InMemoryDirectory::new()));
        let mut args = full_booking_args();
        args.retain(|(name, _)| *name != "patient_age");
        args.push(("patient_age", json!("34")));

        let dispatch = dispatcher.dispatch(&call("book_appointment", &args)).await;
        assert!(!dispatch.outcome.is_error());
    }

    #[tokio::test]
    async fn test_unreasonable_age_refused() {
        let dispatcher = AdvisorDispatcher::new(Arc::new(InMemoryDirectory::new()));
        let mut args = full_booking_args();
        args.retain(|(name, _)| *name != "patient_age");
        args.push(("patient_age", json!(0)));

        let dispatch = dispatcher.dispatch(&call("book_appointment", &args)).await;
        assert!(dispatch.outcome.is_error());
    }

    #[tokio::test]
    async fn test_unknown_tool_is_error_outcome() {
        let dispatcher = AdvisorDispatcher::new(Arc::new(InMemoryDirectory::new()));
        let dispatch = dispatcher.dispatch(&call("delete_everything", &[])).await;

        assert!(dispatch.outcome.is_error());
        assert!(dispatch.effect.is_none());
    }

    #[test]
    fn test_declarations_are_closed_and_complete() {
        let decls = declarations();
        assert_eq!(decls.len(), 2);

        let booking = decls.iter().find(|d| d.name == "book_appointment").unwrap();
        let required = booking.required_parameters();
        assert_eq!(required.len(), 6);
        for field in ["doctor_id", "patient_name", "patient_age", "reason", "address", "zipcode"] {
            assert!(required.contains(&field), "missing {field}");
        }
    }
}
