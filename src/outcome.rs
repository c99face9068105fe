//! Workflow outcomes and provider-error classification.
//!
//! Every workflow run terminates in exactly one [`Outcome`]. Failed launch
//! calls are classified by matching on the provider's status, code, and
//! message strings. The matching is intentionally literal — the provider
//! communicates capacity exhaustion and throttling through these strings —
//! and it is kept in one function so a provider-side wording change has a
//! single place to land.

use serde::Serialize;

use crate::backend::{LaunchedInstance, ServiceError};

const OUT_OF_CAPACITY_STATUS: u16 = 500;
const OUT_OF_CAPACITY_MARKER: &str = "Out of host capacity";
const RATE_LIMIT_STATUS: u16 = 429;
const RATE_LIMIT_CODE_MARKER: &str = "TooManyRequests";

/// Name of the diagnostic attachment sent for unexpected errors.
pub const ERROR_REPORT_FILE_NAME: &str = "error.json";

/// Terminal result of one workflow run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// An instance of the target shape already exists; nothing was launched.
    AlreadyExists,
    /// A new instance was launched.
    Launched(LaunchedInstance),
    /// The provider reported no free capacity for the requested shape.
    CapacityExhausted,
    /// The provider throttled the request; the run backed off once.
    RateLimited,
    /// The provider failed in a way the workflow does not recognise.
    UnexpectedError(ServiceError),
}

/// Classification of a provider service error.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    /// Status 500 with the out-of-capacity marker in the message.
    CapacityExhausted,
    /// Status 429, or an error code containing the throttling marker.
    RateLimited,
    /// Anything else.
    Unexpected,
}

/// Classifies a provider service error from a launch attempt.
///
/// The precedence is strict: the capacity-exhaustion predicate is evaluated
/// first, then the rate-limit predicate, then the catch-all. Exactly one
/// class results.
#[must_use]
pub fn classify_service_error(error: &ServiceError) -> ErrorClass {
    if error.status == OUT_OF_CAPACITY_STATUS && error.message.contains(OUT_OF_CAPACITY_MARKER) {
        return ErrorClass::CapacityExhausted;
    }
    if error.status == RATE_LIMIT_STATUS || error.code.contains(RATE_LIMIT_CODE_MARKER) {
        return ErrorClass::RateLimited;
    }
    ErrorClass::Unexpected
}

#[derive(Serialize)]
struct ErrorReport<'a> {
    status: u16,
    code: &'a str,
    #[serde(rename = "opc-request-id")]
    request_id: &'a str,
    message: &'a str,
    operation_name: &'a str,
    timestamp: &'a str,
    request_endpoint: &'a str,
}

/// Serialises a [`ServiceError`] into the diagnostic report attached to
/// unexpected-error notifications.
///
/// The report is pretty-printed JSON carrying all seven error fields, with
/// the request identifier under its wire name `opc-request-id`.
///
/// # Errors
///
/// Returns a [`serde_json::Error`] when serialisation fails.
pub fn error_report(error: &ServiceError) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec_pretty(&ErrorReport {
        status: error.status,
        code: &error.code,
        request_id: &error.request_id,
        message: &error.message,
        operation_name: &error.operation_name,
        timestamp: &error.timestamp,
        request_endpoint: &error.request_endpoint,
    })
}
