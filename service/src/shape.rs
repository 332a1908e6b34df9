//! Per-variant request and response adapters.
//!
//! The controller only knows about [`AnalysisRequest`] and a single result string;
//! everything wire-specific about a deployed service lives here.

use serde_json::{Value, json};

use devlens_types::{AnalysisRequest, NonEmptyString, ServiceVariant};

/// JSON pointers tried in order when reading the result text.
const DEVICE_RESULT_POINTERS: &[&str] = &["/analysis"];
const MEETING_RESULT_POINTERS: &[&str] = &["/analysis", "/choices/0/message/content"];

#[must_use]
pub const fn endpoint_path(variant: ServiceVariant) -> &'static str {
    match variant {
        ServiceVariant::DeviceAnalysis => "/analyze_device",
        ServiceVariant::MeetingSummary => "/summarize",
    }
}

/// Request body for `variant`. Absent optional fields become `null`.
#[must_use]
pub fn request_body(variant: ServiceVariant, request: &AnalysisRequest) -> Value {
    match variant {
        ServiceVariant::DeviceAnalysis => json!({
            "datasheet_text": request.primary_text(),
            "log_text": request.secondary_text(),
            "query": request.instruction(),
        }),
        ServiceVariant::MeetingSummary => json!({
            "meeting_text": request.primary_text(),
        }),
    }
}

/// First non-blank string found at the variant's result pointers.
#[must_use]
pub fn extract_result_text(variant: ServiceVariant, body: &Value) -> Option<NonEmptyString> {
    let pointers = match variant {
        ServiceVariant::DeviceAnalysis => DEVICE_RESULT_POINTERS,
        ServiceVariant::MeetingSummary => MEETING_RESULT_POINTERS,
    };
    pointers
        .iter()
        .filter_map(|pointer| body.pointer(pointer).and_then(Value::as_str))
        .find_map(|text| NonEmptyString::new(text).ok())
}
