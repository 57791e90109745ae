//! Response interpretation for the verification service.
//!
//! The service signals acceptance through specific string fields rather than
//! status codes. All of that matching happens here and nowhere else.

use super::Submission;
use serde_json::Value;

pub const LIVENESS_REAL: &str = "REAL";
pub const LIVENESS_FAKE: &str = "FAKE";
pub const DOCUMENT_CLEAR: &str = "CLEAR IMAGE";
pub const SCAN_SUCCESS: &str = "success";

pub const MRZ_FAILED: &str = "OCR failed or status not successful.";
pub const BARCODE_FAILED: &str = "Barcode processing failed or status not successful.";

/// Verdict tokens are compared exactly as sent.
fn verdict_field<'a>(body: &'a Value, key: &str) -> Option<&'a str> {
    body.get(key).and_then(Value::as_str)
}

fn str_field<'a>(body: &'a Value, key: &str) -> Option<&'a str> {
    body.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn message_or(body: &Value, fallback: &str) -> String {
    str_field(body, "message")
        .or_else(|| str_field(body, "error"))
        .unwrap_or(fallback)
        .to_string()
}

/// Selfie liveness: only an explicit `REAL` verdict is accepted.
pub fn interpret_liveness(body: &Value) -> Submission {
    match verdict_field(body, "live") {
        Some(LIVENESS_REAL) => Submission::Accepted {
            message: message_or(body, "Face verified."),
            payload: Some(body.clone()),
        },
        Some(LIVENESS_FAKE) => Submission::rejected(message_or(body, "Fake face detected.")),
        Some(_) => Submission::rejected(message_or(body, "Face verification failed.")),
        None => Submission::rejected("No face detected. Please try again."),
    }
}

/// Document image quality: only the exact `CLEAR IMAGE` status is accepted.
pub fn interpret_document(body: &Value) -> Submission {
    match body.get("message").and_then(Value::as_str) {
        Some(DOCUMENT_CLEAR) => Submission::Accepted {
            message: DOCUMENT_CLEAR.to_string(),
            payload: Some(body.clone()),
        },
        _ => Submission::rejected(message_or(body, "Document is not clear. Please retake.")),
    }
}

/// MRZ / barcode parsing: `status == "success"`; the parsed fields become the
/// payload.
pub fn interpret_scan(body: &Value, fallback: &str) -> Submission {
    match verdict_field(body, "status") {
        Some(SCAN_SUCCESS) => Submission::Accepted {
            message: message_or(body, "Scan successful."),
            payload: Some(body.get("parsed_data").cloned().unwrap_or(Value::Null)),
        },
        _ => Submission::rejected(fallback),
    }
}

/// Endpoints that report `{"success": bool, "message": ...}`.
pub fn interpret_generic(body: &Value) -> Submission {
    match body.get("success").and_then(Value::as_bool) {
        Some(false) => Submission::rejected(message_or(body, "Request failed.")),
        _ => Submission::Accepted {
            message: message_or(body, ""),
            payload: body.get("data").cloned(),
        },
    }
}
