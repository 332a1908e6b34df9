//! Error detail extraction for non-success replies.

use serde_json::Value;

use devlens_types::{NonEmptyStaticStr, sanitize_terminal_text, truncate_with_ellipsis};

pub(crate) const UNKNOWN_ERROR: NonEmptyStaticStr = NonEmptyStaticStr::new("Request failed");

const MAX_DETAIL_GRAPHEMES: usize = 200;

/// Pull a human-readable message out of an error body.
///
/// Understands `{"detail": "..."}` (FastAPI), `{"error": {"message": "..."}}`,
/// `{"error": "..."}`, `{"message": "..."}` and a bare JSON string. Anything else,
/// including HTML error pages, yields `None` so the status line stands alone.
#[must_use]
pub fn extract_error_detail(body: &str) -> Option<String> {
    let payload: Value = serde_json::from_str(body.trim()).ok()?;
    let message = ["/detail", "/error/message", "/error", "/message"]
        .iter()
        .find_map(|pointer| payload.pointer(pointer).and_then(Value::as_str))
        .or_else(|| payload.as_str())?;

    let cleaned = sanitize_terminal_text(message);
    let detail = truncate_with_ellipsis(&cleaned, MAX_DETAIL_GRAPHEMES);
    if detail.is_empty() { None } else { Some(detail) }
}

pub(crate) fn detail_suffix(detail: Option<&str>) -> String {
    detail.map(|d| format!(": {d}")).unwrap_or_default()
}
