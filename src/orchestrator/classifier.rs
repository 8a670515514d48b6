use serde::Serialize;

/// Coarse category of a provider failure, derived from its message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorClassification {
    Retryable,
    QuotaExceeded,
    NonRetryable,
    Unknown,
}

// Checked in this order; the first table with a hit wins. Matching is
// case-sensitive.
const QUOTA_MARKERS: &[&str] = &["429", "quota", "Too Many Requests"];
const RETRYABLE_MARKERS: &[&str] = &[
    "503",
    "overloaded",
    "500",
    "502",
    "504",
    "timeout",
    "network",
];
const NON_RETRYABLE_MARKERS: &[&str] = &[
    "401",
    "403",
    "invalid",
    "not found",
    "permission",
    "unauthorized",
    "forbidden",
];

pub fn classify(message: &str) -> ErrorClassification {
    let contains_any = |markers: &[&str]| markers.iter().any(|m| message.contains(m));

    if contains_any(QUOTA_MARKERS) {
        ErrorClassification::QuotaExceeded
    } else if contains_any(RETRYABLE_MARKERS) {
        ErrorClassification::Retryable
    } else if contains_any(NON_RETRYABLE_MARKERS) {
        ErrorClassification::NonRetryable
    } else {
        ErrorClassification::Unknown
    }
}
