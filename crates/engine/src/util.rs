//! Internal helpers for input validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so the engine enforces consistent invariants.

use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::Internal(format!("invalid {label} id")))
}

/// Normalize an email for storage and lookups (NFKC, trimmed, lowercase).
pub(crate) fn normalize_email(value: &str) -> ResultEngine<String> {
    let normalized: String = value.trim().nfkc().collect::<String>().to_lowercase();
    let Some((local, domain)) = normalized.split_once('@') else {
        return Err(EngineError::InvalidArgument(format!(
            "invalid email: {value}"
        )));
    };
    if local.is_empty()
        || domain.len() < 3
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || normalized.chars().any(char::is_whitespace)
    {
        return Err(EngineError::InvalidArgument(format!(
            "invalid email: {value}"
        )));
    }
    Ok(normalized)
}

/// Trim a required text field, collapsing inner whitespace runs.
pub(crate) fn normalize_required_text(value: &str, label: &str) -> ResultEngine<String> {
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return Err(EngineError::InvalidArgument(format!(
            "{label} must not be empty"
        )));
    }
    Ok(collapsed)
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Upper bound for a single journey, well past any road trip.
pub(crate) const MAX_DISTANCE_KM: f64 = 1_000_000.0;

/// Distances are kilometres: finite and within `0..=MAX_DISTANCE_KM`.
pub(crate) fn validate_distance(distance_km: f64) -> ResultEngine<f64> {
    if !distance_km.is_finite() || distance_km < 0.0 {
        return Err(EngineError::InvalidArgument(
            "distance must be a number >= 0".to_string(),
        ));
    }
    if distance_km > MAX_DISTANCE_KM {
        return Err(EngineError::InvalidArgument(format!(
            "distance must be <= {MAX_DISTANCE_KM} km"
        )));
    }
    Ok(distance_km)
}

pub(crate) fn validate_duration(duration_minutes: i64) -> ResultEngine<i64> {
    if duration_minutes < 0 {
        return Err(EngineError::InvalidArgument(
            "duration must be >= 0".to_string(),
        ));
    }
    Ok(duration_minutes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_lowercased_and_trimmed() {
        assert_eq!(
            normalize_email("  Alice@Example.COM ").unwrap(),
            "alice@example.com"
        );
    }

    #[test]
    fn malformed_emails_are_rejected() {
        for raw in ["", "alice", "@example.com", "alice@com", "alice@.com", "a b@example.com"] {
            assert!(normalize_email(raw).is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn required_text_collapses_whitespace() {
        assert_eq!(
            normalize_required_text("  Client   visit ", "purpose").unwrap(),
            "Client visit"
        );
        assert!(normalize_required_text("   ", "purpose").is_err());
    }

    #[test]
    fn distance_must_be_finite_and_non_negative() {
        assert!(validate_distance(0.0).is_ok());
        assert!(validate_distance(-0.1).is_err());
        assert!(validate_distance(f64::NAN).is_err());
        assert!(validate_distance(MAX_DISTANCE_KM).is_ok());
        assert!(validate_distance(MAX_DISTANCE_KM + 1.0).is_err());
        assert!(validate_distance(1e300).is_err());
    }
}
