//! Tests for structured error handling

use fhem_voice_rust::error::{ErrorCode, ErrorContext, ErrorReporter, ErrorSeverity, FhemError};
use fhem_voice_rust::log_structured_error;
use fhem_voice_rust::tools::{dialog, DialogResponse};

#[test]
fn test_error_context_with_metadata() {
    let context = ErrorContext::new(ErrorCode::DeviceNotFound, "resolver", "resolve")
        .with_metadata("fragment", "kitchen lamp")
        .with_metadata("room", "Homebridge")
        .with_correlation_id("turn_abc123");

    assert_eq!(context.component, "resolver");
    assert_eq!(context.operation, "resolve");
    assert_eq!(context.correlation_id, Some("turn_abc123".to_string()));
    assert_eq!(context.metadata.get("fragment").unwrap(), "kitchen lamp");
}

#[test]
fn test_error_reporting() {
    let error = FhemError::backend_unavailable("connection refused");
    let context = ErrorContext::new(ErrorCode::BackendUnavailable, "tools", "switch")
        .with_correlation_id("turn_123");

    // Only logs; must not panic without a subscriber
    ErrorReporter::log_error(&error, Some(context));
    log_structured_error!(error, "tools", "switch");
    log_structured_error!(error, "tools", "switch", "turn_456");

    let json = ErrorReporter::format_error(&error);
    assert_eq!(json["error"]["code"], 1001);
    assert_eq!(json["error"]["retryable"], true);
}

#[test]
fn test_every_kind_ends_in_a_dialog() {
    let cases = [
        (FhemError::backend_unavailable("down"), dialog::OFFLINE),
        (FhemError::entity_not_found("lamp"), dialog::UNKNOWN_DEVICE),
        (FhemError::not_supported("fan"), dialog::NOT_SUPPORTED),
        (FhemError::out_of_range(40.0, 5.0, 35.0, 0.5), dialog::THERMOSTAT_BAD_REQUEST),
        (FhemError::malformed("minValue=abc"), dialog::NOT_SUPPORTED),
        (FhemError::config("no host"), dialog::SETUP_ERROR),
        (FhemError::authentication("401"), dialog::SETUP_ERROR),
        (FhemError::invalid_input("no device slot"), dialog::SORRY),
    ];

    for (error, expected) in cases {
        assert_eq!(DialogResponse::from_error(&error).dialog, expected, "{error}");
    }
}

#[test]
fn test_severity_levels() {
    assert_eq!(FhemError::authentication("bad").severity(), ErrorSeverity::Critical);
    assert_eq!(FhemError::config("bad").severity(), ErrorSeverity::Error);
    assert_eq!(FhemError::malformed("x").severity(), ErrorSeverity::Warning);
    assert!(!FhemError::not_supported("x").is_retryable());
}
