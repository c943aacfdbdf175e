//! Error types for the FHEM voice bridge
//!
//! This module provides the error kinds the resolution and dispatch core can
//! produce, structured error codes for machine-readable handling, and
//! tracing-based error reporting.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for FHEM operations
pub type Result<T> = std::result::Result<T, FhemError>;

/// Error types for FHEM voice operations
#[derive(Error, Debug)]
pub enum FhemError {
    /// Transport or connectivity failure talking to the FHEM server
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Fuzzy resolution found no candidate above the acceptance floor
    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    /// Entity matched, but no known control protocol applies to it
    #[error("Operation not supported: {0}")]
    NotSupported(String),

    /// Requested value violates the device bounds or step
    #[error("Value {value} out of range [{min}, {max}] with step {step}")]
    OutOfRange {
        value: f64,
        min: f64,
        max: f64,
        step: f64,
    },

    /// Expected attribute or reading is missing or unparsable
    #[error("Malformed entity data: {0}")]
    MalformedEntityData(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Invalid input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// JSON parsing errors
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors
    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

/// Structured error code for machine-readable error handling
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Connection errors (1000-1099)
    BackendUnavailable,

    // Authentication errors (1100-1199)
    InvalidCredentials,

    // Configuration errors (1200-1299)
    ConfigurationInvalid,

    // Device errors (1300-1399)
    DeviceNotFound,
    DeviceTypeUnsupported,
    ValueOutOfRange,

    // Data errors (1400-1499)
    ParsingFailed,
    InvalidInput,
    DataCorrupted,

    // Internal errors (1900-1999)
    InternalError,
}

impl ErrorCode {
    /// Get numeric error code
    pub fn as_number(&self) -> u32 {
        match self {
            ErrorCode::BackendUnavailable => 1001,
            ErrorCode::InvalidCredentials => 1101,
            ErrorCode::ConfigurationInvalid => 1202,
            ErrorCode::DeviceNotFound => 1301,
            ErrorCode::DeviceTypeUnsupported => 1304,
            ErrorCode::ValueOutOfRange => 1305,
            ErrorCode::ParsingFailed => 1401,
            ErrorCode::InvalidInput => 1402,
            ErrorCode::DataCorrupted => 1404,
            ErrorCode::InternalError => 1901,
        }
    }

    /// Get error category
    pub fn category(&self) -> &'static str {
        match self.as_number() {
            1000..=1099 => "connection",
            1100..=1199 => "authentication",
            1200..=1299 => "configuration",
            1300..=1399 => "device",
            1400..=1499 => "data",
            1900..=1999 => "internal",
            _ => "unknown",
        }
    }
}

/// Error severity levels for logging
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Expected, user-facing outcome
    Info,
    /// Degraded operation
    Warning,
    /// Error condition
    Error,
    /// Immediate attention required
    Critical,
}

/// Structured error context with additional metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Error code for machine processing
    pub code: ErrorCode,
    /// Component that generated the error
    pub component: String,
    /// Operation that was being performed
    pub operation: String,
    /// Additional metadata about the error
    pub metadata: HashMap<String, serde_json::Value>,
    /// Timestamp when error occurred
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Intent turn id for correlation
    pub correlation_id: Option<String>,
}

impl ErrorContext {
    /// Create new error context
    pub fn new(code: ErrorCode, component: &str, operation: &str) -> Self {
        Self {
            code,
            component: component.to_string(),
            operation: operation.to_string(),
            metadata: HashMap::new(),
            timestamp: chrono::Utc::now(),
            correlation_id: None,
        }
    }

    /// Add metadata to error context
    pub fn with_metadata<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<serde_json::Value>,
    {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Set correlation ID for turn tracking
    pub fn with_correlation_id<S: Into<String>>(mut self, id: S) -> Self {
        self.correlation_id = Some(id.into());
        self
    }
}

impl FhemError {
    /// Create a backend-unavailable error
    pub fn backend_unavailable<S: Into<String>>(msg: S) -> Self {
        Self::BackendUnavailable(msg.into())
    }

    /// Create an entity-not-found error
    pub fn entity_not_found<S: Into<String>>(name: S) -> Self {
        Self::EntityNotFound(name.into())
    }

    /// Create a not-supported error
    pub fn not_supported<S: Into<String>>(msg: S) -> Self {
        Self::NotSupported(msg.into())
    }

    /// Create an out-of-range error carrying the device bounds
    pub fn out_of_range(value: f64, min: f64, max: f64, step: f64) -> Self {
        Self::OutOfRange {
            value,
            min,
            max,
            step,
        }
    }

    /// Create a malformed-entity-data error
    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        Self::MalformedEntityData(msg.into())
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create an authentication error
    pub fn authentication<S: Into<String>>(msg: S) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Map FhemError to structured error code
    pub fn to_error_code(&self) -> ErrorCode {
        match self {
            FhemError::BackendUnavailable(_) => ErrorCode::BackendUnavailable,
            FhemError::EntityNotFound(_) => ErrorCode::DeviceNotFound,
            FhemError::NotSupported(_) => ErrorCode::DeviceTypeUnsupported,
            FhemError::OutOfRange { .. } => ErrorCode::ValueOutOfRange,
            FhemError::MalformedEntityData(_) => ErrorCode::DataCorrupted,
            FhemError::Config(_) => ErrorCode::ConfigurationInvalid,
            FhemError::Authentication(_) => ErrorCode::InvalidCredentials,
            FhemError::InvalidInput(_) => ErrorCode::InvalidInput,
            FhemError::Json(_) => ErrorCode::ParsingFailed,
            FhemError::Io(_) | FhemError::Generic(_) => ErrorCode::InternalError,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            FhemError::Authentication(_) => ErrorSeverity::Critical,
            FhemError::Config(_) | FhemError::Io(_) | FhemError::Generic(_) => {
                ErrorSeverity::Error
            }
            FhemError::BackendUnavailable(_)
            | FhemError::MalformedEntityData(_)
            | FhemError::Json(_) => ErrorSeverity::Warning,
            FhemError::EntityNotFound(_)
            | FhemError::NotSupported(_)
            | FhemError::OutOfRange { .. }
            | FhemError::InvalidInput(_) => ErrorSeverity::Info,
        }
    }

    /// Whether a caller could sensibly retry.
    ///
    /// Nothing in this crate retries automatically; the flag only informs
    /// logging and the host.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FhemError::BackendUnavailable(_))
    }

    /// Whether the error is an expected outcome the user should hear about
    /// rather than an operational fault
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            FhemError::EntityNotFound(_)
                | FhemError::NotSupported(_)
                | FhemError::OutOfRange { .. }
                | FhemError::BackendUnavailable(_)
        )
    }
}

/// Error logging utilities
pub struct ErrorReporter;

impl ErrorReporter {
    /// Log an error with a level chosen from its severity
    pub fn log_error(error: &FhemError, context: Option<ErrorContext>) {
        let code = error.to_error_code();
        let context = context.unwrap_or_else(|| ErrorContext::new(code.clone(), "unknown", "unknown"));

        match error.severity() {
            ErrorSeverity::Critical | ErrorSeverity::Error => {
                tracing::error!(
                    error_code = code.as_number(),
                    category = code.category(),
                    component = context.component,
                    operation = context.operation,
                    correlation_id = context.correlation_id,
                    metadata = ?context.metadata,
                    "Error occurred: {}",
                    error
                );
            }
            ErrorSeverity::Warning => {
                tracing::warn!(
                    error_code = code.as_number(),
                    category = code.category(),
                    component = context.component,
                    operation = context.operation,
                    correlation_id = context.correlation_id,
                    "Warning: {}",
                    error
                );
            }
            ErrorSeverity::Info => {
                tracing::info!(
                    error_code = code.as_number(),
                    category = code.category(),
                    component = context.component,
                    operation = context.operation,
                    correlation_id = context.correlation_id,
                    "{}",
                    error
                );
            }
        }
    }

    /// Format error as JSON for the CLI
    pub fn format_error(error: &FhemError) -> serde_json::Value {
        let code = error.to_error_code();
        serde_json::json!({
            "error": {
                "code": code.as_number(),
                "category": code.category(),
                "message": error.to_string(),
                "retryable": error.is_retryable(),
                "user_facing": error.is_user_facing(),
            }
        })
    }
}

/// Macro for easy structured error logging
#[macro_export]
macro_rules! log_structured_error {
    ($error:expr, $component:expr, $operation:expr) => {
        $crate::error::ErrorReporter::log_error(
            &$error,
            Some($crate::error::ErrorContext::new(
                $error.to_error_code(),
                $component,
                $operation,
            )),
        )
    };
    ($error:expr, $component:expr, $operation:expr, $correlation_id:expr) => {
        $crate::error::ErrorReporter::log_error(
            &$error,
            Some(
                $crate::error::ErrorContext::new($error.to_error_code(), $component, $operation)
                    .with_correlation_id($correlation_id),
            ),
        )
    };
}

impl From<regex::Error> for FhemError {
    fn from(err: regex::Error) -> Self {
        FhemError::InvalidInput(format!("Invalid pattern: {err}"))
    }
}

impl From<::config::ConfigError> for FhemError {
    fn from(err: ::config::ConfigError) -> Self {
        FhemError::Config(err.to_string())
    }
}
