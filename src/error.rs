/*!
 * Error Handling for the Mock KMS
 *
 * Provides error types with numeric error codes, user-friendly messages that are
 * safe to return to HTTP callers, and technical details for server-side logs.
 */

use std::collections::HashMap;
use thiserror::Error;

/// Error type for all key store, crypto and server operations
#[derive(Debug, Error)]
pub enum KmsError {
    #[error("Key not found: {purpose} key for node '{node_id}'")]
    KeyNotFound {
        node_id: String,
        purpose: String,
        error_code: u32,
    },

    #[error("Key load failed: {path} - {cause}")]
    KeyLoadError {
        path: String,
        cause: String,
        error_code: u32,
    },

    #[error("Crypto operation failed: {operation} - {cause}")]
    CryptoOperationError {
        operation: String,
        cause: String,
        error_code: u32,
        context: HashMap<String, String>,
    },

    #[error("Invalid request: {field} - {cause}")]
    InvalidRequest {
        field: String,
        cause: String,
        error_code: u32,
    },

    #[error("Invalid parameter: {parameter} - {expected} - got {actual}")]
    InvalidParameter {
        parameter: String,
        expected: String,
        actual: String,
        error_code: u32,
    },

    #[error("Configuration error: {setting} - {cause}")]
    ConfigError {
        setting: String,
        cause: String,
        error_code: u32,
    },

    #[error("Server error: {operation} - {cause}")]
    ServerError {
        operation: String,
        cause: String,
        error_code: u32,
    },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Error code constants for different error categories
pub mod error_codes {
    // Key store errors: 1000-1999
    pub const KEY_NOT_FOUND: u32 = 1001;
    pub const KEY_STORE_POISONED: u32 = 1002;

    // Crypto errors: 2000-2999
    pub const PRIVATE_KEY_DECODE_FAILED: u32 = 2001;
    pub const SIGNING_FAILED: u32 = 2002;
    pub const DECRYPTION_FAILED: u32 = 2003;
    pub const PUBLIC_KEY_ENCODE_FAILED: u32 = 2004;
    pub const ALGORITHM_PURPOSE_MISMATCH: u32 = 2005;

    // Request errors: 3000-3999
    pub const MALFORMED_BODY: u32 = 3001;
    pub const MISSING_FIELD: u32 = 3002;
    pub const INVALID_BASE64: u32 = 3003;

    // Configuration and loader errors: 4000-4999
    pub const KEY_FILE_UNREADABLE: u32 = 4001;
    pub const INVALID_CONFIG_VALUE: u32 = 4002;
    pub const EMPTY_NODE_LIST: u32 = 4003;

    // Server errors: 5000-5999
    pub const BIND_FAILED: u32 = 5001;
    pub const SERVE_FAILED: u32 = 5002;
    pub const SHUTDOWN_FAILED: u32 = 5003;
}

impl KmsError {
    /// Get the numeric error code for this error
    pub fn error_code(&self) -> u32 {
        match self {
            KmsError::KeyNotFound { error_code, .. } => *error_code,
            KmsError::KeyLoadError { error_code, .. } => *error_code,
            KmsError::CryptoOperationError { error_code, .. } => *error_code,
            KmsError::InvalidRequest { error_code, .. } => *error_code,
            KmsError::InvalidParameter { error_code, .. } => *error_code,
            KmsError::ConfigError { error_code, .. } => *error_code,
            KmsError::ServerError { error_code, .. } => *error_code,
            KmsError::SerializationError(_) => 9001,
            KmsError::IoError(_) => 9002,
        }
    }

    /// Get a user-friendly error message.
    ///
    /// These messages are what HTTP callers see, so they name the failed
    /// operation but never carry key material or store contents.
    pub fn user_friendly_message(&self) -> String {
        match self {
            KmsError::KeyNotFound { purpose, .. } => {
                format!("No {} key is available for the requested node.", purpose)
            }
            KmsError::KeyLoadError { .. } => {
                "Key material could not be loaded. Check the key directory layout.".to_string()
            }
            KmsError::CryptoOperationError { operation, .. } => {
                format!("KMS operation '{}' failed.", operation)
            }
            KmsError::InvalidRequest { field, .. } => {
                format!("Request field '{}' is missing or malformed.", field)
            }
            KmsError::InvalidParameter {
                parameter,
                expected,
                ..
            } => {
                format!(
                    "Invalid parameter '{}'. Expected '{}' format.",
                    parameter, expected
                )
            }
            KmsError::ConfigError { setting, .. } => {
                format!("Configuration setting '{}' is invalid.", setting)
            }
            KmsError::ServerError { operation, .. } => {
                format!("Server operation '{}' failed.", operation)
            }
            KmsError::SerializationError(_) => {
                "Data serialization failed. Data format may be corrupted.".to_string()
            }
            KmsError::IoError(_) => {
                "Input/output operation failed. Check file permissions and paths.".to_string()
            }
        }
    }

    /// Get technical details for server-side logging
    pub fn technical_details(&self) -> HashMap<String, String> {
        let mut details = HashMap::new();

        details.insert("error_code".to_string(), self.error_code().to_string());
        details.insert("error_type".to_string(), self.error_type().to_string());
        details.insert("timestamp".to_string(), chrono::Utc::now().to_rfc3339());

        match self {
            KmsError::KeyNotFound {
                node_id, purpose, ..
            } => {
                details.insert("node_id".to_string(), node_id.clone());
                details.insert("purpose".to_string(), purpose.clone());
            }
            KmsError::CryptoOperationError {
                operation,
                cause,
                context,
                ..
            } => {
                details.insert("operation".to_string(), operation.clone());
                details.insert("cause".to_string(), cause.clone());
                details.extend(context.clone());
            }
            KmsError::InvalidRequest { field, cause, .. } => {
                details.insert("field".to_string(), field.clone());
                details.insert("cause".to_string(), cause.clone());
            }
            _ => {
                details.insert("details".to_string(), self.to_string());
            }
        }

        details
    }

    /// Get the error category/type as a string
    pub fn error_type(&self) -> &'static str {
        match self {
            KmsError::KeyNotFound { .. } => "KeyNotFound",
            KmsError::KeyLoadError { .. } => "KeyLoadError",
            KmsError::CryptoOperationError { .. } => "CryptoOperationError",
            KmsError::InvalidRequest { .. } => "InvalidRequest",
            KmsError::InvalidParameter { .. } => "InvalidParameter",
            KmsError::ConfigError { .. } => "ConfigError",
            KmsError::ServerError { .. } => "ServerError",
            KmsError::SerializationError(_) => "SerializationError",
            KmsError::IoError(_) => "IoError",
        }
    }
}

/// Convenience constructors for common error types
impl KmsError {
    pub fn key_not_found(node_id: &str, purpose: &str) -> Self {
        KmsError::KeyNotFound {
            node_id: node_id.to_string(),
            purpose: purpose.to_string(),
            error_code: error_codes::KEY_NOT_FOUND,
        }
    }

    pub fn key_load_error(path: &str, cause: &str) -> Self {
        KmsError::KeyLoadError {
            path: path.to_string(),
            cause: cause.to_string(),
            error_code: error_codes::KEY_FILE_UNREADABLE,
        }
    }

    pub fn crypto_error(operation: &str, cause: &str, error_code: u32) -> Self {
        KmsError::CryptoOperationError {
            operation: operation.to_string(),
            cause: cause.to_string(),
            error_code,
            context: HashMap::new(),
        }
    }

    /// Crypto error tagged with the algorithm in use, for the server log.
    pub fn crypto_error_with_algorithm(
        operation: &str,
        cause: &str,
        error_code: u32,
        algorithm: &str,
    ) -> Self {
        let mut context = HashMap::new();
        context.insert("algorithm".to_string(), algorithm.to_string());

        KmsError::CryptoOperationError {
            operation: operation.to_string(),
            cause: cause.to_string(),
            error_code,
            context,
        }
    }

    pub fn invalid_request(field: &str, cause: &str, error_code: u32) -> Self {
        KmsError::InvalidRequest {
            field: field.to_string(),
            cause: cause.to_string(),
            error_code,
        }
    }

    pub fn invalid_parameter(parameter: &str, expected: &str, actual: &str) -> Self {
        KmsError::InvalidParameter {
            parameter: parameter.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
            error_code: 9999,
        }
    }

    pub fn config_error(setting: &str, cause: &str, error_code: u32) -> Self {
        KmsError::ConfigError {
            setting: setting.to_string(),
            cause: cause.to_string(),
            error_code,
        }
    }

    pub fn server_error(operation: &str, cause: &str, error_code: u32) -> Self {
        KmsError::ServerError {
            operation: operation.to_string(),
            cause: cause.to_string(),
            error_code,
        }
    }
}

// From implementations for automatic error conversion
impl From<std::io::Error> for KmsError {
    fn from(err: std::io::Error) -> Self {
        KmsError::IoError(format!("IO operation failed: {}", err))
    }
}

impl From<serde_json::Error> for KmsError {
    fn from(err: serde_json::Error) -> Self {
        KmsError::SerializationError(err.to_string())
    }
}

/// Result type alias for KMS operations
pub type KmsResult<T> = Result<T, KmsError>;
