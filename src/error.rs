/*!
 * Service errors
 * Every failure the envelope protocol can report, plus startup failures
 */

use thiserror::Error;

pub const NO_PROVIDER_CODE: &str = "BIO_SDK_001";
pub const INVALID_REQUEST_BODY_CODE: &str = "INVALID_REQUEST_BODY";
pub const MALFORMED_REQUEST_CODE: &str = "UNCHECKED_EXCEPTION";
pub const BACKEND_LIBRARY_CODE: &str = "BIOSDK_LIB_EXCEPTION";
pub const CONFIG_CODE: &str = "NO_BIOSDK_PROVIDER_FOUND";

#[derive(Debug, Error)]
pub enum ServiceError {
    /// No registered binding carries the requested spec version.
    #[error("No Bio SDK service provider implementations found for given version")]
    NoProvider { version: String },

    /// The `request` field is not base64, or does not decode to UTF-8.
    #[error("Unable to parse request body: {0}")]
    InvalidRequestBody(String),

    /// The decoded payload is not JSON of the operation's shape.
    #[error("Unable to parse request json: {0}")]
    MalformedRequest(String),

    #[error("Exception thrown by BioSDK library: {0}")]
    BackendLibrary(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServiceError {
    /// Stable code written to `ErrorEntry.code`.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::NoProvider { .. } => NO_PROVIDER_CODE,
            ServiceError::InvalidRequestBody(_) => INVALID_REQUEST_BODY_CODE,
            ServiceError::MalformedRequest(_) => MALFORMED_REQUEST_CODE,
            ServiceError::BackendLibrary(_) => BACKEND_LIBRARY_CODE,
            ServiceError::Config(_) | ServiceError::Io(_) => CONFIG_CODE,
        }
    }
}

/// Fault raised by a backend capability.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct BackendError {
    pub message: String,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<BackendError> for ServiceError {
    fn from(e: BackendError) -> Self {
        ServiceError::BackendLibrary(e.message)
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
pub type BackendResult<T> = Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_provider_message_is_fixed() {
        let err = ServiceError::NoProvider {
            version: "2.0".into(),
        };
        assert_eq!(err.code(), "BIO_SDK_001");
        assert_eq!(
            err.to_string(),
            "No Bio SDK service provider implementations found for given version"
        );
    }

    #[test]
    fn backend_error_keeps_backend_description() {
        let err: ServiceError = BackendError::new("engine crashed").into();
        assert_eq!(err.code(), "BIOSDK_LIB_EXCEPTION");
        assert_eq!(
            err.to_string(),
            "Exception thrown by BioSDK library: engine crashed"
        );
    }

    #[test]
    fn decode_and_parse_failures_have_distinct_codes() {
        let decode = ServiceError::InvalidRequestBody("bad base64".into());
        let parse = ServiceError::MalformedRequest("expected value".into());
        assert_ne!(decode.code(), parse.code());
    }
}
