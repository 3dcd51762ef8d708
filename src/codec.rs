/*!
 * Codec
 * Transport decoding of the opaque request field and JSON (de)serialization
 * of operation payloads
 */

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{ServiceError, ServiceResult};

/// Standard alphabet; trailing `=` padding is accepted but not required.
const ENVELOPE_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Base64-decode the envelope's `request` field into UTF-8 JSON text.
pub fn decode_envelope(encoded: &str) -> ServiceResult<String> {
    if encoded.is_empty() {
        return Err(ServiceError::InvalidRequestBody(
            "request field is empty".to_string(),
        ));
    }
    let bytes = ENVELOPE_ENGINE
        .decode(encoded)
        .map_err(|e| ServiceError::InvalidRequestBody(e.to_string()))?;

    String::from_utf8(bytes).map_err(|e| ServiceError::InvalidRequestBody(e.to_string()))
}

/// Deserialize decoded JSON into an operation request.
///
/// Unknown fields are ignored; request types default their missing fields.
pub fn parse_operation_request<T: DeserializeOwned>(json: &str) -> ServiceResult<T> {
    serde_json::from_str(json).map_err(|e| ServiceError::MalformedRequest(e.to_string()))
}

/// Serialize to JSON text. Absent optional fields are written as `null`.
pub fn serialize<T: Serialize + ?Sized>(value: &T) -> ServiceResult<String> {
    serde_json::to_string(value).map_err(|e| ServiceError::BackendLibrary(e.to_string()))
}

/// Serialize a backend result into the envelope's `response` slot.
pub fn to_value<T: Serialize>(value: &T) -> ServiceResult<Value> {
    serde_json::to_value(value).map_err(|e| ServiceError::BackendLibrary(e.to_string()))
}
