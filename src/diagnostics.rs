/*!
 * Diagnostic Formatter
 * Debug rendering of request/response payloads with biometric bytes
 * replaced by their SHA-256 digest
 */

use serde::Serialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::codec;
use crate::dispatcher::Operation;
use crate::model::{
    BdbInfo, BiometricRecord, Bir, BirInfo, MatchDecision, QualityCheck, Response, SdkInfo,
};
use crate::request::{
    CheckQualityRequest, ConvertFormatRequest, ExtractTemplateRequest, InitRequest, MatchRequest,
    SegmentRequest,
};

/// Loggable form of a payload. Raw biometric bytes never appear in the output.
pub trait Redact {
    fn redacted(&self) -> Result<Value, serde_json::Error>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DiagnosticFormatter {
    enabled: bool,
}

impl DiagnosticFormatter {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn log_request<T: Redact>(&self, operation: Operation, request: &T) {
        if let Some(text) = self.render(request) {
            debug!("REQUEST:: {}: {}", operation.name(), text);
        }
    }

    pub fn log_response<T: Redact>(&self, operation: Operation, response: &T) {
        if let Some(text) = self.render(response) {
            debug!("RESPONSE:: {}: {}", operation.name(), text);
        }
    }

    /// `None` when disabled or when rendering failed; failures are only logged.
    pub fn render<T: Redact>(&self, payload: &T) -> Option<String> {
        if !self.enabled {
            return None;
        }
        let rendered = payload
            .redacted()
            .map_err(|e| e.to_string())
            .and_then(|value| codec::serialize(&value).map_err(|e| e.to_string()));
        match rendered {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("Failed to render payload for logging: {}", e);
                None
            }
        }
    }
}

fn hash_of(bytes: &Option<Vec<u8>>) -> Value {
    match bytes {
        Some(bytes) => Value::String(hex::encode(Sha256::digest(bytes))),
        None => Value::Null,
    }
}

fn plain<T: Serialize>(value: &T) -> Result<Value, serde_json::Error> {
    serde_json::to_value(value)
}

impl<T: Redact> Redact for Option<T> {
    fn redacted(&self) -> Result<Value, serde_json::Error> {
        match self {
            Some(inner) => inner.redacted(),
            None => Ok(Value::Null),
        }
    }
}

impl<T: Redact> Redact for Vec<T> {
    fn redacted(&self) -> Result<Value, serde_json::Error> {
        self.iter()
            .map(Redact::redacted)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    }
}

impl Redact for BirInfo {
    fn redacted(&self) -> Result<Value, serde_json::Error> {
        Ok(json!({
            "_modelClass": "BIRInfo",
            "creator": self.creator,
            "index": self.index,
            "payloadHash": hash_of(&self.payload),
            "integrity": self.integrity,
            "creationDate": self.creation_date,
            "notValidBefore": self.not_valid_before,
            "notValidAfter": self.not_valid_after,
        }))
    }
}

impl Redact for BdbInfo {
    fn redacted(&self) -> Result<Value, serde_json::Error> {
        let mut value = plain(self)?;
        if let Some(fields) = value.as_object_mut() {
            fields.remove("challengeResponse");
            fields.insert("_modelClass".into(), json!("BDBInfo"));
            fields.insert(
                "challengeResponseHash".into(),
                hash_of(&self.challenge_response),
            );
        }
        Ok(value)
    }
}

impl Redact for Bir {
    fn redacted(&self) -> Result<Value, serde_json::Error> {
        Ok(json!({
            "_modelClass": "BIR",
            "bdbInfo": self.bdb_info.redacted()?,
            "birInfo": self.bir_info.redacted()?,
            "cbeffversion": plain(&self.cbeffversion)?,
            "others": self.others,
            "sbHash": hash_of(&self.sb),
            "sbInfo": plain(&self.sb_info)?,
            "version": plain(&self.version)?,
            "bdbHash": hash_of(&self.bdb),
        }))
    }
}

impl Redact for BiometricRecord {
    fn redacted(&self) -> Result<Value, serde_json::Error> {
        Ok(json!({
            "_modelClass": "BiometricRecord",
            "birInfo": self.bir_info.redacted()?,
            "cbeffversion": plain(&self.cbeffversion)?,
            "version": plain(&self.version)?,
            "segments": self.segments.redacted()?,
            "others": self.others,
        }))
    }
}

impl<T: Redact> Redact for Response<T> {
    fn redacted(&self) -> Result<Value, serde_json::Error> {
        Ok(json!({
            "statusCode": self.status_code,
            "statusMessage": self.status_message,
            "response": self.response.redacted()?,
        }))
    }
}

// No binary fields in these.
impl Redact for SdkInfo {
    fn redacted(&self) -> Result<Value, serde_json::Error> {
        plain(self)
    }
}

impl Redact for QualityCheck {
    fn redacted(&self) -> Result<Value, serde_json::Error> {
        plain(self)
    }
}

impl Redact for MatchDecision {
    fn redacted(&self) -> Result<Value, serde_json::Error> {
        plain(self)
    }
}

impl Redact for InitRequest {
    fn redacted(&self) -> Result<Value, serde_json::Error> {
        Ok(json!({
            "_modelClass": "InitRequestDto",
            "initParams": plain(&self.init_params)?,
        }))
    }
}

impl Redact for CheckQualityRequest {
    fn redacted(&self) -> Result<Value, serde_json::Error> {
        Ok(json!({
            "_modelClass": "CheckQualityRequestDto",
            "flags": plain(&self.flags)?,
            "modalitiesToCheck": plain(&self.modalities_to_check)?,
            "sample": self.sample.redacted()?,
        }))
    }
}

impl Redact for MatchRequest {
    fn redacted(&self) -> Result<Value, serde_json::Error> {
        Ok(json!({
            "_modelClass": "MatchRequestDto",
            "flags": plain(&self.flags)?,
            "modalitiesToMatch": plain(&self.modalities_to_match)?,
            "sample": self.sample.redacted()?,
            "gallery": self.gallery.redacted()?,
        }))
    }
}

impl Redact for ExtractTemplateRequest {
    fn redacted(&self) -> Result<Value, serde_json::Error> {
        Ok(json!({
            "_modelClass": "ExtractTemplateRequestDto",
            "flags": plain(&self.flags)?,
            "modalitiesToExtract": plain(&self.modalities_to_extract)?,
            "sample": self.sample.redacted()?,
        }))
    }
}

impl Redact for SegmentRequest {
    fn redacted(&self) -> Result<Value, serde_json::Error> {
        Ok(json!({
            "_modelClass": "SegmentRequestDto",
            "flags": plain(&self.flags)?,
            "modalitiesToSegment": plain(&self.modalities_to_segment)?,
            "sample": self.sample.redacted()?,
        }))
    }
}

impl Redact for ConvertFormatRequest {
    fn redacted(&self) -> Result<Value, serde_json::Error> {
        Ok(json!({
            "_modelClass": "ConvertFormatRequestDto",
            "sourceFormat": self.source_format,
            "targetFormat": self.target_format,
            "sourceParams": plain(&self.source_params)?,
            "targetParams": plain(&self.target_params)?,
            "modalitiesToConvert": plain(&self.modalities_to_convert)?,
            "sample": self.sample.redacted()?,
        }))
    }
}
