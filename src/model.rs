/*!
 * Biometric model
 * Records and results exchanged with the backend. Field names follow the
 * camelCase wire form the existing SDK clients send.
 */

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub type Params = BTreeMap<String, String>;

/// Modality filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BiometricType {
    #[serde(alias = "Finger")]
    Finger,
    #[serde(alias = "Face")]
    Face,
    #[serde(alias = "Voice")]
    Voice,
    #[serde(alias = "Iris")]
    Iris,
    #[serde(alias = "Signature")]
    Signature,
    #[serde(alias = "HandGeometry")]
    HandGeometry,
    #[serde(alias = "Vein")]
    Vein,
    #[serde(alias = "Gait")]
    Gait,
    #[serde(alias = "Keystroke")]
    Keystroke,
    #[serde(alias = "LipMovement")]
    LipMovement,
    #[serde(alias = "ExceptionPhoto")]
    ExceptionPhoto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BiometricFunction {
    QualityCheck,
    Match,
    Extract,
    Segment,
    ConvertFormat,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionType {
    pub major: Option<i32>,
    pub minor: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryIdType {
    pub organization: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QualityType {
    pub algorithm: Option<RegistryIdType>,
    pub score: Option<i64>,
    pub quality_calculation_failed: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BirInfo {
    pub creator: Option<String>,
    pub index: Option<String>,
    #[serde(with = "bytes_compat")]
    pub payload: Option<Vec<u8>>,
    pub integrity: Option<bool>,
    pub creation_date: Option<String>,
    pub not_valid_before: Option<String>,
    pub not_valid_after: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BdbInfo {
    #[serde(with = "bytes_compat")]
    pub challenge_response: Option<Vec<u8>>,
    pub index: Option<String>,
    pub format: Option<RegistryIdType>,
    pub encryption: Option<bool>,
    pub creation_date: Option<String>,
    pub not_valid_before: Option<String>,
    pub not_valid_after: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<Vec<BiometricType>>,
    pub subtype: Option<Vec<String>>,
    pub level: Option<String>,
    pub product: Option<RegistryIdType>,
    pub capture_device: Option<RegistryIdType>,
    pub feature_extraction_algorithm: Option<RegistryIdType>,
    pub comparison_algorithm: Option<RegistryIdType>,
    pub compression_algorithm: Option<RegistryIdType>,
    pub purpose: Option<String>,
    pub quality: Option<QualityType>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SbInfo {
    pub format: Option<RegistryIdType>,
}

/// One biometric information record (a single segment of a sample).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Bir {
    pub version: Option<VersionType>,
    pub cbeffversion: Option<VersionType>,
    pub bir_info: Option<BirInfo>,
    pub bdb_info: Option<BdbInfo>,
    #[serde(with = "bytes_compat")]
    pub bdb: Option<Vec<u8>>,
    #[serde(with = "bytes_compat")]
    pub sb: Option<Vec<u8>>,
    pub sb_info: Option<SbInfo>,
    pub others: Option<Value>,
}

impl Bir {
    /// Modalities declared by this segment's BDB header.
    pub fn modalities(&self) -> &[BiometricType] {
        self.bdb_info
            .as_ref()
            .and_then(|info| info.kind.as_deref())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BiometricRecord {
    pub version: Option<VersionType>,
    pub cbeffversion: Option<VersionType>,
    pub bir_info: Option<BirInfo>,
    #[serde(deserialize_with = "crate::request::null_as_default")]
    pub segments: Vec<Bir>,
    pub others: Option<Value>,
}

impl BiometricRecord {
    /// Segments whose modality is in `filter`; every segment when `filter` is empty.
    pub fn segments_for<'a, 'f>(
        &'a self,
        filter: &'f [BiometricType],
    ) -> impl Iterator<Item = &'a Bir> + 'f
    where
        'a: 'f,
    {
        self.segments.iter().filter(move |bir| {
            filter.is_empty() || bir.modalities().iter().any(|m| filter.contains(m))
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SdkInfo {
    pub api_version: Option<String>,
    pub sdk_version: Option<String>,
    pub supported_modalities: Vec<BiometricType>,
    pub supported_methods: BTreeMap<BiometricFunction, Vec<BiometricType>>,
    pub other_info: Params,
    pub product_owner: Option<RegistryIdType>,
}

/// Status codes a backend reports inside a `Response`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    Success,
    InvalidInput,
    MissingInput,
    QualityCheckFailed,
    PoorDataQuality,
    UnknownError,
}

impl ResponseStatus {
    pub fn code(self) -> i32 {
        match self {
            ResponseStatus::Success => 200,
            ResponseStatus::InvalidInput => 401,
            ResponseStatus::MissingInput => 402,
            ResponseStatus::QualityCheckFailed => 403,
            ResponseStatus::PoorDataQuality => 406,
            ResponseStatus::UnknownError => 500,
        }
    }

    /// Status text; `detail` fills the parameter slot of the input errors.
    pub fn message(self, detail: &str) -> String {
        match self {
            ResponseStatus::Success => "OK".to_string(),
            ResponseStatus::InvalidInput => format!("Invalid Input Parameter - {}", detail),
            ResponseStatus::MissingInput => format!("Missing Input Parameter - {}", detail),
            ResponseStatus::QualityCheckFailed => "Quality check of Biometric data failed".to_string(),
            ResponseStatus::PoorDataQuality => "Data provided is of poor quality".to_string(),
            ResponseStatus::UnknownError => "UNKNOWN_ERROR".to_string(),
        }
    }
}

/// Backend result wrapper: status plus an optional payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response<T> {
    pub status_code: i32,
    pub status_message: String,
    pub response: Option<T>,
}

impl<T> Response<T> {
    pub fn ok(response: T) -> Self {
        Self {
            status_code: ResponseStatus::Success.code(),
            status_message: ResponseStatus::Success.message(""),
            response: Some(response),
        }
    }

    pub fn failure(status: ResponseStatus, detail: &str) -> Self {
        Self {
            status_code: status.code(),
            status_message: status.message(detail),
            response: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QualityScore {
    pub score: f32,
    pub errors: Vec<String>,
    pub analysis_info: Params,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityCheck {
    pub scores: BTreeMap<BiometricType, QualityScore>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Match {
    Matched,
    NotMatched,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    #[serde(rename = "match")]
    pub outcome: Match,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub analysis_info: Params,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MatchDecision {
    pub gallery_index: i32,
    pub decisions: BTreeMap<BiometricType, Decision>,
    pub analysis_info: Params,
}

/// Binary fields: the Java clients send signed byte arrays, other clients
/// send base64 text. Both are accepted; signed arrays are written back.
pub mod bytes_compat {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Ints(Vec<i16>),
        Text(String),
    }

    pub fn serialize<S>(value: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(bytes) => {
                let signed: Vec<i8> = bytes.iter().map(|b| *b as i8).collect();
                serializer.serialize_some(&signed)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Repr>::deserialize(deserializer)? {
            None => Ok(None),
            Some(Repr::Ints(ints)) => ints
                .into_iter()
                .map(|i| {
                    if (-128..=255).contains(&i) {
                        Ok(i as u8)
                    } else {
                        Err(D::Error::custom(format!("byte value out of range: {}", i)))
                    }
                })
                .collect::<Result<Vec<u8>, _>>()
                .map(Some),
            Some(Repr::Text(text)) => STANDARD.decode(text).map(Some).map_err(D::Error::custom),
        }
    }
}
