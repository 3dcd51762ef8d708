/*!
 * Operation requests
 * Typed payloads carried, base64-encoded, in the envelope's `request` field
 */

use serde::{Deserialize, Deserializer, Serialize};

use crate::model::{BiometricRecord, BiometricType, Params};

/// Treat an explicit `null` like a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InitRequest {
    #[serde(deserialize_with = "null_as_default")]
    pub init_params: Params,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CheckQualityRequest {
    #[serde(deserialize_with = "null_as_default")]
    pub sample: BiometricRecord,
    #[serde(deserialize_with = "null_as_default")]
    pub modalities_to_check: Vec<BiometricType>,
    #[serde(deserialize_with = "null_as_default")]
    pub flags: Params,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MatchRequest {
    #[serde(deserialize_with = "null_as_default")]
    pub sample: BiometricRecord,
    #[serde(deserialize_with = "null_as_default")]
    pub gallery: Vec<BiometricRecord>,
    #[serde(deserialize_with = "null_as_default")]
    pub modalities_to_match: Vec<BiometricType>,
    #[serde(deserialize_with = "null_as_default")]
    pub flags: Params,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtractTemplateRequest {
    #[serde(deserialize_with = "null_as_default")]
    pub sample: BiometricRecord,
    #[serde(deserialize_with = "null_as_default")]
    pub modalities_to_extract: Vec<BiometricType>,
    #[serde(deserialize_with = "null_as_default")]
    pub flags: Params,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SegmentRequest {
    #[serde(deserialize_with = "null_as_default")]
    pub sample: BiometricRecord,
    #[serde(deserialize_with = "null_as_default")]
    pub modalities_to_segment: Vec<BiometricType>,
    #[serde(deserialize_with = "null_as_default")]
    pub flags: Params,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConvertFormatRequest {
    #[serde(deserialize_with = "null_as_default")]
    pub sample: BiometricRecord,
    pub source_format: Option<String>,
    pub target_format: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub source_params: Params,
    #[serde(deserialize_with = "null_as_default")]
    pub target_params: Params,
    #[serde(deserialize_with = "null_as_default")]
    pub modalities_to_convert: Vec<BiometricType>,
}
