/*!
 * Backends
 * Startup factory for the configured Bio SDK implementation, plus the
 * built-in reference implementation
 */

use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{BackendError, BackendResult, ServiceError, ServiceResult};
use crate::model::{
    BiometricFunction, BiometricRecord, BiometricType, Bir, Decision, Match, MatchDecision,
    Params, QualityCheck, QualityScore, RegistryIdType, Response, ResponseStatus, SdkInfo,
};
use crate::provider::BioApi;

pub const REFERENCE_BACKEND: &str = "reference";

const PROCESSED_LEVEL: &str = "PROCESSED";

/// Build the backend named by configuration. Blank or unknown names are fatal.
pub fn create(name: &str) -> ServiceResult<Arc<dyn BioApi>> {
    match name.trim() {
        "" => Err(ServiceError::Config(
            "no Bio SDK implementation configured".to_string(),
        )),
        REFERENCE_BACKEND => {
            info!("Bio SDK implementation: {}", REFERENCE_BACKEND);
            Ok(Arc::new(ReferenceBioApi::new()))
        }
        other => Err(ServiceError::Config(format!(
            "unknown Bio SDK implementation: {}",
            other
        ))),
    }
}

/// Deterministic backend with no external engine behind it.
///
/// Quality is scored from biometric block size, matching compares block
/// digests, and the record-producing operations echo the selected segments.
pub struct ReferenceBioApi {
    supported: Vec<BiometricType>,
}

impl ReferenceBioApi {
    pub fn new() -> Self {
        Self {
            supported: vec![BiometricType::Finger, BiometricType::Face, BiometricType::Iris],
        }
    }

    fn calculate_quality(&self, data: &[u8]) -> f32 {
        if data.len() > 100 {
            85.0
        } else if data.len() > 50 {
            75.0
        } else if !data.is_empty() {
            65.0
        } else {
            0.0
        }
    }

    /// Modalities to act on: the filter, or whatever the sample carries.
    fn target_modalities(
        &self,
        sample: &BiometricRecord,
        filter: &[BiometricType],
    ) -> Vec<BiometricType> {
        let mut modalities: Vec<BiometricType> = if filter.is_empty() {
            sample
                .segments
                .iter()
                .flat_map(|bir| bir.modalities().iter().copied())
                .collect()
        } else {
            filter.to_vec()
        };
        modalities.sort();
        modalities.dedup();
        modalities
    }

    fn digest(&self, record: &BiometricRecord, modality: BiometricType) -> Option<String> {
        let mut hasher = Sha256::new();
        let mut seen = false;
        for bdb in record
            .segments_for(&[modality])
            .filter_map(|bir| bir.bdb.as_deref())
        {
            hasher.update(bdb);
            seen = true;
        }
        seen.then(|| hex::encode(hasher.finalize()))
    }

    fn select(&self, sample: &BiometricRecord, modalities: &[BiometricType]) -> BiometricRecord {
        BiometricRecord {
            segments: sample.segments_for(modalities).cloned().collect(),
            ..sample.clone()
        }
    }
}

impl Default for ReferenceBioApi {
    fn default() -> Self {
        Self::new()
    }
}

impl BioApi for ReferenceBioApi {
    fn init(&self, init_params: &Params) -> BackendResult<SdkInfo> {
        let supported_methods = [
            BiometricFunction::QualityCheck,
            BiometricFunction::Match,
            BiometricFunction::Extract,
            BiometricFunction::Segment,
            BiometricFunction::ConvertFormat,
        ]
        .into_iter()
        .map(|function| (function, self.supported.clone()))
        .collect();

        Ok(SdkInfo {
            api_version: Some("0.9".to_string()),
            sdk_version: Some(env!("CARGO_PKG_VERSION").to_string()),
            supported_modalities: self.supported.clone(),
            supported_methods,
            other_info: init_params.clone(),
            product_owner: Some(RegistryIdType {
                organization: Some("biosdk-service".to_string()),
                kind: Some(REFERENCE_BACKEND.to_string()),
            }),
        })
    }

    fn check_quality(
        &self,
        sample: &BiometricRecord,
        modalities: &[BiometricType],
        _flags: &Params,
    ) -> BackendResult<Response<QualityCheck>> {
        if sample.segments.is_empty() {
            return Ok(Response::failure(ResponseStatus::MissingInput, "sample"));
        }

        let mut check = QualityCheck::default();
        for modality in self.target_modalities(sample, modalities) {
            let segments: Vec<&Bir> = sample.segments_for(&[modality]).collect();
            let score = if segments.is_empty() {
                QualityScore {
                    errors: vec![format!("no {:?} segment in sample", modality)],
                    ..Default::default()
                }
            } else {
                let total: f32 = segments
                    .iter()
                    .map(|bir| self.calculate_quality(bir.bdb.as_deref().unwrap_or(&[])))
                    .sum();
                QualityScore {
                    score: total / segments.len() as f32,
                    ..Default::default()
                }
            };
            check.scores.insert(modality, score);
        }

        Ok(Response::ok(check))
    }

    fn match_records(
        &self,
        sample: &BiometricRecord,
        gallery: &[BiometricRecord],
        modalities: &[BiometricType],
        _flags: &Params,
    ) -> BackendResult<Response<Vec<MatchDecision>>> {
        if sample.segments.is_empty() {
            return Ok(Response::failure(ResponseStatus::MissingInput, "sample"));
        }

        let targets = self.target_modalities(sample, modalities);
        let decisions = gallery
            .iter()
            .enumerate()
            .map(|(index, candidate)| -> BackendResult<MatchDecision> {
                let gallery_index = i32::try_from(index)
                    .map_err(|_| BackendError::new("gallery too large"))?;
                let decisions = targets
                    .iter()
                    .map(|modality| {
                        let probe = self.digest(sample, *modality);
                        let reference = self.digest(candidate, *modality);
                        let outcome = match (probe, reference) {
                            (Some(probe), Some(reference)) if probe == reference => Match::Matched,
                            (Some(_), Some(_)) => Match::NotMatched,
                            _ => Match::Error,
                        };
                        let errors = if outcome == Match::Error {
                            vec![format!("{:?} data missing", modality)]
                        } else {
                            Vec::new()
                        };
                        (
                            *modality,
                            Decision {
                                outcome,
                                errors,
                                analysis_info: Params::new(),
                            },
                        )
                    })
                    .collect();
                Ok(MatchDecision {
                    gallery_index,
                    decisions,
                    analysis_info: Params::new(),
                })
            })
            .collect::<BackendResult<Vec<_>>>()?;

        debug!("Matched sample against {} gallery records", gallery.len());
        Ok(Response::ok(decisions))
    }

    fn extract_template(
        &self,
        sample: &BiometricRecord,
        modalities: &[BiometricType],
        _flags: &Params,
    ) -> BackendResult<Response<BiometricRecord>> {
        if sample.segments.is_empty() {
            return Ok(Response::failure(ResponseStatus::MissingInput, "sample"));
        }

        let mut template = self.select(sample, modalities);
        for bir in &mut template.segments {
            let info = bir.bdb_info.get_or_insert_with(Default::default);
            info.level = Some(PROCESSED_LEVEL.to_string());
        }
        Ok(Response::ok(template))
    }

    fn segment(
        &self,
        sample: &BiometricRecord,
        modalities: &[BiometricType],
        _flags: &Params,
    ) -> BackendResult<Response<BiometricRecord>> {
        if sample.segments.is_empty() {
            return Ok(Response::failure(ResponseStatus::MissingInput, "sample"));
        }
        Ok(Response::ok(self.select(sample, modalities)))
    }

    fn convert_format(
        &self,
        sample: &BiometricRecord,
        source_format: Option<&str>,
        target_format: Option<&str>,
        _source_params: &Params,
        _target_params: &Params,
        modalities: &[BiometricType],
    ) -> BackendResult<Response<BiometricRecord>> {
        let Some(source_format) = source_format else {
            return Ok(Response::failure(ResponseStatus::MissingInput, "sourceFormat"));
        };
        let Some(target_format) = target_format else {
            return Ok(Response::failure(ResponseStatus::MissingInput, "targetFormat"));
        };

        let mut converted = self.select(sample, modalities);
        if source_format != target_format {
            for bir in &mut converted.segments {
                let info = bir.bdb_info.get_or_insert_with(Default::default);
                let format = info.format.get_or_insert_with(Default::default);
                format.kind = Some(target_format.to_string());
            }
        }
        Ok(Response::ok(converted))
    }
}
