/*!
 * Operation Dispatcher
 * Resolve provider -> decode -> parse -> invoke backend -> build envelope
 */

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::codec;
use crate::diagnostics::{DiagnosticFormatter, Redact};
use crate::envelope::{RequestEnvelope, ResponseEnvelope};
use crate::error::{BackendResult, ServiceError, ServiceResult};
use crate::provider::{BioApi, ProviderRegistry};
use crate::request::{
    CheckQualityRequest, ConvertFormatRequest, ExtractTemplateRequest, InitRequest, MatchRequest,
    SegmentRequest,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Init,
    CheckQuality,
    Match,
    ExtractTemplate,
    Segment,
    ConvertFormat,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::Init,
        Operation::CheckQuality,
        Operation::Match,
        Operation::ExtractTemplate,
        Operation::Segment,
        Operation::ConvertFormat,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operation::Init => "init",
            Operation::CheckQuality => "checkQuality",
            Operation::Match => "match",
            Operation::ExtractTemplate => "extractTemplate",
            Operation::Segment => "segment",
            Operation::ConvertFormat => "convertFormat",
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Operation::Init => "/init",
            Operation::CheckQuality => "/check-quality",
            Operation::Match => "/match",
            Operation::ExtractTemplate => "/extract-template",
            Operation::Segment => "/segment",
            Operation::ConvertFormat => "/convert-format",
        }
    }
}

pub struct Dispatcher {
    registry: Arc<ProviderRegistry>,
    diagnostics: DiagnosticFormatter,
}

impl Dispatcher {
    pub fn new(registry: Arc<ProviderRegistry>, diagnostics: DiagnosticFormatter) -> Self {
        Self {
            registry,
            diagnostics,
        }
    }

    /// Run one operation call. Every failure ends up in the returned
    /// envelope; this never errors or panics on behalf of the backend.
    pub fn dispatch(&self, operation: Operation, envelope: &RequestEnvelope) -> ResponseEnvelope {
        match operation {
            Operation::Init => self.init(envelope),
            Operation::CheckQuality => self.check_quality(envelope),
            Operation::Match => self.match_records(envelope),
            Operation::ExtractTemplate => self.extract_template(envelope),
            Operation::Segment => self.segment(envelope),
            Operation::ConvertFormat => self.convert_format(envelope),
        }
    }

    pub fn init(&self, envelope: &RequestEnvelope) -> ResponseEnvelope {
        self.run(Operation::Init, envelope, |api, request: &InitRequest| {
            api.init(&request.init_params)
        })
    }

    pub fn check_quality(&self, envelope: &RequestEnvelope) -> ResponseEnvelope {
        self.run(
            Operation::CheckQuality,
            envelope,
            |api, request: &CheckQualityRequest| {
                api.check_quality(&request.sample, &request.modalities_to_check, &request.flags)
            },
        )
    }

    pub fn match_records(&self, envelope: &RequestEnvelope) -> ResponseEnvelope {
        self.run(Operation::Match, envelope, |api, request: &MatchRequest| {
            api.match_records(
                &request.sample,
                &request.gallery,
                &request.modalities_to_match,
                &request.flags,
            )
        })
    }

    pub fn extract_template(&self, envelope: &RequestEnvelope) -> ResponseEnvelope {
        self.run(
            Operation::ExtractTemplate,
            envelope,
            |api, request: &ExtractTemplateRequest| {
                api.extract_template(&request.sample, &request.modalities_to_extract, &request.flags)
            },
        )
    }

    pub fn segment(&self, envelope: &RequestEnvelope) -> ResponseEnvelope {
        self.run(Operation::Segment, envelope, |api, request: &SegmentRequest| {
            api.segment(&request.sample, &request.modalities_to_segment, &request.flags)
        })
    }

    pub fn convert_format(&self, envelope: &RequestEnvelope) -> ResponseEnvelope {
        self.run(
            Operation::ConvertFormat,
            envelope,
            |api, request: &ConvertFormatRequest| {
                api.convert_format(
                    &request.sample,
                    request.source_format.as_deref(),
                    request.target_format.as_deref(),
                    &request.source_params,
                    &request.target_params,
                    &request.modalities_to_convert,
                )
            },
        )
    }

    fn run<Req, Res, F>(
        &self,
        operation: Operation,
        envelope: &RequestEnvelope,
        invoke: F,
    ) -> ResponseEnvelope
    where
        Req: DeserializeOwned + Redact,
        Res: Serialize + Redact,
        F: FnOnce(&dyn BioApi, &Req) -> BackendResult<Res>,
    {
        let mut response = ResponseEnvelope::template(&envelope.version);

        match self.execute(operation, envelope, invoke) {
            Ok(result) => response.attach_result(result),
            Err(err) => {
                match &err {
                    ServiceError::BackendLibrary(_) => {
                        error!("{}: {}", operation.name(), err)
                    }
                    _ => warn!("{}: {}", operation.name(), err),
                }
                response.fail(&err);
            }
        }

        response
    }

    fn execute<Req, Res, F>(
        &self,
        operation: Operation,
        envelope: &RequestEnvelope,
        invoke: F,
    ) -> ServiceResult<Value>
    where
        Req: DeserializeOwned + Redact,
        Res: Serialize + Redact,
        F: FnOnce(&dyn BioApi, &Req) -> BackendResult<Res>,
    {
        let binding = self.registry.resolve(&envelope.version)?;

        let json = codec::decode_envelope(&envelope.request)?;
        debug!("{}: decoding successful", operation.name());

        let request: Req = codec::parse_operation_request(&json)?;
        debug!("{}: json to dto successful", operation.name());

        self.diagnostics.log_request(operation, &request);
        let result = invoke_guarded(binding.api(), &request, invoke)?;
        self.diagnostics.log_response(operation, &result);

        codec::to_value(&result)
    }
}

/// Backend code is untrusted: a panic is reported like any other fault.
fn invoke_guarded<Req, Res, F>(api: &dyn BioApi, request: &Req, invoke: F) -> ServiceResult<Res>
where
    F: FnOnce(&dyn BioApi, &Req) -> BackendResult<Res>,
{
    match panic::catch_unwind(AssertUnwindSafe(|| invoke(api, request))) {
        Ok(result) => result.map_err(ServiceError::from),
        Err(payload) => Err(ServiceError::BackendLibrary(panic_message(payload.as_ref()))),
    }
}

/// Route panic reports through `tracing` instead of the default stderr hook.
/// Caught backend panics still surface as envelope errors.
pub fn install_panic_hook() {
    panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "unknown location".to_string());
        error!("panic at {}: {}", location, panic_message(info.payload()));
    }));
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "backend panicked".to_string()
    }
}
