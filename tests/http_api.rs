//! Router tests: every domain outcome comes back as HTTP 200 with an envelope.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use biosdk_service::error::BackendResult;
use biosdk_service::model::{
    BiometricRecord, BiometricType, MatchDecision, Params, QualityCheck, Response, SdkInfo,
};
use biosdk_service::provider::bindings_for;
use biosdk_service::{
    build_router, AppState, BackendError, BioApi, DiagnosticFormatter, Dispatcher, Operation,
    ProviderRegistry,
};

/// Reference-like backend whose `match` always faults.
struct CrashingMatcher;

impl BioApi for CrashingMatcher {
    fn init(&self, init_params: &Params) -> BackendResult<SdkInfo> {
        Ok(SdkInfo {
            api_version: Some("0.9".into()),
            other_info: init_params.clone(),
            ..Default::default()
        })
    }

    fn check_quality(
        &self,
        _sample: &BiometricRecord,
        _modalities: &[BiometricType],
        _flags: &Params,
    ) -> BackendResult<Response<QualityCheck>> {
        Ok(Response::ok(QualityCheck::default()))
    }

    fn match_records(
        &self,
        _sample: &BiometricRecord,
        _gallery: &[BiometricRecord],
        _modalities: &[BiometricType],
        _flags: &Params,
    ) -> BackendResult<Response<Vec<MatchDecision>>> {
        Err(BackendError::new("engine crashed"))
    }

    fn extract_template(
        &self,
        sample: &BiometricRecord,
        _modalities: &[BiometricType],
        _flags: &Params,
    ) -> BackendResult<Response<BiometricRecord>> {
        Ok(Response::ok(sample.clone()))
    }

    fn segment(
        &self,
        sample: &BiometricRecord,
        _modalities: &[BiometricType],
        _flags: &Params,
    ) -> BackendResult<Response<BiometricRecord>> {
        Ok(Response::ok(sample.clone()))
    }

    fn convert_format(
        &self,
        sample: &BiometricRecord,
        _source_format: Option<&str>,
        _target_format: Option<&str>,
        _source_params: &Params,
        _target_params: &Params,
        _modalities: &[BiometricType],
    ) -> BackendResult<Response<BiometricRecord>> {
        Ok(Response::ok(sample.clone()))
    }
}

fn app_with(api: Arc<dyn BioApi>) -> Router {
    let registry = ProviderRegistry::builder()
        .register_all(bindings_for(api))
        .unwrap()
        .build()
        .unwrap();
    let dispatcher = Dispatcher::new(Arc::new(registry), DiagnosticFormatter::new(true));
    build_router(AppState::new(
        dispatcher,
        vec!["REGISTRATION_PROCESSOR".to_string()],
    ))
}

fn app() -> Router {
    app_with(Arc::new(CrashingMatcher))
}

async fn post_envelope(app: Router, path: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get_text(app: Router, path: &str, roles: Option<&str>) -> (StatusCode, String) {
    let mut builder = Request::builder().method("GET").uri(path);
    if let Some(roles) = roles {
        builder = builder.header("x-user-roles", roles);
    }
    let resp = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn encode(json: Value) -> String {
    STANDARD.encode(json.to_string())
}

#[tokio::test]
async fn init_with_registered_version_returns_sdk_info() {
    let body = json!({
        "version": "1.0",
        "request": encode(json!({ "initParams": { "k": "v" } })),
    });

    let (status, envelope) = post_envelope(app(), "/init", body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(envelope["version"], "1.0");
    assert_eq!(envelope["errors"], json!([]));
    assert_eq!(envelope["response"]["otherInfo"], json!({ "k": "v" }));
    assert!(envelope["responsetime"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn init_with_unregistered_version_reports_no_provider() {
    let body = json!({
        "version": "2.0",
        "request": encode(json!({ "initParams": { "k": "v" } })),
    });

    let (status, envelope) = post_envelope(app(), "/init", body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(envelope["version"], "2.0");
    assert_eq!(envelope["response"], "");
    assert_eq!(
        envelope["errors"],
        json!([{
            "code": "BIO_SDK_001",
            "message": "No Bio SDK service provider implementations found for given version"
        }])
    );
}

#[tokio::test]
async fn invalid_base64_reports_invalid_request_body() {
    let body = json!({ "version": "1.0", "request": "***" });

    let (status, envelope) = post_envelope(app(), "/check-quality", body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(envelope["response"], "");
    assert_eq!(envelope["errors"].as_array().unwrap().len(), 1);
    assert_eq!(envelope["errors"][0]["code"], "INVALID_REQUEST_BODY");
}

#[tokio::test]
async fn backend_fault_is_reported_in_envelope() {
    let body = json!({
        "version": "1.0",
        "request": encode(json!({ "sample": { "segments": [] }, "gallery": [] })),
    });

    let (status, envelope) = post_envelope(app(), "/match", body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(envelope["response"], "");
    assert_eq!(envelope["errors"].as_array().unwrap().len(), 1);
    assert!(envelope["errors"][0]["message"]
        .as_str()
        .unwrap()
        .contains("engine crashed"));
}

#[tokio::test]
async fn malformed_payload_is_reported_in_envelope() {
    let body = json!({
        "version": "1.0",
        "request": STANDARD.encode("{ definitely not json"),
    });

    let (status, envelope) = post_envelope(app(), "/extract-template", body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(envelope["response"], "");
    assert_eq!(envelope["errors"][0]["code"], "UNCHECKED_EXCEPTION");
}

#[tokio::test]
async fn every_operation_route_is_served() {
    let api: Arc<dyn BioApi> = Arc::new(biosdk_service::backend::ReferenceBioApi::new());
    let request = encode(json!({
        "sample": {
            "segments": [{ "bdbInfo": { "type": ["FACE"] }, "bdb": "AAEC" }]
        },
        "gallery": [],
        "sourceFormat": "ISO19794_5_2011",
        "targetFormat": "IMAGE/JPEG"
    }));

    for operation in Operation::ALL {
        let body = json!({ "version": "1.0", "request": request });
        let (status, envelope) = post_envelope(app_with(api.clone()), operation.path(), body).await;

        assert_eq!(status, StatusCode::OK, "{}", operation.path());
        assert_eq!(envelope["errors"], json!([]), "{}", operation.path());
        assert_ne!(envelope["response"], "", "{}", operation.path());
    }
}

#[tokio::test]
async fn missing_envelope_fields_fail_inside_the_envelope() {
    let (status, envelope) = post_envelope(app(), "/segment", json!({})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(envelope["version"], "");
    assert_eq!(envelope["errors"][0]["code"], "BIO_SDK_001");
}

#[tokio::test]
async fn root_status_is_public() {
    let (status, text) = get_text(app(), "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(text.starts_with("Service is running..."));
}

#[tokio::test]
async fn role_status_requires_configured_role() {
    let (denied, _) = get_text(app(), "/s", None).await;
    assert_eq!(denied, StatusCode::FORBIDDEN);

    let (wrong, _) = get_text(app(), "/s", Some("RESIDENT")).await;
    assert_eq!(wrong, StatusCode::FORBIDDEN);

    let (allowed, text) = get_text(app(), "/s", Some("REGISTRATION_PROCESSOR")).await;
    assert_eq!(allowed, StatusCode::OK);
    assert!(text.starts_with("Service is running..."));
}

#[tokio::test]
async fn null_version_is_reported_in_envelope() {
    let body = json!({ "version": null, "request": "e30=" });

    let (status, envelope) = post_envelope(app(), "/init", body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(envelope["version"], "");
    assert_eq!(envelope["response"], "");
    assert_eq!(envelope["errors"][0]["code"], "BIO_SDK_001");
}

#[tokio::test]
async fn null_request_is_reported_in_envelope() {
    let body = json!({ "version": "1.0", "request": null });

    let (status, envelope) = post_envelope(app(), "/init", body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(envelope["response"], "");
    assert_eq!(envelope["errors"].as_array().unwrap().len(), 1);
    assert_eq!(envelope["errors"][0]["code"], "INVALID_REQUEST_BODY");
}

#[tokio::test]
async fn unpadded_request_is_accepted() {
    let body = json!({
        "version": "1.0",
        "request": STANDARD_NO_PAD.encode(json!({ "initParams": { "k": "v1" } }).to_string()),
    });

    let (status, envelope) = post_envelope(app(), "/init", body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(envelope["errors"], json!([]));
    assert_eq!(envelope["response"]["otherInfo"], json!({ "k": "v1" }));
}
