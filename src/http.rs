/*!
 * HTTP surface
 * Status endpoints plus one POST route per operation. Domain failures are
 * always HTTP 200 with the error in the envelope.
 */

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::dispatcher::{Dispatcher, Operation};
use crate::envelope::{RequestEnvelope, ResponseEnvelope};
use crate::error::ServiceError;

/// Header the upstream gateway uses to pass the caller's roles.
pub const ROLES_HEADER: &str = "x-user-roles";

#[derive(Clone)]
pub struct AppState {
    dispatcher: Arc<Dispatcher>,
    status_roles: Arc<Vec<String>>,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher, status_roles: Vec<String>) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            status_roles: Arc::new(status_roles),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let guarded = Router::new()
        .route("/s", get(status))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_status_role,
        ));

    let mut router = Router::new().route("/", get(status)).merge(guarded);

    for operation in Operation::ALL {
        router = router.route(
            operation.path(),
            post(
                move |State(state): State<AppState>, Json(request): Json<RequestEnvelope>| async move {
                    handle_operation(state, operation, request).await
                },
            ),
        );
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn status() -> String {
    format!(
        "Service is running... {}",
        Utc::now().format("%a %b %d %H:%M:%S UTC %Y")
    )
}

async fn handle_operation(
    state: AppState,
    operation: Operation,
    request: RequestEnvelope,
) -> Json<ResponseEnvelope> {
    info!("{} request: version={}", operation.name(), request.version);

    // Backend calls block; keep them off the async workers.
    let dispatcher = state.dispatcher.clone();
    let version = request.version.clone();
    let result =
        tokio::task::spawn_blocking(move || dispatcher.dispatch(operation, &request)).await;

    let envelope = match result {
        Ok(envelope) => envelope,
        Err(e) => {
            error!("{}: dispatch task failed: {}", operation.name(), e);
            let mut envelope = ResponseEnvelope::template(&version);
            envelope.fail(&ServiceError::BackendLibrary(e.to_string()));
            envelope
        }
    };

    Json(envelope)
}

async fn require_status_role(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let allowed = request
        .headers()
        .get(ROLES_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|roles| has_any_role(roles, &state.status_roles))
        .unwrap_or(false);

    if !allowed {
        warn!("Rejected status request without an authorized role");
        return StatusCode::FORBIDDEN.into_response();
    }

    next.run(request).await
}

/// Comma-separated roles; a `ROLE_` prefix is ignored.
fn has_any_role(header: &str, allowed: &[String]) -> bool {
    header
        .split(',')
        .map(|role| role.trim())
        .map(|role| role.strip_prefix("ROLE_").unwrap_or(role))
        .any(|role| allowed.iter().any(|allowed| allowed == role))
}
