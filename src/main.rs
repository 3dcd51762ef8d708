/*!
 * Bio SDK Service
 * Front door for the configured biometric backend
 *
 * Startup:
 * - Parse configuration
 * - Build the backend and bind it to every supported protocol version
 * - Serve the envelope API
 */

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

use biosdk_service::dispatcher;
use biosdk_service::provider::bindings_for;
use biosdk_service::{
    backend, build_router, AppState, DiagnosticFormatter, Dispatcher, ProviderRegistry,
    ServiceConfig, ServiceError,
};

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("biosdk_service=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("biosdk_service=info"))
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<(), ServiceError> {
    let config = ServiceConfig::parse();
    init_tracing(config.verbose);
    dispatcher::install_panic_hook();

    info!("Starting Bio SDK service");

    if let Err(e) = run(config).await {
        error!("Bio SDK service stopped: {}", e);
        return Err(e);
    }
    Ok(())
}

async fn run(config: ServiceConfig) -> Result<(), ServiceError> {
    // No backend means no traffic: these fail before the listener is bound.
    let api = backend::create(&config.bioapi_impl)?;
    let registry = ProviderRegistry::builder()
        .register_all(bindings_for(api))?
        .build()?;

    let diagnostics = DiagnosticFormatter::new(config.log_request_response);
    if diagnostics.enabled() {
        info!("Request/response payload logging enabled");
    }

    let dispatcher = Dispatcher::new(Arc::new(registry), diagnostics);
    let app = build_router(AppState::new(dispatcher, config.status_roles.clone()));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Bio SDK service listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
