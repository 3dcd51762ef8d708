/*!
 * Bio SDK Service
 * Versioned dispatch of base64-enveloped requests to a pluggable biometric backend
 *
 * Handles:
 * - Provider resolution by protocol version
 * - Envelope decoding and typed request parsing
 * - Backend fault normalization into a uniform response envelope
 * - Redacted payload diagnostics
 */

pub mod backend;
pub mod codec;
pub mod config;
pub mod diagnostics;
pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod http;
pub mod model;
pub mod provider;
pub mod request;

pub use config::ServiceConfig;
pub use diagnostics::DiagnosticFormatter;
pub use dispatcher::{Dispatcher, Operation};
pub use envelope::{ErrorEntry, RequestEnvelope, ResponseEnvelope};
pub use error::{BackendError, ServiceError, ServiceResult};
pub use http::{build_router, AppState};
pub use provider::{BioApi, ProviderBinding, ProviderRegistry};
