/*!
 * Configuration
 * Command-line flags with environment fallbacks
 */

use clap::Parser;

/// Versioned Bio SDK dispatch service
#[derive(Debug, Clone, Parser)]
#[command(name = "biosdk-service", version, about, long_about = None)]
pub struct ServiceConfig {
    /// Bio SDK implementation to load (e.g. "reference")
    #[arg(long, env = "BIOSDK_BIOAPI_IMPL", default_value = "")]
    pub bioapi_impl: String,

    /// Log redacted request/response payloads at debug level
    #[arg(long, env = "BIOSDK_LOG_REQUEST_RESPONSE")]
    pub log_request_response: bool,

    /// Bind address
    #[arg(long, env = "BIOSDK_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Listen port
    #[arg(long, env = "BIOSDK_PORT", default_value_t = 9099)]
    pub port: u16,

    /// Roles allowed to call GET /s
    #[arg(
        long,
        env = "BIOSDK_STATUS_ROLES",
        value_delimiter = ',',
        default_value = "REGISTRATION_PROCESSOR"
    )]
    pub status_roles: Vec<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServiceConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
