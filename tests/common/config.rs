//! Test configuration helpers: mock servers, gateways and live credentials

use std::sync::Arc;
use wiremock::MockServer;
use xrt_prods::{ClientConfig, HttpGateway, JobGateway};

/// Error type for test configuration
#[derive(Debug)]
pub struct ConfigError(pub String);

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Config error: {}", self.0)
    }
}

impl std::error::Error for ConfigError {}

/// HTTP gateway pointed at a mock server
pub fn mock_gateway(server: &MockServer) -> Arc<dyn JobGateway> {
    Arc::new(HttpGateway::new(ClientConfig::with_base_url(server.uri())).unwrap())
}

/// Live settings loaded from the environment
///
/// Required environment variables:
/// - `XRT_USER_ID` - Registered user ID (email address)
///
/// Optional environment variables:
/// - `XRT_BASE_URL` - Job server base URL (default: the public server)
pub struct LiveSettings {
    pub user_id: String,
    pub config: ClientConfig,
}

pub fn load_live_settings() -> Result<LiveSettings, ConfigError> {
    dotenvy::dotenv().ok();

    let user_id = std::env::var("XRT_USER_ID")
        .map_err(|_| ConfigError("XRT_USER_ID not set in environment".to_string()))?;

    let config = match std::env::var("XRT_BASE_URL") {
        Ok(url) => ClientConfig::with_base_url(url),
        Err(_) => ClientConfig::default(),
    };
    config
        .validate()
        .map_err(|e| ConfigError(e.to_string()))?;

    Ok(LiveSettings { user_id, config })
}

/// Whether live settings are available
pub fn has_live_user() -> bool {
    load_live_settings().is_ok()
}
