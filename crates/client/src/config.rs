//! Configuration for the Kirha client.

use kirha_core::{GatewayError, GatewayResult};
use std::time::Duration;
use url::Url;

/// Production API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.kirha.ai";

/// Per-request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Configuration for the Kirha client. Loaded once at startup.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API key sent as a bearer token.
    pub api_key: String,
    /// Vertical the tool catalog is scoped to.
    pub vertical_id: String,
    /// Base URL of the Kirha API.
    pub base_url: Url,
    /// Timeout for each request.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Check that the configuration can be used to reach the API.
    pub fn validate(&self) -> GatewayResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(GatewayError::ApiKeyMissing);
        }

        if self.vertical_id.trim().is_empty() {
            return Err(GatewayError::VerticalMissing);
        }

        if self.timeout.is_zero() {
            return Err(GatewayError::InvalidTimeout);
        }

        Ok(())
    }
}
