//! Configuration types for xrt-prods

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Server script names, relative to [`ClientConfig::base_url`]
///
/// Used as a nested sub-config within [`ClientConfig`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Job submission (default: "run_userobject.php")
    #[serde(default = "default_submit")]
    pub submit: String,

    /// Product status query (default: "checkProductStatus.php")
    #[serde(default = "default_status")]
    pub status: String,

    /// Product cancellation (default: "cancelProducts.php")
    #[serde(default = "default_cancel")]
    pub cancel: String,

    /// Active job count for a user (default: "countActiveJobs.php")
    #[serde(default = "default_count_jobs")]
    pub count_jobs: String,

    /// Previous jobs for a user (default: "listOldJobs.php")
    #[serde(default = "default_old_jobs")]
    pub old_jobs: String,

    /// Stored parameters of a previous job (default: "getJobPars.php")
    #[serde(default = "default_clone_job")]
    pub clone_job: String,

    /// Position results (default: "getPosition.php")
    #[serde(default = "default_position")]
    pub position: String,

    /// Source detection results (default: "getSourceList.php")
    #[serde(default = "default_source_list")]
    pub source_list: String,

    /// Directory holding per-job product archives (default: "tprods/")
    #[serde(default = "default_archives")]
    pub archives: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            submit: default_submit(),
            status: default_status(),
            cancel: default_cancel(),
            count_jobs: default_count_jobs(),
            old_jobs: default_old_jobs(),
            clone_job: default_clone_job(),
            position: default_position(),
            source_list: default_source_list(),
            archives: default_archives(),
        }
    }
}

/// Main configuration for the HTTP job gateway
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the job server (default: "https://www.swift.ac.uk/user_objects/")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (default: 60 seconds)
    #[serde(default = "default_timeout", with = "duration_serde")]
    pub timeout: Duration,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// API version announced to the server on submission
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Server script names
    #[serde(default)]
    pub endpoints: EndpointConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout: default_timeout(),
            user_agent: default_user_agent(),
            api_version: default_api_version(),
            endpoints: EndpointConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Create a configuration pointing at a different server, keeping all other defaults
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Check that the configuration is usable
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the base URL cannot be parsed or the timeout is zero.
    pub fn validate(&self) -> Result<()> {
        self.base()?;
        if self.timeout.is_zero() {
            return Err(Error::Config {
                message: "timeout must be greater than zero".to_string(),
                key: Some("timeout".to_string()),
            });
        }
        Ok(())
    }

    /// Parsed base URL, always ending in '/' so that endpoints join beneath it
    pub(crate) fn base(&self) -> Result<url::Url> {
        let mut raw = self.base_url.clone();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        url::Url::parse(&raw).map_err(|e| Error::Config {
            message: format!("invalid base URL '{}': {}", self.base_url, e),
            key: Some("base_url".to_string()),
        })
    }

    /// Full URL of a server script
    pub(crate) fn endpoint(&self, script: &str) -> Result<url::Url> {
        self.base()?.join(script).map_err(|e| Error::Config {
            message: format!("invalid endpoint '{}': {}", script, e),
            key: Some("endpoints".to_string()),
        })
    }
}

fn default_base_url() -> String {
    "https://www.swift.ac.uk/user_objects/".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_user_agent() -> String {
    format!("xrt-prods/{}", env!("CARGO_PKG_VERSION"))
}

fn default_api_version() -> String {
    "1.10".to_string()
}

fn default_submit() -> String {
    "run_userobject.php".to_string()
}

fn default_status() -> String {
    "checkProductStatus.php".to_string()
}

fn default_cancel() -> String {
    "cancelProducts.php".to_string()
}

fn default_count_jobs() -> String {
    "countActiveJobs.php".to_string()
}

fn default_old_jobs() -> String {
    "listOldJobs.php".to_string()
}

fn default_clone_job() -> String {
    "getJobPars.php".to_string()
}

fn default_position() -> String {
    "getPosition.php".to_string()
}

fn default_source_list() -> String {
    "getSourceList.php".to_string()
}

fn default_archives() -> String {
    "tprods/".to_string()
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default_survives_json_round_trip() {
        let config = ClientConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: ClientConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn empty_document_yields_defaults() {
        let config: ClientConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn timeout_serializes_as_seconds() {
        let config = ClientConfig {
            timeout: Duration::from_secs(15),
            ..Default::default()
        };
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["timeout"], 15);
    }

    #[test]
    fn endpoint_joins_below_base_without_trailing_slash() {
        let config = ClientConfig::with_base_url("http://localhost:8080/api");
        let url = config.endpoint("checkProductStatus.php").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/checkProductStatus.php");
    }

    #[test]
    fn validate_rejects_bad_base_url() {
        let config = ClientConfig::with_base_url("not a url");
        match config.validate() {
            Err(Error::Config { key, .. }) => assert_eq!(key.as_deref(), Some("base_url")),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let config = ClientConfig {
            timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(Error::Config { key: Some(ref k), .. }) if k == "timeout"
        ));
    }
}
