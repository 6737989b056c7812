//! Spark client configuration.

use serde::Deserialize;

/// Where the Spark service lives.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SparkConfig {
    /// Base URL of the brewblox host, without the service segment.
    pub base_url: String,
    /// Service pinged for readiness.
    pub service_id: String,
    pub request_timeout_secs: u64,
}

impl Default for SparkConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost".to_string(),
            service_id: "spark-one".to_string(),
            request_timeout_secs: 10,
        }
    }
}
