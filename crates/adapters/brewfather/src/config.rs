//! Brewfather client configuration.

use serde::Deserialize;

/// Credentials and endpoint of the Brewfather API.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrewfatherConfig {
    pub base_url: String,
    pub user_id: String,
    pub api_key: String,
    pub request_timeout_secs: u64,
}

impl Default for BrewfatherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.brewfather.app/v1".to_string(),
            user_id: String::new(),
            api_key: String::new(),
            request_timeout_secs: 30,
        }
    }
}

impl BrewfatherConfig {
    /// Whether both credentials are filled in.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.user_id.trim().is_empty() && !self.api_key.trim().is_empty()
    }
}
