//! # Client configuration — `client.toml`
//!
//! Defines the TOML configuration the client reads at startup
//! (filename: [`ClientConfig::filename`] = `"client.toml"`).
//!
//! ## Structure
//!
//! ```toml
//! [api]
//! base_url = "http://localhost:8080/api"   # reverse-proxied backend base
//! request_timeout_secs = 20                # sign-in and comment fetches
//!
//! [mutations]
//! timeout_secs = 15                        # optimistic mutation deadline
//!
//! [session]
//! expiry_poll_secs = 30                    # upper bound between expiry checks
//! ```
//!
//! ## Types
//!
//! | Struct | Purpose |
//! |--------|---------|
//! | [`ClientConfig`] | Top-level config with builder helpers and TOML (de)serialisation. |
//! | [`ApiConfig`] | Backend base URL and the timeout for non-optimistic requests. |
//! | [`MutationConfig`] | Deadline after which a pending optimistic mutation is rolled back. |
//! | [`SessionConfig`] | How often the UI re-checks the live session's expiry. |
//!
//! Every section has production defaults, so a missing or empty file is
//! equivalent to the default configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level configuration stored in `client.toml`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub mutations: MutationConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// Backend access configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL the reverse proxy forwards to the backend origin.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Deadline for sign-in and comment fetches, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_request_timeout() -> u64 {
    20
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Optimistic mutation configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MutationConfig {
    /// Seconds a mutation may stay pending before it is rolled back.
    #[serde(default = "default_mutation_timeout")]
    pub timeout_secs: u64,
}

fn default_mutation_timeout() -> u64 {
    15
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_mutation_timeout(),
        }
    }
}

/// Session watch configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_expiry_poll")]
    pub expiry_poll_secs: u64,
}

fn default_expiry_poll() -> u64 {
    30
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            expiry_poll_secs: default_expiry_poll(),
        }
    }
}

impl ClientConfig {
    /// Create a config pointing at the given backend base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            api: ApiConfig {
                base_url: base_url.into(),
                ..ApiConfig::default()
            },
            ..Self::default()
        }
    }

    /// Builder method to set the optimistic mutation deadline.
    pub fn with_mutation_timeout(mut self, secs: u64) -> Self {
        self.mutations.timeout_secs = secs;
        self
    }

    /// Builder method to set the sign-in / fetch deadline.
    pub fn with_request_timeout(mut self, secs: u64) -> Self {
        self.api.request_timeout_secs = secs;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_secs)
    }

    pub fn mutation_timeout(&self) -> Duration {
        Duration::from_secs(self.mutations.timeout_secs)
    }

    pub fn expiry_poll(&self) -> Duration {
        Duration::from_secs(self.session.expiry_poll_secs)
    }

    /// The well-known filename for the config file.
    pub fn filename() -> &'static str {
        "client.toml"
    }

    /// Parse from TOML string.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Serialize to TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_default() {
        let config = ClientConfig::from_toml("").unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.mutation_timeout(), Duration::from_secs(15));
        assert_eq!(config.request_timeout(), Duration::from_secs(20));
    }

    #[test]
    fn test_partial_sections() {
        let config = ClientConfig::from_toml(
            r#"
            [api]
            base_url = "https://clinic.example/api"

            [mutations]
            timeout_secs = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.api.base_url, "https://clinic.example/api");
        assert_eq!(config.api.request_timeout_secs, 20);
        assert_eq!(config.mutations.timeout_secs, 5);
        assert_eq!(config.session.expiry_poll_secs, 30);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = ClientConfig::new("http://proxy/api")
            .with_mutation_timeout(3)
            .with_request_timeout(7);
        let text = config.to_toml().unwrap();
        assert_eq!(ClientConfig::from_toml(&text).unwrap(), config);
    }
}
