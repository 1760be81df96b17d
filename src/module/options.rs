//! Client options.
//!
//! Options are a serde struct so they can come from code, from a TOML file,
//! or from an async options factory.
//!
//! ```toml
//! name = "edge"
//! fleet = ["gts-ws", "gts-staging"]
//!
//! [upstream]
//! url = "mqtt://broker.local:1883"
//! username = "edge"
//! password = "secret"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::DEFAULT_CLIENT_NAME;
use crate::error::{GatewayError, Result};

/// Options for constructing the network client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientOptions {
    /// Client name; one client instance exists per name.
    #[serde(default = "default_name")]
    pub name: String,

    /// Upstream broker connection.
    #[serde(default)]
    pub upstream: UpstreamOptions,

    /// Execution engines the client follows.
    #[serde(default)]
    pub fleet: Vec<String>,

    /// Client-specific keys, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Upstream broker connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamOptions {
    #[serde(default = "default_upstream_url")]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

fn default_name() -> String {
    DEFAULT_CLIENT_NAME.to_string()
}

fn default_upstream_url() -> String {
    "mqtt://localhost:1883".to_string()
}

impl Default for UpstreamOptions {
    fn default() -> Self {
        Self {
            url: default_upstream_url(),
            username: None,
            password: None,
            client_id: None,
        }
    }
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            name: default_name(),
            upstream: UpstreamOptions::default(),
            fleet: Vec::new(),
            extra: Map::new(),
        }
    }
}

impl ClientOptions {
    /// Parse options from TOML.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Load options from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Replace the client name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Reject options no client can be built from.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(GatewayError::InvalidConfig(
                "client name must not be empty".to_string(),
            ));
        }
        if self.upstream.url.trim().is_empty() {
            return Err(GatewayError::InvalidConfig(
                "upstream url must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
