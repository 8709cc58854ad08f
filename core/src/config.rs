//! Client settings loaded from the environment.
//!
//! # Design
//! `ClientConfig` carries the endpoint, bearer token and optional request
//! timeout that `BlockingClient::from_config` needs. `from_env` reads:
//!
//! | Env Var             | Default     |
//! |---------------------|-------------|
//! | `AQUA_ENDPOINT`     | required    |
//! | `AQUA_TOKEN`        | empty       |
//! | `AQUA_TIMEOUT_SECS` | no timeout  |
//!
//! Missing or unparsable values are `AquaError::Config`. The token never
//! appears in `Debug` output.

use std::fmt;
use std::time::Duration;

use crate::error::{AquaError, Result};
use crate::transport::TransportConfig;

/// Session settings supplied by whoever bootstraps the client.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the Aqua server, e.g. `http://localhost:9352`.
    pub endpoint: String,
    /// Bearer token sent with every request.
    pub token: String,
    /// Per-request timeout; `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: token.into(),
            timeout: None,
        }
    }

    /// Load configuration from the variables listed in the module docs.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let endpoint = lookup("AQUA_ENDPOINT")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AquaError::Config("AQUA_ENDPOINT must be set".into()))?;
        let token = lookup("AQUA_TOKEN").unwrap_or_default();
        let timeout = lookup("AQUA_TIMEOUT_SECS")
            .map(|raw| {
                raw.trim().parse::<u64>().map(Duration::from_secs).map_err(|e| {
                    AquaError::Config(format!("AQUA_TIMEOUT_SECS {raw:?} is not a number of seconds: {e}"))
                })
            })
            .transpose()?;
        Ok(Self {
            endpoint,
            token,
            timeout,
        })
    }

    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            timeout: self.timeout,
        }
    }
}
