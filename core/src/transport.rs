//! Executing `HttpRequest`s.
//!
//! `Transport` is the seam between the sans-IO client and the network.
//! `UreqTransport` is the blocking implementation used by default; tests
//! and embedders can plug in their own.

use std::time::Duration;

use crate::error::{AquaError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Performs one HTTP round-trip.
///
/// Implementations return every response that arrived, whatever its status;
/// status interpretation belongs to the client. An `Err` means no response
/// was obtained and should be an `AquaError::Transport`.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        (**self).execute(request)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportConfig {
    /// Upper bound for a whole request, connect to last body byte.
    /// `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

/// Blocking transport backed by a `ureq` agent.
///
/// The agent keeps ureq's default connection pool and never turns 4xx/5xx
/// into errors, so non-200 responses reach the client as data.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self::with_config(&TransportConfig::default())
    }

    pub fn with_config(config: &TransportConfig) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(config.timeout)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let mut builder = match request.method {
            HttpMethod::Get => self.agent.get(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let mut response = builder.call().map_err(transport_error)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(transport_error)?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn transport_error(err: ureq::Error) -> AquaError {
    AquaError::Transport(Box::new(err))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn refused_connection_is_a_transport_error() {
        // Bind then drop to get a port with nothing listening on it.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let transport = UreqTransport::with_config(&TransportConfig {
            timeout: Some(Duration::from_secs(5)),
        });
        let request = HttpRequest {
            method: HttpMethod::Get,
            url: format!("http://127.0.0.1:{port}/data_accounting/get_server_info"),
            headers: Vec::new(),
        };
        let err = transport.execute(&request).unwrap_err();
        assert_matches!(err, AquaError::Transport(_));
        assert!(err.is_retryable());
    }
}
