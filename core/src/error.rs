//! Error types for the Aqua protocol client.
//!
//! # Design
//! Every operation returns either a fully decoded value or exactly one
//! `AquaError`. The variants are kept distinguishable so a caller can decide
//! what to do next: retry (`Transport`), fix its setup (`Config`), fix the
//! call site (`InvalidArgument`), or give up on a server that speaks a
//! different protocol version (`Protocol`, `Decode`, `Format`).

use crate::http::HttpResponse;

/// Errors returned by the client, the transport and the timestamp adapter.
#[derive(Debug, thiserror::Error)]
pub enum AquaError {
    /// The endpoint is not a usable URL, or a request URL could not be
    /// composed from it.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The caller passed a value outside the accepted set, e.g. an unknown
    /// hash-chain id type. Raised before any network access.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The request never produced an HTTP response (connection refused,
    /// timeout, TLS failure, unreadable body).
    #[error("transport failure: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The server answered with something other than 200 OK. The raw
    /// response is kept whole for diagnostics; `Display` shows only the
    /// start of the body.
    #[error("unexpected HTTP status {status}: {}", body_preview(.response))]
    Protocol { status: u16, response: HttpResponse },

    /// The response body did not match the expected record shape.
    #[error("response body could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    /// A value did not match its fixed textual layout.
    #[error("malformed value: {0}")]
    Format(String),
}

impl AquaError {
    /// Only transport failures are worth retrying as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AquaError::Transport(_))
    }

    /// HTTP status of a `Protocol` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            AquaError::Protocol { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T, E = AquaError> = std::result::Result<T, E>;

const BODY_PREVIEW_LEN: usize = 256;

fn body_preview(response: &HttpResponse) -> String {
    let body = response.body.as_str();
    if body.len() <= BODY_PREVIEW_LEN {
        return body.to_string();
    }
    let mut end = BODY_PREVIEW_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... ({} bytes)", &body[..end], body.len())
}
