//! Stateless HTTP request builder and response parser for the Aqua API.
//!
//! # Design
//! `AquaClient` holds only the parsed base endpoint and the bearer token,
//! both fixed at construction. Each operation is split into a `build_*`
//! method that produces an `HttpRequest` and a `parse_*` method that
//! consumes an `HttpResponse`. The caller (or `BlockingClient`) executes
//! the round-trip in between, keeping this type deterministic and free of
//! I/O dependencies.

use std::fmt;

use serde::de::DeserializeOwned;
use url::Url;

use crate::endpoint::{Endpoint, IdType};
use crate::error::{AquaError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::timestamp::decode_body;
use crate::types::{Revision, RevisionHash, RevisionInfo, ServerInfo};

/// Synchronous, stateless client for the Aqua `data_accounting` API.
#[derive(Clone)]
pub struct AquaClient {
    endpoint: Url,
    token: String,
}

impl fmt::Debug for AquaClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AquaClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("token", &"<redacted>")
            .finish()
    }
}

impl AquaClient {
    /// Checks only that `endpoint` is a syntactically valid URL. The token
    /// is sent as given.
    pub fn new(endpoint: &str, token: &str) -> Result<Self> {
        let parsed = Url::parse(endpoint).map_err(|e| {
            AquaError::Config(format!("endpoint {endpoint:?} is not a valid URL: {e}"))
        })?;
        Ok(Self {
            endpoint: parsed,
            token: token.to_string(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Fails with `InvalidArgument` unless `id_type` is `genesis_hash` or
    /// `title`.
    pub fn build_get_hash_chain_info(&self, id_type: &str, id: &str) -> Result<HttpRequest> {
        let id_type: IdType = id_type.parse()?;
        self.build(Endpoint::HashChainInfo { id_type, id })
    }

    pub fn build_get_revision_hashes(&self, verification_hash: &str) -> Result<HttpRequest> {
        self.build(Endpoint::RevisionHashes { verification_hash })
    }

    pub fn build_get_revision(&self, verification_hash: &str) -> Result<HttpRequest> {
        self.build(Endpoint::Revision { verification_hash })
    }

    pub fn build_get_server_info(&self) -> Result<HttpRequest> {
        self.build(Endpoint::ServerInfo)
    }

    pub fn parse_get_hash_chain_info(&self, response: HttpResponse) -> Result<RevisionInfo> {
        decode(response)
    }

    /// An empty list means no revision is newer than the one requested.
    pub fn parse_get_revision_hashes(&self, response: HttpResponse) -> Result<Vec<RevisionHash>> {
        decode(response)
    }

    pub fn parse_get_revision(&self, response: HttpResponse) -> Result<Revision> {
        decode(response)
    }

    pub fn parse_get_server_info(&self, response: HttpResponse) -> Result<ServerInfo> {
        decode(response)
    }

    fn build(&self, endpoint: Endpoint<'_>) -> Result<HttpRequest> {
        let url = endpoint.url(&self.endpoint)?;
        Ok(HttpRequest {
            method: HttpMethod::Get,
            url: url.into(),
            headers: vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("Authorization".to_string(), format!("Bearer {}", self.token)),
            ],
        })
    }
}

/// Anything but 200 is an error, whatever the body says.
fn check_status(response: HttpResponse) -> Result<HttpResponse> {
    if response.status == 200 {
        return Ok(response);
    }
    tracing::warn!(status = response.status, "aqua server rejected request");
    Err(AquaError::Protocol {
        status: response.status,
        response,
    })
}

fn decode<T: DeserializeOwned>(response: HttpResponse) -> Result<T> {
    let response = check_status(response)?;
    decode_body(&response.body).map_err(|e| {
        tracing::warn!(error = %e, "aqua response did not match the expected shape");
        e
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn client() -> AquaClient {
        AquaClient::new("http://localhost:9352", "s3cret").unwrap()
    }

    fn ok(body: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn build_get_hash_chain_info_produces_correct_request() {
        for id_type in ["genesis_hash", "title"] {
            let req = client().build_get_hash_chain_info(id_type, "Main_Page").unwrap();
            assert_eq!(req.method, HttpMethod::Get);
            assert_eq!(
                req.url,
                format!("http://localhost:9352/data_accounting/get_hash_chain_info/{id_type}/Main_Page")
            );
        }
    }

    #[test]
    fn build_get_hash_chain_info_rejects_unknown_id_type() {
        let err = client().build_get_hash_chain_info("rev_id", "1").unwrap_err();
        assert_matches!(err, AquaError::InvalidArgument(_));
    }

    #[test]
    fn build_get_revision_hashes_produces_correct_request() {
        let req = client().build_get_revision_hashes("abc123").unwrap();
        assert_eq!(req.url, "http://localhost:9352/data_accounting/get_revision_hashes/abc123");
    }

    #[test]
    fn build_get_revision_produces_correct_request() {
        let req = client().build_get_revision("abc123").unwrap();
        assert_eq!(req.url, "http://localhost:9352/data_accounting/get_revision/abc123");
    }

    #[test]
    fn build_get_server_info_produces_correct_request() {
        let req = client().build_get_server_info().unwrap();
        assert_eq!(req.url, "http://localhost:9352/data_accounting/get_server_info");
    }

    #[test]
    fn requests_carry_json_and_bearer_headers() {
        let req = client().build_get_server_info().unwrap();
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.header("authorization"), Some("Bearer s3cret"));
    }

    #[test]
    fn trailing_slash_is_ignored() {
        let client = AquaClient::new("http://localhost:9352/", "t").unwrap();
        let req = client.build_get_server_info().unwrap();
        assert_eq!(req.url, "http://localhost:9352/data_accounting/get_server_info");
    }

    #[test]
    fn invalid_endpoint_is_a_config_error() {
        for endpoint in ["", "not a url", "http://", "://missing-scheme"] {
            assert_matches!(AquaClient::new(endpoint, "t"), Err(AquaError::Config(_)), "{endpoint:?}");
        }
    }

    #[test]
    fn debug_output_hides_the_token() {
        let rendered = format!("{:?}", client());
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("localhost:9352"));
    }

    #[test]
    fn parse_get_server_info_success() {
        let info = client().parse_get_server_info(ok(r#"{"api_version":"0.3.0"}"#)).unwrap();
        assert_eq!(info.api_version, "0.3.0");
    }

    #[test]
    fn parse_get_revision_hashes_empty_list() {
        let hashes = client().parse_get_revision_hashes(ok("[]")).unwrap();
        assert!(hashes.is_empty());
    }

    #[test]
    fn parse_get_revision_hashes_keeps_order() {
        let hashes = client()
            .parse_get_revision_hashes(ok(r#"["bb02","cc03","dd04"]"#))
            .unwrap();
        let hashes: Vec<&str> = hashes.iter().map(RevisionHash::as_str).collect();
        assert_eq!(hashes, vec!["bb02", "cc03", "dd04"]);
    }

    #[test]
    fn non_200_is_a_protocol_error_even_with_valid_body() {
        for status in [201, 204, 301, 401, 404, 500] {
            let response = HttpResponse {
                status,
                headers: vec![("X-Trace".to_string(), "abc".to_string())],
                body: r#"{"api_version":"0.3.0"}"#.to_string(),
            };
            let err = client().parse_get_server_info(response).unwrap_err();
            assert_matches!(err, AquaError::Protocol { status: s, ref response } => {
                assert_eq!(s, status);
                assert_eq!(response.header("x-trace"), Some("abc"));
            });
        }
    }

    #[test]
    fn parse_bad_json_is_a_decode_error() {
        let err = client().parse_get_revision(ok("not json")).unwrap_err();
        assert_matches!(err, AquaError::Decode(_));
    }

    #[test]
    fn parse_bad_timestamp_is_a_format_error() {
        let body = r#"{
            "context": {"has_previous_signature": false, "has_previous_witness": false},
            "content": {
                "rev_id": 1,
                "content": {"main": "x", "transclusion-hashes": "[]"},
                "content_hash": "c0"
            },
            "metadata": {
                "domain_id": "d",
                "time_stamp": "2024-01-15",
                "previous_verification_hash": "",
                "metadata_hash": "m",
                "verification_hash": "v"
            }
        }"#;
        let err = client().parse_get_revision(ok(body)).unwrap_err();
        assert_matches!(err, AquaError::Format(_));
    }

    #[test]
    fn parse_wrong_shape_is_a_decode_error() {
        let err = client().parse_get_revision_hashes(ok(r#"{"hashes":[]}"#)).unwrap_err();
        assert_matches!(err, AquaError::Decode(_));
    }
}
