//! One-call-per-operation client that performs the HTTP round-trip itself.
//!
//! # Design
//! `BlockingClient` is `AquaClient` plus a `Transport`. Each method builds
//! the request, hands it to the transport exactly once and parses the
//! result. There are no retries and no caching; errors surface unchanged.
//! The client holds no per-call state, so one instance can be shared
//! across threads.

use tracing::debug;

use crate::client::AquaClient;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::{Transport, UreqTransport};
use crate::types::{Revision, RevisionHash, RevisionInfo, ServerInfo};

#[derive(Debug, Clone)]
pub struct BlockingClient<T = UreqTransport> {
    client: AquaClient,
    transport: T,
}

impl BlockingClient<UreqTransport> {
    /// Fails with `AquaError::Config` if `endpoint` is not a valid URL.
    pub fn new(endpoint: &str, token: &str) -> Result<Self> {
        Ok(Self::with_transport(
            AquaClient::new(endpoint, token)?,
            UreqTransport::new(),
        ))
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let client = AquaClient::new(&config.endpoint, &config.token)?;
        Ok(Self::with_transport(
            client,
            UreqTransport::with_config(&config.transport_config()),
        ))
    }
}

impl<T: Transport> BlockingClient<T> {
    pub fn with_transport(client: AquaClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &AquaClient {
        &self.client
    }

    /// Context of the chain identified by its genesis hash or its title.
    ///
    /// `id_type` must be `"genesis_hash"` or `"title"`; anything else fails
    /// with `AquaError::InvalidArgument` without contacting the server.
    pub fn get_hash_chain_info(&self, id_type: &str, id: &str) -> Result<RevisionInfo> {
        let request = self.client.build_get_hash_chain_info(id_type, id)?;
        self.client.parse_get_hash_chain_info(self.send(&request)?)
    }

    /// Hashes of the revisions newer than `verification_hash`, oldest
    /// first. Empty when `verification_hash` is the latest revision.
    pub fn get_revision_hashes(&self, verification_hash: &str) -> Result<Vec<RevisionHash>> {
        let request = self.client.build_get_revision_hashes(verification_hash)?;
        self.client.parse_get_revision_hashes(self.send(&request)?)
    }

    pub fn get_revision(&self, verification_hash: &str) -> Result<Revision> {
        let request = self.client.build_get_revision(verification_hash)?;
        self.client.parse_get_revision(self.send(&request)?)
    }

    pub fn get_server_info(&self) -> Result<ServerInfo> {
        let request = self.client.build_get_server_info()?;
        self.client.parse_get_server_info(self.send(&request)?)
    }

    fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        debug!(method = request.method.as_str(), url = %request.url, "sending aqua request");
        let response = self.transport.execute(request)?;
        debug!(status = response.status, bytes = response.body.len(), "aqua response received");
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use assert_matches::assert_matches;

    use super::*;
    use crate::error::AquaError;

    /// Replays canned responses and records every request it sees.
    struct ScriptedTransport {
        responses: Mutex<Vec<HttpResponse>>,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<HttpResponse>) -> Self {
            Self {
                responses: Mutex::new(responses),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn seen(&self) -> Vec<HttpRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl Transport for ScriptedTransport {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
            self.seen.lock().unwrap().push(request.clone());
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                let err = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "no more responses");
                return Err(AquaError::Transport(Box::new(err)));
            }
            Ok(responses.remove(0))
        }
    }

    fn respond(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    fn client_with(transport: &ScriptedTransport) -> BlockingClient<&ScriptedTransport> {
        let client = AquaClient::new("http://aqua.test", "tok").unwrap();
        BlockingClient::with_transport(client, transport)
    }

    #[test]
    fn get_server_info_issues_one_authenticated_request() {
        let transport = ScriptedTransport::new(vec![respond(200, r#"{"api_version":"0.3.0"}"#)]);
        let info = client_with(&transport).get_server_info().unwrap();
        assert_eq!(info.api_version, "0.3.0");

        let seen = transport.seen();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].url, "http://aqua.test/data_accounting/get_server_info");
        assert_eq!(seen[0].header("Authorization"), Some("Bearer tok"));
    }

    #[test]
    fn invalid_id_type_never_reaches_the_transport() {
        let transport = ScriptedTransport::new(Vec::new());
        let err = client_with(&transport)
            .get_hash_chain_info("page_id", "1")
            .unwrap_err();
        assert_matches!(err, AquaError::InvalidArgument(_));
        assert!(transport.seen().is_empty());
    }

    #[test]
    fn non_200_is_not_retried() {
        let transport = ScriptedTransport::new(vec![
            respond(502, "bad gateway"),
            respond(200, "[]"),
        ]);
        let err = client_with(&transport).get_revision_hashes("aa01").unwrap_err();
        assert_eq!(err.status(), Some(502));
        assert_eq!(transport.seen().len(), 1);
    }

    #[test]
    fn transport_failures_pass_through() {
        let transport = ScriptedTransport::new(Vec::new());
        let err = client_with(&transport).get_revision("aa01").unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn tip_of_chain_has_no_newer_hashes() {
        let transport = ScriptedTransport::new(vec![respond(200, "[]")]);
        let hashes = client_with(&transport).get_revision_hashes("cc03").unwrap();
        assert!(hashes.is_empty());
    }

    #[test]
    fn client_is_shareable_across_threads() {
        fn assert_send_sync<S: Send + Sync>() {}
        assert_send_sync::<BlockingClient>();
    }
}
