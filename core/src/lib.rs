//! Typed client for the Aqua data-accounting protocol.
//!
//! # Overview
//! Fetches hash-chain context, revision hash lists, full revisions and
//! server info from an Aqua server and decodes them into typed records.
//! Verifying the hashes, signatures and witnesses is left to the caller.
//!
//! # Design
//! - `AquaClient` is sans-IO: `build_*` produces an `HttpRequest`,
//!   `parse_*` consumes an `HttpResponse`. It holds only the base endpoint
//!   and bearer token.
//! - `BlockingClient` pairs it with a `Transport` (by default
//!   `UreqTransport`) and exposes one method per protocol operation.
//! - Every operation yields a fully decoded value or one `AquaError`;
//!   nothing is retried or cached.
//! - Timestamps use the fixed `YYYYMMDDHHMMSS` wire layout, read as UTC.

pub mod blocking;
pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod timestamp;
pub mod transport;
pub mod types;

pub use blocking::BlockingClient;
pub use client::AquaClient;
pub use config::ClientConfig;
pub use endpoint::{Endpoint, IdType};
pub use error::{AquaError, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use timestamp::Timestamp;
pub use transport::{Transport, TransportConfig, UreqTransport};
pub use types::{
    ContentData, Namespace, Revision, RevisionContent, RevisionHash, RevisionInfo,
    RevisionMerkleTreeProof, RevisionMetadata, RevisionSignature, RevisionWitness, ServerInfo,
    SiteInfo, VerificationContext,
};
