//! Records returned by the Aqua `data_accounting` endpoints.
//!
//! # Design
//! These are immutable value types decoded straight from response bodies.
//! Field names follow Rust conventions; `#[serde(rename)]` maps them to the
//! wire names. Records are defined independently from the mock-server
//! crate so the integration tests catch schema drift between the two.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AquaError, Result};
use crate::timestamp::Timestamp;

/// Response of `get_server_info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub api_version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    #[serde(rename = "case")]
    pub case_sensitive: bool,
    pub title: String,
}

/// Identity of the wiki-style site hosting a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteInfo {
    #[serde(rename = "sitename")]
    pub site_name: String,
    #[serde(rename = "dbname")]
    pub db_name: String,
    pub base: String,
    pub generator: String,
    pub case: String,
    /// Keyed by namespace id. Ids can be negative (special pages).
    pub namespaces: BTreeMap<i64, Namespace>,
}

/// Response of `get_hash_chain_info`: the current state of one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionInfo {
    pub genesis_hash: String,
    pub current_revision: String,
    pub domain_id: String,
    pub content: String,
    pub latest_verification_hash: String,
    pub site_info: SiteInfo,
    pub title: String,
    pub namespace: i64,
    pub chain_height: u64,
}

impl RevisionInfo {
    /// A chain is only addressable when both of its anchors are known.
    pub fn is_valid_chain(&self) -> bool {
        !self.genesis_hash.is_empty() && !self.current_revision.is_empty()
    }
}

/// Whether the predecessor of a revision carried optional provenance data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationContext {
    pub has_previous_signature: bool,
    pub has_previous_witness: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentData {
    pub main: String,
    /// Serialized list of hashes of transcluded content, passed through
    /// as the server sends it.
    #[serde(rename = "transclusion-hashes")]
    pub transclusion_hashes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionContent {
    pub rev_id: i64,
    pub content: ContentData,
    pub content_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionMetadata {
    pub domain_id: String,
    #[serde(rename = "time_stamp")]
    pub timestamp: Timestamp,
    pub previous_verification_hash: String,
    pub metadata_hash: String,
    pub verification_hash: String,
}

impl RevisionMetadata {
    /// The first revision of a chain has no predecessor.
    pub fn is_genesis(&self) -> bool {
        self.previous_verification_hash.is_empty()
    }
}

/// Hex identifier of one revision, as listed by `get_revision_hashes`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionHash(String);

impl RevisionHash {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode the hex representation into raw digest bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        hex::decode(&self.0)
            .map_err(|e| AquaError::Format(format!("revision hash {:?}: {e}", self.0)))
    }
}

impl fmt::Display for RevisionHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RevisionHash {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for RevisionHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionSignature {
    pub signature: String,
    pub wallet_address: String,
    pub signature_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionWitness {
    // Older servers emit the key with a stray " s" suffix.
    #[serde(alias = "domain_manifest_genesis_hash s")]
    pub domain_manifest_genesis_hash: String,
    pub merkle_root: String,
    pub witness_network: String,
    pub transaction: String,
    pub witness_hash: String,
}

/// Merkle inclusion proof attached to a revision.
///
/// The protocol reserves the field but does not define its layout, so the
/// payload is kept exactly as received and never interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionMerkleTreeProof(serde_json::Value);

impl RevisionMerkleTreeProof {
    pub fn as_raw(&self) -> &serde_json::Value {
        &self.0
    }
}

/// Response of `get_revision`: one revision with its verification data.
///
/// The server may send a signature or witness that the verification
/// context does not vouch for. `signature()` and `witness()` only return
/// data whose context flag is set; the unfiltered values are available
/// through the `raw_*` accessors for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revision {
    pub context: VerificationContext,
    pub content: RevisionContent,
    pub metadata: RevisionMetadata,
    #[serde(default)]
    signature: Option<RevisionSignature>,
    #[serde(default)]
    witness: Option<RevisionWitness>,
    #[serde(default)]
    pub merkle_tree_proof: Option<RevisionMerkleTreeProof>,
}

impl Revision {
    pub fn new(
        context: VerificationContext,
        content: RevisionContent,
        metadata: RevisionMetadata,
    ) -> Self {
        Self {
            context,
            content,
            metadata,
            signature: None,
            witness: None,
            merkle_tree_proof: None,
        }
    }

    pub fn with_signature(mut self, signature: RevisionSignature) -> Self {
        self.signature = Some(signature);
        self
    }

    pub fn with_witness(mut self, witness: RevisionWitness) -> Self {
        self.witness = Some(witness);
        self
    }

    pub fn verification_hash(&self) -> &str {
        &self.metadata.verification_hash
    }

    pub fn signature(&self) -> Option<&RevisionSignature> {
        self.signature
            .as_ref()
            .filter(|_| self.context.has_previous_signature)
    }

    pub fn witness(&self) -> Option<&RevisionWitness> {
        self.witness
            .as_ref()
            .filter(|_| self.context.has_previous_witness)
    }

    pub fn raw_signature(&self) -> Option<&RevisionSignature> {
        self.signature.as_ref()
    }

    pub fn raw_witness(&self) -> Option<&RevisionWitness> {
        self.witness.as_ref()
    }
}
