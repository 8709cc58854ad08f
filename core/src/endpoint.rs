//! Mapping of protocol operations onto request URLs.
//!
//! Every operation lives under `{base}/data_accounting/`. Path parameters
//! are appended as single percent-encoded segments, so an id containing `/`
//! or `?` stays one segment instead of reshaping the URL.

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::error::{AquaError, Result};

const API_PREFIX: &str = "data_accounting";

/// How `get_hash_chain_info` identifies a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdType {
    GenesisHash,
    Title,
}

impl IdType {
    pub fn as_str(self) -> &'static str {
        match self {
            IdType::GenesisHash => "genesis_hash",
            IdType::Title => "title",
        }
    }
}

impl FromStr for IdType {
    type Err = AquaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "genesis_hash" => Ok(IdType::GenesisHash),
            "title" => Ok(IdType::Title),
            other => Err(AquaError::InvalidArgument(format!(
                "id_type must be genesis_hash or title, got {other:?}"
            ))),
        }
    }
}

impl fmt::Display for IdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logical protocol operation together with its path parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint<'a> {
    HashChainInfo { id_type: IdType, id: &'a str },
    RevisionHashes { verification_hash: &'a str },
    Revision { verification_hash: &'a str },
    ServerInfo,
}

impl Endpoint<'_> {
    /// Operation name as it appears in the URL.
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::HashChainInfo { .. } => "get_hash_chain_info",
            Endpoint::RevisionHashes { .. } => "get_revision_hashes",
            Endpoint::Revision { .. } => "get_revision",
            Endpoint::ServerInfo => "get_server_info",
        }
    }

    fn params(&self) -> Vec<&str> {
        match *self {
            Endpoint::HashChainInfo { id_type, id } => vec![id_type.as_str(), id],
            Endpoint::RevisionHashes { verification_hash }
            | Endpoint::Revision { verification_hash } => vec![verification_hash],
            Endpoint::ServerInfo => Vec::new(),
        }
    }

    /// Join this operation onto `base`. Query and fragment of `base` are
    /// left untouched.
    pub fn url(&self, base: &Url) -> Result<Url> {
        let params = self.params();
        // `url` silently drops dot segments, which would shift the path.
        if let Some(bad) = params.iter().find(|p| matches!(**p, "." | "..")) {
            return Err(AquaError::Config(format!(
                "{bad:?} cannot be used as a path segment of {}",
                self.name()
            )));
        }

        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|()| AquaError::Config(format!("endpoint {base} cannot be used as a base URL")))?
            .pop_if_empty()
            .push(API_PREFIX)
            .push(self.name())
            .extend(params);
        Ok(url)
    }
}
