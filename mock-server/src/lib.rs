//! In-memory Aqua `data_accounting` server for tests and local development.
//!
//! Serves the four read-only endpoints from a `ChainStore`. Wire types are
//! defined here independently of `aqua-core`, so the client's integration
//! tests catch schema drift between the two.

use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;

pub const API_VERSION: &str = "0.3.0";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerInfo {
    pub api_version: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Namespace {
    pub case: bool,
    pub title: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SiteInfo {
    pub sitename: String,
    pub dbname: String,
    pub base: String,
    pub generator: String,
    pub case: String,
    pub namespaces: BTreeMap<i64, Namespace>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
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

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Context {
    pub has_previous_signature: bool,
    pub has_previous_witness: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContentData {
    pub main: String,
    #[serde(rename = "transclusion-hashes")]
    pub transclusion_hashes: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Content {
    pub rev_id: i64,
    pub content: ContentData,
    pub content_hash: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Metadata {
    pub domain_id: String,
    /// `YYYYMMDDHHMMSS`, UTC.
    pub time_stamp: String,
    pub previous_verification_hash: String,
    pub metadata_hash: String,
    pub verification_hash: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Signature {
    pub signature: String,
    pub wallet_address: String,
    pub signature_hash: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Witness {
    pub domain_manifest_genesis_hash: String,
    pub merkle_root: String,
    pub witness_network: String,
    pub transaction: String,
    pub witness_hash: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Revision {
    pub context: Context,
    pub content: Content,
    pub metadata: Metadata,
    pub signature: Option<Signature>,
    pub witness: Option<Witness>,
    pub merkle_tree_proof: Option<serde_json::Value>,
}

/// One page history, genesis revision first.
#[derive(Clone, Debug)]
pub struct Chain {
    pub title: String,
    pub namespace: i64,
    revisions: Vec<Revision>,
}

impl Chain {
    pub fn new(title: impl Into<String>, namespace: i64, genesis: Revision) -> Self {
        Self {
            title: title.into(),
            namespace,
            revisions: vec![genesis],
        }
    }

    pub fn push(&mut self, revision: Revision) {
        self.revisions.push(revision);
    }

    pub fn genesis_hash(&self) -> &str {
        &self.revisions[0].metadata.verification_hash
    }

    pub fn latest(&self) -> &Revision {
        // `new` guarantees at least the genesis revision.
        &self.revisions[self.revisions.len() - 1]
    }

    fn position(&self, verification_hash: &str) -> Option<usize> {
        self.revisions
            .iter()
            .position(|r| r.metadata.verification_hash == verification_hash)
    }
}

#[derive(Clone, Debug)]
pub struct ChainStore {
    site_info: SiteInfo,
    chains: Vec<Chain>,
}

impl ChainStore {
    pub fn new(site_info: SiteInfo) -> Self {
        Self {
            site_info,
            chains: Vec::new(),
        }
    }

    pub fn insert(&mut self, chain: Chain) {
        self.chains.push(chain);
    }

    pub fn chain_by_genesis_hash(&self, genesis_hash: &str) -> Option<&Chain> {
        self.chains.iter().find(|c| c.genesis_hash() == genesis_hash)
    }

    pub fn chain_by_title(&self, title: &str) -> Option<&Chain> {
        self.chains.iter().find(|c| c.title == title)
    }

    pub fn revision(&self, verification_hash: &str) -> Option<&Revision> {
        self.chains
            .iter()
            .find_map(|c| c.position(verification_hash).map(|i| &c.revisions[i]))
    }

    /// Hashes strictly newer than `verification_hash`, oldest first.
    pub fn newer_hashes(&self, verification_hash: &str) -> Option<Vec<String>> {
        self.chains.iter().find_map(|c| {
            c.position(verification_hash).map(|i| {
                c.revisions[i + 1..]
                    .iter()
                    .map(|r| r.metadata.verification_hash.clone())
                    .collect()
            })
        })
    }

    pub fn info(&self, chain: &Chain) -> RevisionInfo {
        let latest = chain.latest();
        RevisionInfo {
            genesis_hash: chain.genesis_hash().to_string(),
            current_revision: latest.metadata.verification_hash.clone(),
            domain_id: latest.metadata.domain_id.clone(),
            content: latest.content.content.main.clone(),
            latest_verification_hash: latest.metadata.verification_hash.clone(),
            site_info: self.site_info.clone(),
            title: chain.title.clone(),
            namespace: chain.namespace,
            chain_height: chain.revisions.len() as u64,
        }
    }

    /// Deterministic single-page store for local development.
    pub fn seeded() -> Self {
        let mut store = Self::new(demo_site_info());
        let mut chain = Chain::new("Main Page", 0, demo_revision(1, "", "Hello", Context::default()));
        chain.push(demo_revision(2, &demo_hash(1), "Hello, world", Context::default()));
        let signed = Context {
            has_previous_signature: true,
            has_previous_witness: false,
        };
        chain.push(demo_revision(3, &demo_hash(2), "Hello, signed world", signed).signed());
        store.insert(chain);
        store
    }
}

/// 128 hex digits, the length of a SHA3-512 digest.
pub fn demo_hash(seed: u64) -> String {
    format!("{seed:0128x}")
}

pub fn demo_site_info() -> SiteInfo {
    let namespaces = [
        (-1, true, "Special"),
        (0, true, ""),
        (6942, true, "Data Accounting"),
    ]
    .into_iter()
    .map(|(id, case, title)| {
        (
            id,
            Namespace {
                case,
                title: title.to_string(),
            },
        )
    })
    .collect();
    SiteInfo {
        sitename: "Personal Knowledge Container".to_string(),
        dbname: "my_wiki".to_string(),
        base: "http://localhost:9352/index.php/Main_Page".to_string(),
        generator: "MediaWiki 1.37.1".to_string(),
        case: "first-letter".to_string(),
        namespaces,
    }
}

/// Revision number `seed` with hash `demo_hash(seed)`.
pub fn demo_revision(seed: u64, previous: &str, main: &str, context: Context) -> Revision {
    Revision {
        context,
        content: Content {
            rev_id: seed as i64,
            content: ContentData {
                main: main.to_string(),
                transclusion_hashes: "[]".to_string(),
            },
            content_hash: demo_hash(seed + 1000),
        },
        metadata: Metadata {
            domain_id: "5d0c5bb1c2".to_string(),
            time_stamp: format!("202401150930{:02}", seed % 60),
            previous_verification_hash: previous.to_string(),
            metadata_hash: demo_hash(seed + 2000),
            verification_hash: demo_hash(seed),
        },
        signature: None,
        witness: None,
        merkle_tree_proof: None,
    }
}

impl Revision {
    pub fn signed(mut self) -> Self {
        self.signature = Some(Signature {
            signature: format!("0x{}", "5a".repeat(65)),
            wallet_address: "0xa2026582b94feb9124231fbf7b052c39218954c2".to_string(),
            signature_hash: demo_hash(3000),
        });
        self
    }

    pub fn witnessed(mut self) -> Self {
        self.witness = Some(Witness {
            domain_manifest_genesis_hash: demo_hash(4000),
            merkle_root: demo_hash(4001),
            witness_network: "goerli".to_string(),
            transaction: format!("0x{}", "7e".repeat(32)),
            witness_hash: demo_hash(4002),
        });
        self
    }
}

pub type Db = Arc<RwLock<ChainStore>>;

#[derive(Clone)]
pub struct AppState {
    db: Db,
    token: Option<Arc<str>>,
}

impl AppState {
    /// With `token` set, every request must carry `Authorization: Bearer <token>`.
    pub fn new(store: ChainStore, token: Option<String>) -> Self {
        Self {
            db: Arc::new(RwLock::new(store)),
            token: token.map(Arc::from),
        }
    }

    pub fn db(&self) -> Db {
        self.db.clone()
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route(
            "/data_accounting/get_hash_chain_info/{id_type}/{id}",
            get(get_hash_chain_info),
        )
        .route(
            "/data_accounting/get_revision_hashes/{verification_hash}",
            get(get_revision_hashes),
        )
        .route(
            "/data_accounting/get_revision/{verification_hash}",
            get(get_revision),
        )
        .route("/data_accounting/get_server_info", get(get_server_info))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    axum::serve(listener, app(state)).await
}

async fn require_bearer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected) = state.token.as_deref() else {
        return Ok(next.run(request).await);
    };
    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    if presented == Some(expected) {
        Ok(next.run(request).await)
    } else {
        tracing::warn!(uri = %request.uri(), "rejected request without valid bearer token");
        Err(StatusCode::UNAUTHORIZED)
    }
}

async fn get_hash_chain_info(
    State(state): State<AppState>,
    Path((id_type, id)): Path<(String, String)>,
) -> Result<Json<RevisionInfo>, StatusCode> {
    let store = state.db.read().await;
    let chain = match id_type.as_str() {
        "genesis_hash" => store.chain_by_genesis_hash(&id),
        "title" => store.chain_by_title(&id),
        _ => return Err(StatusCode::BAD_REQUEST),
    };
    chain
        .map(|c| Json(store.info(c)))
        .ok_or(StatusCode::NOT_FOUND)
}

async fn get_revision_hashes(
    State(state): State<AppState>,
    Path(verification_hash): Path<String>,
) -> Result<Json<Vec<String>>, StatusCode> {
    let store = state.db.read().await;
    store
        .newer_hashes(&verification_hash)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn get_revision(
    State(state): State<AppState>,
    Path(verification_hash): Path<String>,
) -> Result<Json<Revision>, StatusCode> {
    let store = state.db.read().await;
    store
        .revision(&verification_hash)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn get_server_info() -> Json<ServerInfo> {
    Json(ServerInfo {
        api_version: API_VERSION.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_store_links_revisions() {
        let store = ChainStore::seeded();
        let chain = store.chain_by_title("Main Page").unwrap();
        assert_eq!(chain.genesis_hash(), demo_hash(1));
        assert_eq!(chain.latest().metadata.previous_verification_hash, demo_hash(2));
        assert!(store.chain_by_genesis_hash(&demo_hash(2)).is_none());
    }

    #[test]
    fn newer_hashes_excludes_the_requested_revision() {
        let store = ChainStore::seeded();
        assert_eq!(
            store.newer_hashes(&demo_hash(1)).unwrap(),
            vec![demo_hash(2), demo_hash(3)]
        );
        assert!(store.newer_hashes(&demo_hash(3)).unwrap().is_empty());
        assert!(store.newer_hashes("unknown").is_none());
    }

    #[test]
    fn info_describes_the_latest_revision() {
        let store = ChainStore::seeded();
        let info = store.info(store.chain_by_title("Main Page").unwrap());
        assert_eq!(info.chain_height, 3);
        assert_eq!(info.current_revision, demo_hash(3));
        assert_eq!(info.latest_verification_hash, demo_hash(3));
        assert_eq!(info.content, "Hello, signed world");
    }

    #[test]
    fn namespaces_serialize_with_string_keys() {
        let json = serde_json::to_value(demo_site_info()).unwrap();
        assert_eq!(json["namespaces"]["6942"]["title"], "Data Accounting");
        assert_eq!(json["namespaces"]["-1"]["case"], true);
    }

    #[test]
    fn revision_serializes_absent_parts_as_null() {
        let json = serde_json::to_value(demo_revision(1, "", "x", Context::default())).unwrap();
        assert!(json["signature"].is_null());
        assert!(json["witness"].is_null());
        assert_eq!(json["content"]["content"]["transclusion-hashes"], "[]");
        assert_eq!(json["metadata"]["time_stamp"], "20240115093001");
    }
}
