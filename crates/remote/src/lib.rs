//! Remote server capability discovery: probing a cloud-storage server for
//! its authentication method, TLS posture and protocol version.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod http;
pub mod probe;
pub mod resolver;
pub mod version;

pub use version::ServerVersion;

pub const HTTP_UNAUTHORIZED: u16 = 401;
pub const HTTP_SERVICE_UNAVAILABLE: u16 = 503;

/// Relative path probed when checking reachability for a logged-in account.
pub const WEBDAV_FILES_PATH: &str = "/remote.php/dav/files";

/// Relative path of the public status endpoint.
pub const STATUS_PATH: &str = "/status.php";

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("no connection with server at {0}")]
    NoConnection(String),
    #[error("server is temporarily unavailable")]
    ServiceUnavailable,
    #[error("server version {0} is not supported")]
    UnsupportedVersion(ServerVersion),
    #[error("too many redirects while probing {0}")]
    TooManyRedirects(String),
    #[error("server returned unexpected status {0}")]
    UnexpectedStatus(u16),
    #[error("malformed status response: {0}")]
    MalformedStatus(String),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthenticationMethod {
    None,
    BasicHttpAuth,
    BearerToken,
}

/// Consolidated result of capability discovery for one base URL.
///
/// Computed on demand and never persisted here; discovery is idempotent,
/// so two calls against an unchanged server compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub base_url: String,
    pub version: ServerVersion,
    pub is_secure_connection: bool,
    pub authentication_method: AuthenticationMethod,
}

/// Outcome of a single probe round trip.
///
/// `auth_headers` carries every `WWW-Authenticate` value verbatim; matching
/// against them is the resolver's job, not the transport's.
#[derive(Debug, Clone, Default)]
pub struct ProbeResult {
    pub status_code: u16,
    pub auth_headers: Vec<String>,
    pub redirect_target: Option<String>,
    pub body: Option<String>,
    pub tls: bool,
}

impl ProbeResult {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Abstract HTTP transport: one outbound round trip per call, raw status
/// and headers exposed, no retries.
#[async_trait::async_trait]
pub trait ServerTransport: Send + Sync {
    async fn probe(&self, url: &str, follow_redirects: bool) -> Result<ProbeResult, ServerError>;
}
