use crate::probe::ServerProbe;
use crate::{
    AuthenticationMethod, ServerError, ServerInfo, ServerVersion, HTTP_SERVICE_UNAVAILABLE,
    HTTP_UNAUTHORIZED,
};
use serde::Deserialize;
use tracing::{debug, info};

/// Redirect hops followed while probing for the authentication method.
/// One hop is the contract exercised against real deployments; the bound
/// exists so a misconfigured server cannot loop us forever.
const MAX_REDIRECT_HOPS: usize = 5;

/// Challenge patterns in priority order: bearer wins when a server offers
/// both. Matching is a case-insensitive substring test on the raw header
/// value, kept in a table so the strategy can change without touching the
/// orchestration below.
const AUTH_MATCHERS: &[(&str, AuthenticationMethod)] = &[
    ("bearer", AuthenticationMethod::BearerToken),
    ("basic", AuthenticationMethod::BasicHttpAuth),
];

#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(default)]
    version: String,
    #[serde(default, rename = "versionstring")]
    version_string: String,
}

/// Drives [`ServerProbe`] calls into a consolidated [`ServerInfo`].
///
/// Stateless; the probe (and through it the transport) is injected at
/// construction.
#[derive(Clone)]
pub struct ServerInfoResolver {
    probe: ServerProbe,
}

impl ServerInfoResolver {
    pub fn new(probe: ServerProbe) -> Self {
        Self { probe }
    }

    /// Determines how the server expects clients to authenticate.
    ///
    /// Follows redirects up to [`MAX_REDIRECT_HOPS`], then classifies the
    /// first non-redirected response: 503 means the server is reachable but
    /// refusing service, a 401 challenge is matched against
    /// [`AUTH_MATCHERS`], and an unchallenged answer means no
    /// authentication at all.
    pub async fn get_authentication_method(
        &self,
        url: &str,
    ) -> Result<AuthenticationMethod, ServerError> {
        let mut current = url.to_string();
        let mut hops = 0;
        let result = loop {
            let result = self.probe.check_path_existence(&current, false).await?;
            match result.redirect_target {
                Some(target) => {
                    if hops >= MAX_REDIRECT_HOPS {
                        return Err(ServerError::TooManyRedirects(current));
                    }
                    debug!(from = %current, to = %target, "following redirect");
                    hops += 1;
                    current = target;
                }
                None => break result,
            }
        };

        if result.status_code == HTTP_SERVICE_UNAVAILABLE {
            return Err(ServerError::ServiceUnavailable);
        }

        let method = if result.status_code == HTTP_UNAUTHORIZED {
            classify_auth_headers(&result.auth_headers)
        } else {
            AuthenticationMethod::None
        };
        info!(url = %current, ?method, "authentication method resolved");
        Ok(method)
    }

    /// Resolves the server's protocol version and TLS posture.
    ///
    /// An empty version string means the operator hides it; that is
    /// accepted and flagged, not rejected. A parsed version below the
    /// supported floor fails with the offending version attached.
    pub async fn get_remote_status(
        &self,
        url: &str,
    ) -> Result<(ServerVersion, bool), ServerError> {
        let result = self.probe.get_status(url).await?;
        if !result.is_success() {
            return Err(ServerError::UnexpectedStatus(result.status_code));
        }

        let body = result
            .body
            .as_deref()
            .ok_or_else(|| ServerError::MalformedStatus("empty body".to_string()))?;
        let status: StatusResponse = serde_json::from_str(body)
            .map_err(|e| ServerError::MalformedStatus(e.to_string()))?;

        let raw = if status.version.is_empty() {
            status.version_string
        } else {
            status.version
        };
        let version = ServerVersion::parse(&raw);
        if !version.is_supported() {
            return Err(ServerError::UnsupportedVersion(version));
        }
        info!(%version, tls = result.tls, "server status resolved");
        Ok((version, result.tls))
    }

    /// Composes version/TLS discovery and the authentication probe.
    ///
    /// Status runs first: when it fails with a connection error the
    /// authentication probe is never issued, since a second round trip
    /// against an unreachable host is doomed anyway. Every other failure
    /// propagates unwrapped.
    pub async fn get_server_info(&self, url: &str) -> Result<ServerInfo, ServerError> {
        let (version, is_secure_connection) = self.get_remote_status(url).await?;
        let authentication_method = self.get_authentication_method(url).await?;
        Ok(ServerInfo {
            base_url: url.to_string(),
            version,
            is_secure_connection,
            authentication_method,
        })
    }
}

fn classify_auth_headers(headers: &[String]) -> AuthenticationMethod {
    for (pattern, method) in AUTH_MATCHERS {
        if headers
            .iter()
            .any(|h| h.to_ascii_lowercase().contains(pattern))
        {
            return *method;
        }
    }
    AuthenticationMethod::None
}
