use crate::{ProbeResult, ServerError, ServerTransport, STATUS_PATH, WEBDAV_FILES_PATH};
use std::sync::Arc;
use tracing::debug;

/// Issues single probe round trips against a server. No retries and no
/// interpretation happen here; retry policy belongs to the transport and
/// classification to the resolver.
#[derive(Clone)]
pub struct ServerProbe {
    transport: Arc<dyn ServerTransport>,
}

impl ServerProbe {
    pub fn new(transport: Arc<dyn ServerTransport>) -> Self {
        Self { transport }
    }

    /// One round trip checking whether the server answers at all. Anonymous
    /// probes hit the base URL; logged-in probes hit the WebDAV files path,
    /// which challenges with the server's authentication scheme.
    ///
    /// Redirects are not followed: the caller decides whether to chase them.
    pub async fn check_path_existence(
        &self,
        url: &str,
        is_user_logged_in: bool,
    ) -> Result<ProbeResult, ServerError> {
        let target = if is_user_logged_in {
            format!("{}{}", url.trim_end_matches('/'), WEBDAV_FILES_PATH)
        } else {
            url.to_string()
        };
        debug!(url = %target, "checking path existence");
        self.transport.probe(&target, false).await
    }

    /// One round trip against the public status endpoint.
    pub async fn get_status(&self, url: &str) -> Result<ProbeResult, ServerError> {
        let target = format!("{}{}", url.trim_end_matches('/'), STATUS_PATH);
        debug!(url = %target, "fetching server status");
        self.transport.probe(&target, true).await
    }
}
