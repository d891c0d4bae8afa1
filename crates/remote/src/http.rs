use crate::{ProbeResult, ServerError, ServerTransport};
use reqwest::redirect::Policy;
use reqwest::Client;

const MAX_TRANSPORT_REDIRECTS: usize = 5;

/// Transport backed by reqwest.
///
/// Two clients because reqwest fixes the redirect policy per client: one
/// that never follows (the resolver walks redirects itself) and one with a
/// bounded follow for endpoints where the chain is uninteresting.
#[derive(Clone)]
pub struct HttpTransport {
    direct: Client,
    redirecting: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, ServerError> {
        let direct = Client::builder().redirect(Policy::none()).build()?;
        let redirecting = Client::builder()
            .redirect(Policy::limited(MAX_TRANSPORT_REDIRECTS))
            .build()?;
        Ok(Self { direct, redirecting })
    }
}

#[async_trait::async_trait]
impl ServerTransport for HttpTransport {
    async fn probe(&self, url: &str, follow_redirects: bool) -> Result<ProbeResult, ServerError> {
        let client = if follow_redirects {
            &self.redirecting
        } else {
            &self.direct
        };

        let resp = client.get(url).send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                ServerError::NoConnection(url.to_string())
            } else {
                ServerError::Transport(e)
            }
        })?;

        let status_code = resp.status().as_u16();
        let tls = resp.url().scheme() == "https";

        let auth_headers: Vec<String> = resp
            .headers()
            .get_all(reqwest::header::WWW_AUTHENTICATE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect();

        let redirect_target = if resp.status().is_redirection() {
            resp.headers()
                .get(reqwest::header::LOCATION)
                .and_then(|v| v.to_str().ok())
                // Location may be relative; resolve against the request URL.
                .and_then(|loc| resp.url().join(loc).ok())
                .map(|u| u.to_string())
        } else {
            None
        };

        let body = resp.text().await.ok().filter(|b| !b.is_empty());

        Ok(ProbeResult {
            status_code,
            auth_headers,
            redirect_target,
            body,
            tls,
        })
    }
}
