use remote::probe::ServerProbe;
use remote::resolver::ServerInfoResolver;
use remote::{
    AuthenticationMethod, ProbeResult, ServerError, ServerInfo, ServerTransport, ServerVersion,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const BASE_URL: &str = "https://demo.example.com";
const REDIRECTED_URL: &str = "http://demo.redirected.example.com";

const BASIC_HEADER: &str = "basic realm=\"owncloud\", charset=\"utf-8\"";
const BEARER_HEADER: &str = "bearer realm=\"owncloud\"";

#[derive(Clone)]
enum Scripted {
    Respond(ProbeResult),
    NoConnection,
}

/// Transport double: one scripted response per URL, every call recorded.
#[derive(Default)]
struct MockTransport {
    responses: Mutex<HashMap<String, Scripted>>,
    calls: Mutex<Vec<String>>,
}

impl MockTransport {
    fn on(&self, url: &str, scripted: Scripted) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), scripted);
    }

    fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == url).count()
    }
}

#[async_trait::async_trait]
impl ServerTransport for MockTransport {
    async fn probe(&self, url: &str, _follow_redirects: bool) -> Result<ProbeResult, ServerError> {
        self.calls.lock().unwrap().push(url.to_string());
        let scripted = self
            .responses
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| panic!("unscripted probe: {url}"));
        match scripted {
            Scripted::Respond(result) => Ok(result),
            Scripted::NoConnection => Err(ServerError::NoConnection(url.to_string())),
        }
    }
}

fn resolver(transport: Arc<MockTransport>) -> ServerInfoResolver {
    ServerInfoResolver::new(ServerProbe::new(transport))
}

fn challenge(headers: &[&str]) -> ProbeResult {
    ProbeResult {
        status_code: 401,
        auth_headers: headers.iter().map(|h| h.to_string()).collect(),
        tls: true,
        ..Default::default()
    }
}

fn redirect_to(target: &str) -> ProbeResult {
    ProbeResult {
        status_code: 301,
        redirect_target: Some(target.to_string()),
        ..Default::default()
    }
}

fn status_ok(version: &str, tls: bool) -> ProbeResult {
    let body = format!(
        r#"{{"installed":true,"maintenance":false,"version":"{version}","versionstring":"{version}","edition":""}}"#
    );
    ProbeResult {
        status_code: 200,
        body: Some(body),
        tls,
        ..Default::default()
    }
}

fn status_url(base: &str) -> String {
    format!("{base}/status.php")
}

#[tokio::test]
async fn authentication_method_follows_redirect() {
    let transport = Arc::new(MockTransport::default());
    transport.on(REDIRECTED_URL, Scripted::Respond(redirect_to(BASE_URL)));
    transport.on(BASE_URL, Scripted::Respond(challenge(&[BASIC_HEADER])));

    let method = resolver(transport.clone())
        .get_authentication_method(REDIRECTED_URL)
        .await
        .unwrap();

    assert_eq!(method, AuthenticationMethod::BasicHttpAuth);
    assert_eq!(transport.calls_to(BASE_URL), 1);
    // The pre-redirect URL is probed once and never re-issued afterwards.
    assert_eq!(transport.calls_to(REDIRECTED_URL), 1);
}

#[tokio::test]
async fn authentication_method_basic() {
    let transport = Arc::new(MockTransport::default());
    transport.on(BASE_URL, Scripted::Respond(challenge(&[BASIC_HEADER])));

    let method = resolver(transport)
        .get_authentication_method(BASE_URL)
        .await
        .unwrap();
    assert_eq!(method, AuthenticationMethod::BasicHttpAuth);
}

#[tokio::test]
async fn authentication_method_bearer_wins_over_basic() {
    let transport = Arc::new(MockTransport::default());
    transport.on(
        BASE_URL,
        Scripted::Respond(challenge(&[BASIC_HEADER, BEARER_HEADER])),
    );

    let method = resolver(transport)
        .get_authentication_method(BASE_URL)
        .await
        .unwrap();
    assert_eq!(method, AuthenticationMethod::BearerToken);
}

#[tokio::test]
async fn authentication_method_none_when_unchallenged() {
    let transport = Arc::new(MockTransport::default());
    transport.on(
        BASE_URL,
        Scripted::Respond(ProbeResult {
            status_code: 200,
            tls: true,
            ..Default::default()
        }),
    );

    let method = resolver(transport)
        .get_authentication_method(BASE_URL)
        .await
        .unwrap();
    assert_eq!(method, AuthenticationMethod::None);
}

#[tokio::test]
async fn authentication_method_service_unavailable() {
    let transport = Arc::new(MockTransport::default());
    transport.on(
        BASE_URL,
        Scripted::Respond(ProbeResult {
            status_code: 503,
            ..Default::default()
        }),
    );

    let err = resolver(transport)
        .get_authentication_method(BASE_URL)
        .await
        .unwrap_err();
    assert!(matches!(err, ServerError::ServiceUnavailable));
}

#[tokio::test]
async fn authentication_method_propagates_transport_errors() {
    let transport = Arc::new(MockTransport::default());
    transport.on(BASE_URL, Scripted::NoConnection);

    let err = resolver(transport)
        .get_authentication_method(BASE_URL)
        .await
        .unwrap_err();
    assert!(matches!(err, ServerError::NoConnection(_)));
}

#[tokio::test]
async fn authentication_method_bounds_redirect_chain() {
    let transport = Arc::new(MockTransport::default());
    // Server redirects to itself forever.
    transport.on(BASE_URL, Scripted::Respond(redirect_to(BASE_URL)));

    let err = resolver(transport.clone())
        .get_authentication_method(BASE_URL)
        .await
        .unwrap_err();
    assert!(matches!(err, ServerError::TooManyRedirects(_)));
    // Initial probe plus the bounded number of followed hops.
    assert_eq!(transport.calls_to(BASE_URL), 6);
}

#[tokio::test]
async fn remote_status_secure_connection() {
    let transport = Arc::new(MockTransport::default());
    transport.on(
        &status_url(BASE_URL),
        Scripted::Respond(status_ok("10.3.2", true)),
    );

    let (version, tls) = resolver(transport)
        .get_remote_status(BASE_URL)
        .await
        .unwrap();
    assert_eq!(version, ServerVersion::parse("10.3.2"));
    assert!(tls);
}

#[tokio::test]
async fn remote_status_insecure_connection() {
    let transport = Arc::new(MockTransport::default());
    transport.on(
        &status_url(BASE_URL),
        Scripted::Respond(status_ok("10.3.2", false)),
    );

    let (_, tls) = resolver(transport)
        .get_remote_status(BASE_URL)
        .await
        .unwrap();
    assert!(!tls);
}

#[tokio::test]
async fn remote_status_rejects_unsupported_version() {
    let transport = Arc::new(MockTransport::default());
    transport.on(
        &status_url(BASE_URL),
        Scripted::Respond(status_ok("9.0.0", true)),
    );

    let err = resolver(transport)
        .get_remote_status(BASE_URL)
        .await
        .unwrap_err();
    match err {
        ServerError::UnsupportedVersion(version) => {
            assert_eq!(version, ServerVersion::parse("9.0.0"));
        }
        other => panic!("expected UnsupportedVersion, got {other:?}"),
    }
}

#[tokio::test]
async fn remote_status_accepts_hidden_version() {
    let transport = Arc::new(MockTransport::default());
    transport.on(
        &status_url(BASE_URL),
        Scripted::Respond(status_ok("", false)),
    );

    let (version, _) = resolver(transport)
        .get_remote_status(BASE_URL)
        .await
        .unwrap();
    assert!(version.is_hidden());
}

#[tokio::test]
async fn remote_status_rejects_non_json_body() {
    let transport = Arc::new(MockTransport::default());
    transport.on(
        &status_url(BASE_URL),
        Scripted::Respond(ProbeResult {
            status_code: 200,
            body: Some("<html>maintenance page</html>".to_string()),
            tls: true,
            ..Default::default()
        }),
    );

    let err = resolver(transport)
        .get_remote_status(BASE_URL)
        .await
        .unwrap_err();
    assert!(matches!(err, ServerError::MalformedStatus(_)));
}

#[tokio::test]
async fn remote_status_rejects_missing_body() {
    let transport = Arc::new(MockTransport::default());
    transport.on(
        &status_url(BASE_URL),
        Scripted::Respond(ProbeResult {
            status_code: 200,
            body: None,
            tls: true,
            ..Default::default()
        }),
    );

    let err = resolver(transport)
        .get_remote_status(BASE_URL)
        .await
        .unwrap_err();
    assert!(matches!(err, ServerError::MalformedStatus(_)));
}

#[tokio::test]
async fn remote_status_rejects_non_success_status() {
    let transport = Arc::new(MockTransport::default());
    transport.on(
        &status_url(BASE_URL),
        Scripted::Respond(ProbeResult {
            status_code: 404,
            ..Default::default()
        }),
    );

    let err = resolver(transport)
        .get_remote_status(BASE_URL)
        .await
        .unwrap_err();
    assert!(matches!(err, ServerError::UnexpectedStatus(404)));
}

#[tokio::test]
async fn server_info_composes_status_and_auth() {
    let transport = Arc::new(MockTransport::default());
    transport.on(
        &status_url(BASE_URL),
        Scripted::Respond(status_ok("10.3.2", true)),
    );
    transport.on(BASE_URL, Scripted::Respond(challenge(&[BASIC_HEADER])));

    let info = resolver(transport.clone())
        .get_server_info(BASE_URL)
        .await
        .unwrap();

    assert_eq!(
        info,
        ServerInfo {
            base_url: BASE_URL.to_string(),
            version: ServerVersion::parse("10.3.2"),
            is_secure_connection: true,
            authentication_method: AuthenticationMethod::BasicHttpAuth,
        }
    );
    assert_eq!(transport.calls_to(&status_url(BASE_URL)), 1);
    assert_eq!(transport.calls_to(BASE_URL), 1);
}

#[tokio::test]
async fn server_info_bearer_insecure() {
    let transport = Arc::new(MockTransport::default());
    transport.on(
        &status_url(BASE_URL),
        Scripted::Respond(status_ok("10.3.2", false)),
    );
    transport.on(
        BASE_URL,
        Scripted::Respond(challenge(&[BASIC_HEADER, BEARER_HEADER])),
    );

    let info = resolver(transport).get_server_info(BASE_URL).await.unwrap();
    assert_eq!(
        info.authentication_method,
        AuthenticationMethod::BearerToken
    );
    assert!(!info.is_secure_connection);
}

#[tokio::test]
async fn server_info_skips_auth_probe_without_connection() {
    let transport = Arc::new(MockTransport::default());
    transport.on(&status_url(BASE_URL), Scripted::NoConnection);

    let err = resolver(transport.clone())
        .get_server_info(BASE_URL)
        .await
        .unwrap_err();

    assert!(matches!(err, ServerError::NoConnection(_)));
    // The doomed second round trip is never issued.
    assert_eq!(transport.calls_to(BASE_URL), 0);
}

#[tokio::test]
async fn logged_in_existence_check_targets_webdav_files_path() {
    let transport = Arc::new(MockTransport::default());
    let webdav_url = format!("{BASE_URL}{}", remote::WEBDAV_FILES_PATH);
    transport.on(&webdav_url, Scripted::Respond(challenge(&[BASIC_HEADER])));

    let probe = ServerProbe::new(transport.clone());
    let result = probe
        .check_path_existence(BASE_URL, true)
        .await
        .unwrap();

    assert_eq!(result.status_code, 401);
    assert_eq!(transport.calls_to(&webdav_url), 1);
    // The base URL itself is left alone for logged-in probes.
    assert_eq!(transport.calls_to(BASE_URL), 0);
}

#[tokio::test]
async fn server_info_is_idempotent() {
    let transport = Arc::new(MockTransport::default());
    transport.on(
        &status_url(BASE_URL),
        Scripted::Respond(status_ok("10.3.2", true)),
    );
    transport.on(BASE_URL, Scripted::Respond(challenge(&[BASIC_HEADER])));

    let resolver = resolver(transport);
    let first = resolver.get_server_info(BASE_URL).await.unwrap();
    let second = resolver.get_server_info(BASE_URL).await.unwrap();
    assert_eq!(first, second);
}
