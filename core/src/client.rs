//! Request execution against the v1beta1 API.
//!
//! # Design
//! `Client` holds the host, optional credentials, a `Transport` and a
//! diagnostics sink, none of which change after construction. Each call to
//! `execute` builds one `HttpRequest`, sends it, and classifies the
//! response: 200..=206 is success, anything else is `ApiError::Status`.
//! The typed per-resource methods live in `api.rs` and are thin wrappers
//! over `execute` / `execute_into`.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::{AuthInfo, ClientConfig};
use crate::diagnostics::{Diagnostics, TracingDiagnostics};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::selector::{self, Selector};
use crate::transport::{Transport, UreqTransport};

/// Path prefix every resource path is appended to.
pub const API_PREFIX: &str = "/api/v1beta1/";

/// Synchronous client for one API server.
///
/// Cloning is cheap and clones share the transport.
#[derive(Clone)]
pub struct Client {
    host: String,
    auth: Option<AuthInfo>,
    transport: Arc<dyn Transport>,
    diagnostics: Arc<dyn Diagnostics>,
}

impl Client {
    /// Client for `host` (scheme and authority) over ureq, skipping TLS
    /// certificate verification.
    pub fn new(host: &str, auth: Option<AuthInfo>) -> Self {
        Self::with_transport(host, auth, UreqTransport::default())
    }

    pub fn from_config(config: ClientConfig) -> Self {
        let transport = UreqTransport::new(config.insecure_skip_tls_verify, config.timeout());
        Self::with_transport(&config.host, config.auth, transport)
    }

    pub fn with_transport(host: &str, auth: Option<AuthInfo>, transport: impl Transport + 'static) -> Self {
        Self {
            host: host.trim_end_matches('/').to_string(),
            auth,
            transport: Arc::new(transport),
            diagnostics: Arc::new(TracingDiagnostics),
        }
    }

    /// Replace the sink that receives non-fatal diagnostics.
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn make_url(&self, path: &str) -> String {
        format!("{}{API_PREFIX}{path}", self.host)
    }

    /// Decode a wire selector, reporting malformed fragments to this
    /// client's diagnostics sink.
    pub fn decode_selector(&self, wire: &str) -> Selector {
        selector::decode_selector(wire, self.diagnostics.as_ref())
    }

    pub fn build_request(&self, method: HttpMethod, path: &str, body: Option<Vec<u8>>) -> HttpRequest {
        let mut headers = Vec::new();
        if let Some(auth) = &self.auth {
            headers.push(("authorization".to_string(), auth.basic_auth_header()));
        }
        if body.is_some() {
            headers.push(("content-type".to_string(), "application/json".to_string()));
        }
        HttpRequest {
            method,
            url: self.make_url(path),
            headers,
            body,
        }
    }

    /// Perform one request and return the raw response body.
    ///
    /// `path` is relative to `API_PREFIX` and must already be escaped.
    pub fn execute(&self, method: HttpMethod, path: &str, body: Option<Vec<u8>>) -> Result<Vec<u8>, ApiError> {
        let request = self.build_request(method, path, body);
        debug!(method = %request.method, url = %request.url, "sending request");
        let response = self.transport.send(request).map_err(ApiError::from_transport)?;
        debug!(method = %method, path, status = response.status, "received response");
        check_status(method, path, response)
    }

    /// Like `execute`, then decode the body into `T`.
    ///
    /// Returns the decoded value together with the raw bytes. A decode
    /// failure keeps the raw bytes in `ApiError::Decode`.
    pub fn execute_into<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<(T, Vec<u8>), ApiError> {
        let raw = self.execute(method, path, body)?;
        match serde_json::from_slice(&raw) {
            Ok(value) => Ok((value, raw)),
            Err(source) => {
                self.diagnostics
                    .report(&format!("failed to parse: {}", String::from_utf8_lossy(&raw)));
                Err(ApiError::Decode { source, body: raw })
            }
        }
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("host", &self.host)
            .field("auth", &self.auth)
            .finish_non_exhaustive()
    }
}

fn check_status(method: HttpMethod, path: &str, response: HttpResponse) -> Result<Vec<u8>, ApiError> {
    if response.is_success() {
        return Ok(response.body);
    }
    Err(ApiError::Status {
        method,
        path: path.to_string(),
        status: response.status,
        reason: response.reason,
        body: response.body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::RecordingDiagnostics;
    use crate::transport::StubTransport;
    use crate::types::Pod;

    const HOST: &str = "https://master.example";

    fn client(transport: &StubTransport) -> Client {
        Client::with_transport(HOST, None, transport.clone())
    }

    #[test]
    fn url_joins_host_prefix_and_path() {
        let c = client(&StubTransport::respond(200, ""));
        assert_eq!(c.make_url("pods/foo"), "https://master.example/api/v1beta1/pods/foo");
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let c = Client::with_transport("http://localhost:8080/", None, StubTransport::respond(200, ""));
        assert_eq!(c.make_url("pods"), "http://localhost:8080/api/v1beta1/pods");
    }

    #[test]
    fn no_auth_header_without_credentials() {
        let transport = StubTransport::respond(200, "{}");
        client(&transport).execute(HttpMethod::Get, "pods", None).unwrap();
        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].header("authorization").is_none());
    }

    #[test]
    fn basic_auth_header_with_credentials() {
        let transport = StubTransport::respond(200, "{}");
        let c = Client::with_transport(HOST, Some(AuthInfo::new("admin", "secret")), transport.clone());
        c.execute(HttpMethod::Get, "pods", None).unwrap();
        assert_eq!(
            transport.requests()[0].header("authorization"),
            Some("Basic YWRtaW46c2VjcmV0")
        );
    }

    #[test]
    fn body_sets_json_content_type() {
        let transport = StubTransport::respond(200, "{}");
        client(&transport)
            .execute(HttpMethod::Post, "pods", Some(b"{}".to_vec()))
            .unwrap();
        let request = &transport.requests()[0];
        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(request.body.as_deref(), Some(&b"{}"[..]));
    }

    #[test]
    fn status_206_is_success() {
        let transport = StubTransport::respond(206, "partial");
        let raw = client(&transport).execute(HttpMethod::Get, "pods", None).unwrap();
        assert_eq!(raw, b"partial");
    }

    #[test]
    fn status_207_is_failure() {
        let transport = StubTransport::respond(207, "multi");
        let err = client(&transport).execute(HttpMethod::Get, "pods", None).unwrap_err();
        assert_eq!(err.status(), Some(207));
    }

    #[test]
    fn redirect_is_failure() {
        let transport = StubTransport::respond(302, "");
        let err = client(&transport).execute(HttpMethod::Get, "pods", None).unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 302, .. }));
    }

    #[test]
    fn not_found_error_carries_code_and_body() {
        let transport = StubTransport::respond(404, "pod \"foo\" not found");
        let err = client(&transport)
            .execute(HttpMethod::Get, "pods/foo", None)
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("404"), "{message}");
        assert!(message.contains("pod \"foo\" not found"), "{message}");
        assert!(message.contains("GET pods/foo"), "{message}");
        assert_eq!(err.raw_body(), Some(&b"pod \"foo\" not found"[..]));
    }

    #[test]
    fn transport_failure_is_surfaced() {
        let transport = StubTransport::failing("connection refused");
        let err = client(&transport).execute(HttpMethod::Get, "pods", None).unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
        assert!(err.raw_body().is_none());
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn interrupted_body_keeps_bytes_read_so_far() {
        let transport = StubTransport::truncated(200, r#"{"items":[{"id":"a"}"#);
        let err = client(&transport).execute(HttpMethod::Get, "pods", None).unwrap_err();
        assert!(matches!(err, ApiError::BodyRead { status: 200, .. }), "{err:?}");
        assert_eq!(err.raw_body(), Some(&br#"{"items":[{"id":"a"}"#[..]));
    }

    #[test]
    fn execute_into_decodes_and_returns_raw_bytes() {
        let transport = StubTransport::respond(200, r#"{"ID":"x"}"#);
        let (pod, raw): (Pod, _) = client(&transport)
            .execute_into(HttpMethod::Get, "pods/x", None)
            .unwrap();
        assert_eq!(pod.id, "x");
        assert_eq!(raw, br#"{"ID":"x"}"#);
    }

    #[test]
    fn decode_failure_keeps_raw_bytes_and_reports() {
        let transport = StubTransport::respond(200, "not json");
        let sink = Arc::new(RecordingDiagnostics::new());
        let c = client(&transport).with_diagnostics(sink.clone());
        let err = c
            .execute_into::<Pod>(HttpMethod::Get, "pods/x", None)
            .unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }));
        assert_eq!(err.raw_body(), Some(&b"not json"[..]));
        assert_eq!(sink.messages(), vec!["failed to parse: not json".to_string()]);
    }

    #[test]
    fn status_failure_skips_decoding() {
        let transport = StubTransport::respond(500, "not json either");
        let sink = Arc::new(RecordingDiagnostics::new());
        let c = client(&transport).with_diagnostics(sink.clone());
        let err = c
            .execute_into::<Pod>(HttpMethod::Get, "pods/x", None)
            .unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 500, .. }));
        assert!(sink.is_empty());
    }

    #[test]
    fn decode_selector_reports_to_client_sink() {
        let sink = Arc::new(RecordingDiagnostics::new());
        let c = client(&StubTransport::respond(200, "")).with_diagnostics(sink.clone());
        let decoded = c.decode_selector("a=1,b");
        assert_eq!(decoded.get("a").map(String::as_str), Some("1"));
        assert_eq!(decoded.len(), 1);
        assert_eq!(sink.messages().len(), 1);
    }

    #[test]
    fn debug_hides_password() {
        let c = Client::with_transport(HOST, Some(AuthInfo::new("u", "topsecret")), StubTransport::respond(200, ""));
        assert!(!format!("{c:?}").contains("topsecret"));
    }
}
