//! The network seam of the client.
//!
//! # Design
//! `Transport` performs one request and returns the response with its body
//! fully read, or a transport-level error (connect, DNS, TLS). A body that
//! breaks off part way is reported as `BodyReadError` with the bytes that
//! arrived. Status codes are not interpreted here; `Client` classifies them.
//! `UreqTransport` is the production implementation.

use std::io::Read;
use std::time::Duration;

use thiserror::Error;
use ureq::tls::TlsConfig;
use ureq::{Agent, RequestBuilder};

use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Error produced by a `Transport` when no HTTP response was obtained.
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// The response head arrived but reading its body failed part way.
///
/// Transports return this boxed as a `TransportError`; `Client` recovers it
/// so the bytes that did arrive reach the caller.
#[derive(Debug, Error)]
#[error("failed to read response body after {} bytes: {source}", .partial.len())]
pub struct BodyReadError {
    pub status: u16,
    pub partial: Vec<u8>,
    #[source]
    pub source: std::io::Error,
}

/// Executes a single HTTP round-trip.
///
/// Implementations must be safe to call from several threads at once; the
/// client shares one transport across all of its callers.
pub trait Transport: Send + Sync {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// `Transport` backed by a blocking `ureq::Agent`.
#[derive(Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    /// Build an agent.
    ///
    /// With `insecure_skip_tls_verify` set, server certificates are accepted
    /// without verification. Clusters in this deployment model serve
    /// self-signed certificates, so this is the default in `ClientConfig`.
    pub fn new(insecure_skip_tls_verify: bool, timeout: Option<Duration>) -> Self {
        let tls = TlsConfig::builder()
            .disable_verification(insecure_skip_tls_verify)
            .build();
        let agent = Agent::config_builder()
            .tls_config(tls)
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(true, None)
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let mut response = match (method, body) {
            (HttpMethod::Get, _) => with_headers(self.agent.get(&url), &headers).call(),
            (HttpMethod::Delete, _) => with_headers(self.agent.delete(&url), &headers).call(),
            (HttpMethod::Post, Some(body)) => {
                with_headers(self.agent.post(&url), &headers).send(body.as_slice())
            }
            (HttpMethod::Post, None) => with_headers(self.agent.post(&url), &headers).send_empty(),
            (HttpMethod::Put, Some(body)) => {
                with_headers(self.agent.put(&url), &headers).send(body.as_slice())
            }
            (HttpMethod::Put, None) => with_headers(self.agent.put(&url), &headers).send_empty(),
        }?;

        let status = response.status();
        // Read in full before the status is looked at so error responses keep
        // their body. ureq caps bodies at 10 MiB unless told otherwise.
        let mut body = Vec::new();
        let mut reader = response.body_mut().with_config().limit(u64::MAX).reader();
        if let Err(source) = reader.read_to_end(&mut body) {
            return Err(Box::new(BodyReadError {
                status: status.as_u16(),
                partial: body,
                source,
            }));
        }

        Ok(HttpResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
            body,
        })
    }
}

fn with_headers<B>(mut builder: RequestBuilder<B>, headers: &[(String, String)]) -> RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

#[cfg(test)]
pub(crate) use stub::StubTransport;
