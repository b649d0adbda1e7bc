//! Synchronous, typed client for the v1beta1 cluster API.
//!
//! # Overview
//! `Client` turns typed pods, replication controllers and services into
//! REST calls under `/api/v1beta1/`, adds HTTP Basic credentials when
//! configured, and decodes responses back into typed values or `ApiError`.
//!
//! # Design
//! - One request per call. No retries, caching or pagination.
//! - The network is behind the `Transport` trait; `UreqTransport` is the
//!   default and skips TLS certificate verification unless told otherwise
//!   through `ClientConfig`.
//! - Responses with status 200..=206 succeed; everything else is
//!   `ApiError::Status` carrying the method, path, status and body.
//! - Callers program against `ClusterApi`, implemented by `Client` and by
//!   the in-memory `FakeClient`.
//! - Non-fatal problems (malformed selector fragments, undecodable bodies)
//!   go to an injected `Diagnostics` sink, `tracing` by default.

pub mod api;
pub mod client;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod fake;
pub mod http;
pub mod selector;
pub mod transport;
pub mod types;

pub use api::ClusterApi;
pub use client::{Client, API_PREFIX};
pub use config::{AuthInfo, ClientConfig, ConfigError};
pub use diagnostics::{Diagnostics, RecordingDiagnostics, TracingDiagnostics};
pub use error::ApiError;
pub use fake::{Action, FakeClient};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use selector::{decode_selector, encode_selector, Selector};
pub use transport::{BodyReadError, Transport, TransportError, UreqTransport};
pub use types::{Pod, PodList, ReplicationController, ReplicationControllerState, Resource, Service};
