//! TLS policy against a self-signed HTTPS listener.
//!
//! The listener is a blocking rustls server on a random port that answers
//! every request with a fixed one-pod list.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::Arc;

use cluster_client::{ApiError, Client, ClientConfig, ClusterApi, Selector};
use rustls::pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls::{ServerConfig, ServerConnection, StreamOwned};

const BODY: &str = r#"{"items":[{"id":"secure-1"}]}"#;

fn self_signed_config() -> Arc<ServerConfig> {
    let certified = rcgen::generate_simple_self_signed(vec!["localhost".to_string(), "127.0.0.1".to_string()])
        .unwrap();
    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(certified.key_pair.serialize_der()));
    let config = ServerConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(vec![certified.cert.der().clone()], key)
        .unwrap();
    Arc::new(config)
}

/// Start the HTTPS listener in a thread and return its base URL.
fn spawn_https_server() -> String {
    let config = self_signed_config();
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { continue };
            let Ok(conn) = ServerConnection::new(config.clone()) else { continue };
            let mut tls = StreamOwned::new(conn, stream);

            // A client that rejects the certificate fails the handshake here.
            let mut head = Vec::new();
            let mut chunk = [0u8; 1024];
            let complete = loop {
                match tls.read(&mut chunk) {
                    Ok(0) | Err(_) => break false,
                    Ok(n) => head.extend_from_slice(&chunk[..n]),
                }
                if head.windows(4).any(|w| w == b"\r\n\r\n") {
                    break true;
                }
            };
            if !complete {
                continue;
            }

            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{BODY}",
                BODY.len()
            );
            let _ = tls.write_all(response.as_bytes());
            tls.conn.send_close_notify();
            let _ = tls.flush();
        }
    });

    format!("https://{addr}")
}

#[test]
fn default_client_reaches_self_signed_server() {
    let client = Client::new(&spawn_https_server(), None);
    let list = client.list_pods(&Selector::new()).unwrap();
    assert_eq!(list.items.len(), 1);
    assert_eq!(list.items[0].id, "secure-1");
}

#[test]
fn default_config_also_skips_verification() {
    let client = Client::from_config(ClientConfig::new(spawn_https_server()));
    assert_eq!(client.list_pods(&Selector::new()).unwrap().items[0].id, "secure-1");
}

#[test]
fn verifying_client_refuses_self_signed_server() {
    let config = ClientConfig::new(spawn_https_server()).with_tls_verification(true);
    let client = Client::from_config(config);
    let err = client.list_pods(&Selector::new()).unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)), "{err:?}");
}
