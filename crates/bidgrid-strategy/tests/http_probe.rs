//! HTTP probe against a local hyper server.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;

use bidgrid_core::Job;
use bidgrid_strategy::probe::{ExternalHttpStrategy, ExternalHttpStrategyParams};
use bidgrid_strategy::{BidError, BidRequest, BidResponse, SemanticStrategy};

#[derive(Clone)]
struct Reply {
    status: u16,
    content_type: &'static str,
    body: String,
    delay: Duration,
}

impl Reply {
    fn json(body: &str) -> Self {
        Self {
            status: 200,
            content_type: "application/json",
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    fn status(status: u16) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: String::new(),
            delay: Duration::ZERO,
        }
    }
}

type Seen = Arc<Mutex<Vec<(String, Option<String>, serde_json::Value)>>>;

/// Serve `reply` to every request, recording path, content type and body.
async fn serve(reply: Reply) -> (SocketAddr, Seen) {
    serve_with(reply, None).await
}

async fn serve_with(reply: Reply, acceptor: Option<TlsAcceptor>) -> (SocketAddr, Seen) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen: Seen = Arc::default();
    let recorded = seen.clone();

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let reply = reply.clone();
            let recorded = recorded.clone();
            let acceptor = acceptor.clone();

            tokio::spawn(async move {
                let svc = service_fn(move |req: Request<Incoming>| {
                    let reply = reply.clone();
                    let recorded = recorded.clone();
                    async move {
                        let path = req.uri().to_string();
                        let content_type = req
                            .headers()
                            .get("content-type")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        let body = req.into_body().collect().await?.to_bytes();
                        let value = serde_json::from_slice(&body).unwrap_or_default();
                        recorded.lock().unwrap().push((path, content_type, value));

                        tokio::time::sleep(reply.delay).await;
                        Ok::<_, hyper::Error>(
                            Response::builder()
                                .status(reply.status)
                                .header("content-type", reply.content_type)
                                .body(Full::new(Bytes::from(reply.body)))
                                .unwrap(),
                        )
                    }
                });
                match acceptor {
                    Some(acceptor) => {
                        let Ok(stream) = acceptor.accept(stream).await else {
                            return;
                        };
                        let _ = http1::Builder::new()
                            .serve_connection(TokioIo::new(stream), svc)
                            .await;
                    }
                    None => {
                        let _ = http1::Builder::new()
                            .serve_connection(TokioIo::new(stream), svc)
                            .await;
                    }
                }
            });
        }
    });

    (addr, seen)
}

fn strategy(addr: SocketAddr, limit: usize) -> ExternalHttpStrategy {
    ExternalHttpStrategy::new(ExternalHttpStrategyParams {
        url: format!("http://{addr}/bid"),
        timeout: Duration::from_secs(5),
        max_response_bytes: limit,
    })
    .unwrap()
}

fn request() -> BidRequest {
    let job = Job {
        id: "job-42".to_string(),
        ..Default::default()
    };
    BidRequest::new("node-1", job).with_callback("http://requester/callback")
}

#[tokio::test]
async fn json_response_is_returned_verbatim() {
    let (addr, seen) = serve(Reply::json(r#"{"shouldBid": false, "reason": "custom"}"#)).await;

    let resp = strategy(addr, 1024).should_bid(&request()).await.unwrap();

    assert_eq!(
        resp,
        BidResponse {
            should_bid: false,
            should_wait: false,
            reason: "custom".to_string(),
        }
    );

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let (path, content_type, body) = &seen[0];
    assert_eq!(path, "/bid");
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert_eq!(body["nodeId"], "node-1");
    assert_eq!(body["jobId"], "job-42");
    assert_eq!(body["job"]["id"], "job-42");
    assert_eq!(body["callback"], "http://requester/callback");
}

#[tokio::test]
async fn remote_endpoint_can_defer() {
    let (addr, _) = serve(Reply::json(
        r#"{"shouldBid": true, "shouldWait": true, "reason": "needs review"}"#,
    ))
    .await;

    let resp = strategy(addr, 1024).should_bid(&request()).await.unwrap();

    assert!(resp.should_bid);
    assert!(resp.should_wait);
    assert_eq!(resp.reason, "needs review");
}

#[tokio::test]
async fn error_status_rejects() {
    let (addr, _) = serve(Reply::status(503)).await;

    let resp = strategy(addr, 1024).should_bid(&request()).await.unwrap();

    assert!(!resp.should_bid);
    assert!(resp.reason.contains("503"));
    assert!(resp.reason.contains(&addr.to_string()));
}

#[tokio::test]
async fn non_json_success_accepts() {
    let (addr, _) = serve(Reply::status(204)).await;

    let resp = strategy(addr, 1024).should_bid(&request()).await.unwrap();

    assert!(resp.should_bid);
    assert!(!resp.should_wait);
}

#[tokio::test]
async fn oversized_body_is_an_error() {
    let big = format!(r#"{{"shouldBid": true, "reason": "{}"}}"#, "x".repeat(4096));
    let (addr, _) = serve(Reply::json(&big)).await;

    let err = strategy(addr, 1024).should_bid(&request()).await.unwrap_err();

    assert!(matches!(err, BidError::ResponseTooLarge { limit: 1024, .. }));
}

#[tokio::test]
async fn malformed_json_is_an_error() {
    let (addr, _) = serve(Reply::json("{not json")).await;

    let err = strategy(addr, 1024).should_bid(&request()).await.unwrap_err();

    assert!(matches!(err, BidError::InvalidResponse { .. }));
}

#[tokio::test]
async fn slow_endpoint_times_out() {
    let (addr, _) = serve(Reply {
        delay: Duration::from_secs(10),
        ..Reply::json(r#"{"shouldBid": true}"#)
    })
    .await;

    let strategy = ExternalHttpStrategy::new(ExternalHttpStrategyParams {
        url: format!("http://{addr}/bid"),
        timeout: Duration::from_millis(100),
        max_response_bytes: 1024,
    })
    .unwrap();

    let err = strategy.should_bid(&request()).await.unwrap_err();
    assert!(matches!(err, BidError::ProbeTimeout { .. }));
}

/// Self-signed `localhost` certificate: server acceptor plus a client config
/// that trusts only that certificate.
fn localhost_tls() -> (TlsAcceptor, Arc<rustls::ClientConfig>) {
    let key_pair = rcgen::KeyPair::generate().unwrap();
    let cert_params = rcgen::CertificateParams::new(vec!["localhost".to_string()]).unwrap();
    let cert = cert_params.self_signed(&key_pair).unwrap();
    let cert_der = rustls::pki_types::CertificateDer::from(cert.der().to_vec());
    let key_der = rustls::pki_types::PrivateKeyDer::try_from(key_pair.serialize_der()).unwrap();

    let server_config = rustls::ServerConfig::builder_with_provider(
        rustls::crypto::ring::default_provider().into(),
    )
    .with_safe_default_protocol_versions()
    .unwrap()
    .with_no_client_auth()
    .with_single_cert(vec![cert_der.clone()], key_der)
    .unwrap();

    let mut roots = rustls::RootCertStore::empty();
    roots.add(cert_der).unwrap();
    let client_config = rustls::ClientConfig::builder_with_provider(
        rustls::crypto::ring::default_provider().into(),
    )
    .with_safe_default_protocol_versions()
    .unwrap()
    .with_root_certificates(roots)
    .with_no_client_auth();

    (
        TlsAcceptor::from(Arc::new(server_config)),
        Arc::new(client_config),
    )
}

fn https_strategy(url: String) -> ExternalHttpStrategy {
    ExternalHttpStrategy::new(ExternalHttpStrategyParams {
        url,
        timeout: Duration::from_secs(5),
        max_response_bytes: 1024,
    })
    .unwrap()
}

#[tokio::test]
async fn https_endpoint_decides_over_tls() {
    let (acceptor, client_config) = localhost_tls();
    let (addr, seen) = serve_with(
        Reply::json(r#"{"shouldBid": true, "reason": "tls ok"}"#),
        Some(acceptor),
    )
    .await;

    let resp = https_strategy(format!("https://localhost:{}/bid", addr.port()))
        .with_tls_config(client_config)
        .should_bid(&request())
        .await
        .unwrap();

    assert!(resp.should_bid);
    assert_eq!(resp.reason, "tls ok");
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].2["jobId"], "job-42");
}

#[tokio::test]
async fn untrusted_certificate_is_a_transport_error() {
    let (acceptor, _) = localhost_tls();
    let (addr, seen) = serve_with(Reply::status(200), Some(acceptor)).await;

    // Default webpki roots do not include the self-signed certificate.
    let err = https_strategy(format!("https://localhost:{}/bid", addr.port()))
        .should_bid(&request())
        .await
        .unwrap_err();

    assert!(matches!(err, BidError::Transport { .. }), "{err:?}");
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn https_against_plain_http_is_a_transport_error() {
    let (addr, seen) = serve(Reply::status(200)).await;

    let err = https_strategy(format!("https://{addr}/bid"))
        .should_bid(&request())
        .await
        .unwrap_err();

    assert!(matches!(err, BidError::Transport { .. }), "{err:?}");
    assert!(seen.lock().unwrap().is_empty());
}
