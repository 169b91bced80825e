//! HTTP webhook probe.
//!
//! POSTs the probe document as `application/json`. Status 400 and above
//! rejects; a non-JSON answer below 400 accepts; a JSON answer is decoded as
//! a `BidResponse` and returned as-is, which lets the endpoint defer the
//! decision with `shouldWait`.
//!
//! `http://` and `https://` endpoints. Each evaluation opens one hyper
//! HTTP/1 connection, wrapped in rustls for `https` and verified against the
//! webpki root store unless a custom client config is supplied.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE, HOST, USER_AGENT};
use http::{Method, Request, Uri};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::Response;
use hyper::body::Incoming;
use hyper_util::rt::TokioIo;
use rustls::ClientConfig;
use rustls::pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::debug;

use super::probe_payload;
use crate::error::{BidError, BidResult};
use crate::model::{BidFuture, BidRequest, BidResponse, SemanticStrategy};

const USER_AGENT_VALUE: &str = concat!("bidgrid/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct ExternalHttpStrategyParams {
    /// Endpoint URL. Empty disables the probe.
    pub url: String,
    pub timeout: Duration,
    /// Cap on the JSON body read back from the endpoint.
    pub max_response_bytes: usize,
}

#[derive(Debug, Clone)]
struct Endpoint {
    tls: bool,
    host: String,
    port: u16,
    authority: String,
    path: String,
}

impl Endpoint {
    fn parse(url: &str) -> BidResult<Self> {
        let uri: Uri = url
            .parse()
            .map_err(|e| BidError::Config(format!("invalid probe url `{url}`: {e}")))?;

        let tls = match uri.scheme_str() {
            Some("http") => false,
            Some("https") => true,
            Some(other) => {
                return Err(BidError::Config(format!(
                    "probe url `{url}` uses unsupported scheme `{other}`; expected http or https"
                )));
            }
            None => {
                return Err(BidError::Config(format!(
                    "probe url `{url}` must be absolute (http://host[:port]/path)"
                )));
            }
        };

        let (Some(host), Some(authority)) = (uri.host(), uri.authority()) else {
            return Err(BidError::Config(format!("probe url `{url}` has no host")));
        };

        Ok(Self {
            tls,
            host: host.trim_start_matches('[').trim_end_matches(']').to_string(),
            port: uri.port_u16().unwrap_or(if tls { 443 } else { 80 }),
            authority: authority.as_str().to_string(),
            path: uri
                .path_and_query()
                .map(|p| p.as_str().to_string())
                .unwrap_or_else(|| "/".to_string()),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ExternalHttpStrategy {
    url: String,
    endpoint: Option<Endpoint>,
    /// Present only for `https` endpoints.
    tls: Option<Arc<ClientConfig>>,
    timeout: Duration,
    max_response_bytes: usize,
}

/// Client config trusting the bundled webpki roots.
fn default_tls_config() -> BidResult<Arc<ClientConfig>> {
    let mut root_store = rustls::RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let config = ClientConfig::builder_with_provider(
        rustls::crypto::ring::default_provider().into(),
    )
    .with_safe_default_protocol_versions()
    .map_err(|e| BidError::Config(format!("tls protocol version error: {e}")))?
    .with_root_certificates(root_store)
    .with_no_client_auth();
    Ok(Arc::new(config))
}

impl ExternalHttpStrategy {
    pub fn new(params: ExternalHttpStrategyParams) -> BidResult<Self> {
        let url = params.url.trim().to_string();
        let endpoint = if url.is_empty() {
            None
        } else {
            Some(Endpoint::parse(&url)?)
        };
        if params.max_response_bytes == 0 {
            return Err(BidError::Config(
                "probe response limit must be positive".to_string(),
            ));
        }
        let tls = match &endpoint {
            Some(endpoint) if endpoint.tls => Some(default_tls_config()?),
            _ => None,
        };
        Ok(Self {
            url,
            endpoint,
            tls,
            timeout: params.timeout,
            max_response_bytes: params.max_response_bytes,
        })
    }

    /// Replace the client config used for `https` endpoints, e.g. to trust a
    /// private CA. No effect on `http` endpoints.
    pub fn with_tls_config(mut self, config: Arc<ClientConfig>) -> Self {
        if self.tls.is_some() {
            self.tls = Some(config);
        }
        self
    }

    fn transport(&self, message: String) -> BidError {
        BidError::Transport {
            target: self.url.clone(),
            message,
        }
    }

    async fn exchange(&self, endpoint: &Endpoint, payload: String) -> BidResult<BidResponse> {
        let transport = |message: String| self.transport(message);

        let stream = TcpStream::connect((endpoint.host.as_str(), endpoint.port))
            .await
            .map_err(|e| transport(format!("connect failed: {e}")))?;

        let resp = match &self.tls {
            Some(config) => {
                let server_name = ServerName::try_from(endpoint.host.as_str())
                    .map_err(|e| transport(format!("invalid tls server name: {e}")))?
                    .to_owned();
                let stream = TlsConnector::from(config.clone())
                    .connect(server_name, stream)
                    .await
                    .map_err(|e| transport(format!("tls handshake failed: {e}")))?;
                self.send(stream, endpoint, payload).await?
            }
            None => self.send(stream, endpoint, payload).await?,
        };

        let status = resp.status();
        debug!(url = %self.url, %status, "probe endpoint answered");

        if status.as_u16() >= 400 {
            return Ok(BidResponse::reject(format!(
                "url `{}` returned {} status code",
                self.url,
                status.as_u16()
            )));
        }

        let is_json = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(is_json_content_type);
        if !is_json {
            return Ok(BidResponse::accept(format!(
                "url `{}` returned {} status code",
                self.url,
                status.as_u16()
            )));
        }

        let body = Limited::new(resp.into_body(), self.max_response_bytes)
            .collect()
            .await
            .map_err(|e| {
                if e.downcast_ref::<LengthLimitError>().is_some() {
                    BidError::ResponseTooLarge {
                        target: self.url.clone(),
                        limit: self.max_response_bytes,
                    }
                } else {
                    transport(format!("failed to read response body: {e}"))
                }
            })?
            .to_bytes();

        serde_json::from_slice(&body).map_err(|source| BidError::InvalidResponse {
            target: self.url.clone(),
            source,
        })
    }

    /// POST the payload over an established stream.
    async fn send<S>(
        &self,
        stream: S,
        endpoint: &Endpoint,
        payload: String,
    ) -> BidResult<Response<Incoming>>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let transport = |message: String| self.transport(message);

        let io = TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| transport(format!("handshake failed: {e}")))?;

        // Drive the connection in the background.
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                debug!(error = %e, "probe connection closed with error");
            }
        });

        let req = Request::builder()
            .method(Method::POST)
            .uri(endpoint.path.as_str())
            .header(HOST, endpoint.authority.as_str())
            .header(USER_AGENT, USER_AGENT_VALUE)
            .header(CONTENT_TYPE, "application/json")
            .header(CONTENT_LENGTH, payload.len())
            .body(Full::new(Bytes::from(payload)))
            .map_err(|e| transport(format!("invalid request: {e}")))?;

        sender
            .send_request(req)
            .await
            .map_err(|e| transport(format!("request failed: {e}")))
    }
}

fn is_json_content_type(value: &str) -> bool {
    value
        .split(';')
        .next()
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

impl SemanticStrategy for ExternalHttpStrategy {
    fn name(&self) -> &str {
        "external-http"
    }

    fn should_bid<'a>(&'a self, request: &'a BidRequest) -> BidFuture<'a> {
        Box::pin(async move {
            let Some(endpoint) = &self.endpoint else {
                return Ok(BidResponse::accept("probe url not configured"));
            };

            let payload = probe_payload(request, None)?;
            tokio::time::timeout(self.timeout, self.exchange(endpoint, payload))
                .await
                .map_err(|_| BidError::ProbeTimeout {
                    target: self.url.clone(),
                    timeout: self.timeout,
                })?
        })
    }
}
