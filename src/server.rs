//! Local API bridge
//!
//! Hosts registered plugins on a loopback HTTP/1 listener. Requests are
//! routed as `POST /api/{plugin_id}{endpoint}` and must carry the
//! per-process API secret in the `X-Fuse-Secret` header; the secret is
//! checked before any body is read. Handler errors become JSON payloads
//! with the plugin's tag, code, and message.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;
use futures::TryStreamExt;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderValue, Request, Response, StatusCode};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use hyper::body::{Frame, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{FuseFilesystemError, Result};
use crate::plugin::{ApiPlugin, ApiRequest, ApiResponse, ResponseBody};

/// Header carrying the per-process API secret
pub const SECRET_HEADER: &str = "x-fuse-secret";

type OutBody = UnsyncBoxBody<Bytes, FuseFilesystemError>;

fn empty_body() -> OutBody {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed_unsync()
}

fn full_body(data: Bytes) -> OutBody {
    Full::new(data).map_err(|never| match never {}).boxed_unsync()
}

/// Plugin host: the set of registered plugins plus the API secret
pub struct ApiBridge {
    plugins: DashMap<String, Arc<dyn ApiPlugin>>,
    secret: String,
}

impl ApiBridge {
    /// Create a bridge with a freshly generated secret
    pub fn new() -> Self {
        Self::with_secret(Uuid::new_v4().to_string())
    }

    /// Create a bridge with a caller-supplied secret
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            plugins: DashMap::new(),
            secret: secret.into(),
        }
    }

    /// The secret clients must present in `X-Fuse-Secret`
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Register a plugin under its ID, replacing any existing one
    pub fn register_plugin(&self, plugin: Arc<dyn ApiPlugin>) {
        info!("registering plugin {}", plugin.id());
        self.plugins.insert(plugin.id().to_string(), plugin);
    }

    fn plugin(&self, id: &str) -> Option<Arc<dyn ApiPlugin>> {
        self.plugins.get(id).map(|entry| entry.value().clone())
    }
}

impl Default for ApiBridge {
    fn default() -> Self {
        Self::new()
    }
}

/// The bound HTTP/1 listener serving an `ApiBridge`
pub struct ApiServer {
    bridge: Arc<ApiBridge>,
    listener: TcpListener,
    addr: SocketAddr,
}

impl ApiServer {
    /// Bind the bridge to `host:port`. Port 0 selects an ephemeral port.
    pub async fn bind(host: &str, port: u16, bridge: Arc<ApiBridge>) -> Result<Self> {
        let listener = TcpListener::bind((host, port)).await?;
        let addr = listener.local_addr()?;
        info!("API bridge listening on {}", addr);
        Ok(Self {
            bridge,
            listener,
            addr,
        })
    }

    /// The address the listener is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Accept and serve connections until the shutdown signal fires
    pub async fn serve(self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let ApiServer {
            bridge, listener, ..
        } = self;

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer) = accepted?;
                    let bridge = bridge.clone();
                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);
                        let service = service_fn(move |req| {
                            let bridge = bridge.clone();
                            async move {
                                Ok::<_, Infallible>(handle_request(bridge, req).await)
                            }
                        });
                        if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                            debug!("connection from {} ended with error: {}", peer, e);
                        }
                    });
                }
                _ = shutdown.changed() => {
                    info!("API bridge shutting down");
                    return Ok(());
                }
            }
        }
    }
}

/// Split an `/api/{plugin_id}{endpoint}` path into its components
fn split_route(path: &str) -> Option<(&str, &str)> {
    let rest = path.strip_prefix("/api/")?;
    let slash = rest.find('/')?;
    let (plugin_id, endpoint) = rest.split_at(slash);
    if plugin_id.is_empty() || endpoint.len() < 2 {
        return None;
    }
    Some((plugin_id, endpoint))
}

async fn handle_request(bridge: Arc<ApiBridge>, req: Request<Incoming>) -> Response<OutBody> {
    // The secret gate comes first, before any body is read
    let presented = req
        .headers()
        .get(SECRET_HEADER)
        .and_then(|v| v.to_str().ok());
    if presented != Some(bridge.secret()) {
        warn!("rejected request to {} with bad secret", req.uri().path());
        return plain_response(StatusCode::UNAUTHORIZED, "invalid API secret");
    }

    if req.method() != http::Method::POST {
        return plain_response(StatusCode::METHOD_NOT_ALLOWED, "method not allowed");
    }

    match dispatch(bridge, req).await {
        Ok(response) => into_http(response),
        Err(e) => error_response(&e),
    }
}

async fn dispatch(
    bridge: Arc<ApiBridge>,
    req: Request<Incoming>,
) -> Result<ApiResponse> {
    let path = req.uri().path().to_string();

    let (plugin_id, endpoint) = split_route(&path)
        .ok_or_else(|| FuseFilesystemError::UnknownEndpoint(path.clone()))?;

    let plugin = bridge
        .plugin(plugin_id)
        .ok_or_else(|| FuseFilesystemError::UnknownEndpoint(path.clone()))?;

    let endpoint = endpoint.to_string();
    let body = req
        .into_body()
        .collect()
        .await
        .map_err(|e| FuseFilesystemError::Io(std::io::Error::other(e)))?
        .to_bytes();

    plugin.handle(ApiRequest { endpoint, body }).await
}

fn into_http(response: ApiResponse) -> Response<OutBody> {
    let (body, content_length) = match response.body {
        ResponseBody::Empty => (empty_body(), Some(0)),
        ResponseBody::Bytes(bytes) => {
            let len = bytes.len() as u64;
            (full_body(bytes), Some(len))
        }
        ResponseBody::Stream {
            content_length,
            stream,
        } => (
            UnsyncBoxBody::new(StreamBody::new(stream.map_ok(Frame::data))),
            Some(content_length),
        ),
    };

    let mut http_response = Response::new(body);
    *http_response.status_mut() =
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    http_response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(response.content_type));
    if let Some(len) = content_length {
        http_response
            .headers_mut()
            .insert(CONTENT_LENGTH, HeaderValue::from(len));
    }
    http_response
}

fn error_response(error: &FuseFilesystemError) -> Response<OutBody> {
    debug!("request failed: {}", error);
    let payload = serde_json::to_vec(&error.to_payload()).unwrap_or_default();

    let mut response = Response::new(full_body(Bytes::from(payload)));
    *response.status_mut() =
        StatusCode::from_u16(error.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

fn plain_response(status: StatusCode, message: &'static str) -> Response<OutBody> {
    let mut response = Response::new(full_body(Bytes::from_static(message.as_bytes())));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_route() {
        assert_eq!(
            split_route("/api/FuseFilesystem/file/read"),
            Some(("FuseFilesystem", "/file/read"))
        );
    }

    #[test]
    fn test_split_route_rejects_bad_paths() {
        assert_eq!(split_route("/file/read"), None);
        assert_eq!(split_route("/api/"), None);
        assert_eq!(split_route("/api/FuseFilesystem"), None);
        assert_eq!(split_route("/api/FuseFilesystem/"), None);
    }

    #[test]
    fn test_bridge_secret_is_unique_per_process() {
        let a = ApiBridge::new();
        let b = ApiBridge::new();
        assert_ne!(a.secret(), b.secret());
    }
}
