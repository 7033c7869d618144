//! Plugin surface of the API bridge
//!
//! The bridge hosts plugins; each plugin owns a set of endpoints under its
//! plugin ID. This module defines the request/response bridge types, the
//! `ApiPlugin` trait, and the filesystem plugin itself.

pub mod handlers;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::error::{FuseFilesystemError, Result};
use crate::fsapi::registry::FsApiRegistry;
use crate::fsapi::ByteStream;

/// Plugin ID the filesystem endpoints are registered under
pub const PLUGIN_ID: &str = "FuseFilesystem";

/// Default upper bound on read stream chunk sizes
pub const DEFAULT_CHUNK_SIZE: usize = 65536;

/// An API request routed to a plugin
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// Endpoint path within the plugin (e.g. `/file/read`)
    pub endpoint: String,
    /// Raw request body
    pub body: Bytes,
}

/// Body of an API response
pub enum ResponseBody {
    Empty,
    Bytes(Bytes),
    Stream {
        content_length: u64,
        stream: ByteStream,
    },
}

/// An API response produced by a plugin handler
pub struct ApiResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: ResponseBody,
}

impl std::fmt::Debug for ApiResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiResponse")
            .field("status", &self.status)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

impl ApiResponse {
    /// 200 with a plain-text body
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            content_type: "text/plain",
            body: ResponseBody::Bytes(Bytes::from(body.into())),
        }
    }

    /// 200 with an empty body
    pub fn empty() -> Self {
        Self {
            status: 200,
            content_type: "text/plain",
            body: ResponseBody::Empty,
        }
    }

    /// 200 streaming `application/octet-stream` body
    pub fn octet_stream(content_length: u64, stream: ByteStream) -> Self {
        Self {
            status: 200,
            content_type: "application/octet-stream",
            body: ResponseBody::Stream {
                content_length,
                stream,
            },
        }
    }
}

/// A plugin hosted on the API bridge
#[async_trait]
pub trait ApiPlugin: Send + Sync {
    /// Plugin ID used in request routing
    fn id(&self) -> &str;

    /// Handle a request routed to one of this plugin's endpoints
    async fn handle(&self, request: ApiRequest) -> Result<ApiResponse>;
}

/// The filesystem plugin: `/file/*` endpoints over scheme-resolved backends
pub struct FilesystemPlugin {
    registry: Arc<FsApiRegistry>,
    chunk_size: usize,
}

impl FilesystemPlugin {
    pub fn new(registry: Arc<FsApiRegistry>, chunk_size: usize) -> Self {
        Self {
            registry,
            chunk_size,
        }
    }

    /// Plugin over a default registry (`file` scheme only)
    pub fn with_defaults() -> Self {
        Self::new(Arc::new(FsApiRegistry::new()), DEFAULT_CHUNK_SIZE)
    }

    pub fn registry(&self) -> &Arc<FsApiRegistry> {
        &self.registry
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

#[async_trait]
impl ApiPlugin for FilesystemPlugin {
    fn id(&self) -> &str {
        PLUGIN_ID
    }

    async fn handle(&self, request: ApiRequest) -> Result<ApiResponse> {
        debug!("handling {} ({} byte body)", request.endpoint, request.body.len());

        match request.endpoint.as_str() {
            "/file/type" => handlers::file_type(self, request).await,
            "/file/size" => handlers::size(self, request).await,
            "/file/exists" => handlers::exists(self, request).await,
            "/file/mkdir" => handlers::mkdir(self, request).await,
            "/file/remove" => handlers::remove(self, request).await,
            "/file/read" => handlers::read(self, request).await,
            "/file/append" => handlers::append(self, request).await,
            "/file/write" => handlers::write(self, request).await,
            "/file/truncate" => handlers::truncate(self, request).await,
            other => Err(FuseFilesystemError::UnknownEndpoint(other.to_string())),
        }
    }
}
