//! Endpoint handlers for the filesystem plugin
//!
//! Each handler decodes its parameter shape, resolves the URI's backend
//! through the registry, performs the operation, and encodes the response
//! exactly as API clients expect: decimal numbers and `"true"`/`"false"`
//! as plain text, file contents as a streamed octet body.

use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{FuseFilesystemError, Result};
use crate::fsapi::FsApi;
use crate::params::{self, FramedBody, ReadParams, TreeParams, WriteParams};
use crate::plugin::{ApiRequest, ApiResponse, FilesystemPlugin};
use crate::uri::FileUri;

/// Resolve a URI string to its backend and path
fn resolve(plugin: &FilesystemPlugin, uri: &str) -> Result<(Arc<dyn FsApi>, PathBuf)> {
    let uri = FileUri::parse(uri)?;
    let backend = plugin.registry().resolve(&uri)?;
    Ok((backend, uri.path().to_path_buf()))
}

/// Interpret a plain-text body as a URI
fn body_as_uri(request: &ApiRequest) -> Result<String> {
    let text = std::str::from_utf8(&request.body)
        .map_err(|_| FuseFilesystemError::InvalidParams("body is not UTF-8".to_string()))?;
    Ok(text.trim().to_string())
}

/// `/file/type`: plain body is a URI; responds with the integer file type
pub async fn file_type(plugin: &FilesystemPlugin, request: ApiRequest) -> Result<ApiResponse> {
    let (backend, path) = resolve(plugin, &body_as_uri(&request)?)?;
    let file_type = backend.file_type(&path).await?;
    Ok(ApiResponse::text(file_type.as_int().to_string()))
}

/// `/file/size`: plain body is a URI; responds with the decimal size
pub async fn size(plugin: &FilesystemPlugin, request: ApiRequest) -> Result<ApiResponse> {
    let (backend, path) = resolve(plugin, &body_as_uri(&request)?)?;
    let size = backend.size(&path).await?;
    Ok(ApiResponse::text(size.to_string()))
}

/// `/file/exists`: plain body is a URI; responds `"true"` or `"false"`
pub async fn exists(plugin: &FilesystemPlugin, request: ApiRequest) -> Result<ApiResponse> {
    let (backend, path) = resolve(plugin, &body_as_uri(&request)?)?;
    let exists = backend.exists(&path).await?;
    Ok(ApiResponse::text(if exists { "true" } else { "false" }))
}

/// `/file/mkdir`: JSON `{path, recursive}`; responds `"true"`/`"false"`
pub async fn mkdir(plugin: &FilesystemPlugin, request: ApiRequest) -> Result<ApiResponse> {
    let params: TreeParams = params::from_json(&request.body)?;
    let (backend, path) = resolve(plugin, &params.path)?;
    let created = backend.mkdir(&path, params.recursive).await?;
    Ok(ApiResponse::text(if created { "true" } else { "false" }))
}

/// `/file/remove`: JSON `{path, recursive}`; responds `"true"`/`"false"`
pub async fn remove(plugin: &FilesystemPlugin, request: ApiRequest) -> Result<ApiResponse> {
    let params: TreeParams = params::from_json(&request.body)?;
    let (backend, path) = resolve(plugin, &params.path)?;
    let deleted = backend.remove(&path, params.recursive).await?;
    Ok(ApiResponse::text(if deleted { "true" } else { "false" }))
}

/// `/file/read`: JSON `{path, length, offset}`; responds with a streamed
/// octet body, or an empty 200 when the readable window is zero
pub async fn read(plugin: &FilesystemPlugin, request: ApiRequest) -> Result<ApiResponse> {
    let params: ReadParams = params::from_json(&request.body)?;
    let (backend, path) = resolve(plugin, &params.path)?;

    let file_read = backend
        .read(&path, params.offset, params.length, plugin.chunk_size())
        .await?;

    if file_read.content_length == 0 {
        return Ok(ApiResponse::empty());
    }

    Ok(ApiResponse::octet_stream(
        file_read.content_length,
        file_read.stream,
    ))
}

/// `/file/append`: framed body, params = URI; responds with bytes written
pub async fn append(plugin: &FilesystemPlugin, request: ApiRequest) -> Result<ApiResponse> {
    let framed = FramedBody::parse(request.body)?;
    let (backend, path) = resolve(plugin, framed.params_str()?)?;

    if framed.content.is_empty() {
        return Ok(ApiResponse::text("0"));
    }

    let written = backend.append(&path, &framed.content).await?;
    Ok(ApiResponse::text(written.to_string()))
}

/// `/file/write`: framed body, params = JSON `{path, offset}`; responds
/// with bytes written
pub async fn write(plugin: &FilesystemPlugin, request: ApiRequest) -> Result<ApiResponse> {
    let framed = FramedBody::parse(request.body)?;
    let params: WriteParams = params::from_json(&framed.params)?;
    let (backend, path) = resolve(plugin, &params.path)?;

    let written = backend.write(&path, params.offset, &framed.content).await?;
    Ok(ApiResponse::text(written.to_string()))
}

/// `/file/truncate`: framed body, params = URI, content optional; responds
/// with bytes written
pub async fn truncate(plugin: &FilesystemPlugin, request: ApiRequest) -> Result<ApiResponse> {
    let framed = FramedBody::parse(request.body)?;
    let (backend, path) = resolve(plugin, framed.params_str()?)?;

    let written = backend.truncate(&path, &framed.content).await?;
    Ok(ApiResponse::text(written.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::{ApiPlugin, ResponseBody};
    use bytes::{BufMut, Bytes, BytesMut};
    use futures::TryStreamExt;
    use tempfile::TempDir;

    fn uri_for(dir: &TempDir, name: &str) -> String {
        format!("file://{}/{}", dir.path().display(), name)
    }

    fn json_request(endpoint: &str, value: serde_json::Value) -> ApiRequest {
        ApiRequest {
            endpoint: endpoint.to_string(),
            body: Bytes::from(value.to_string()),
        }
    }

    fn framed_request(endpoint: &str, params: &str, content: &[u8]) -> ApiRequest {
        let mut buf = BytesMut::new();
        buf.put_u32(params.len() as u32);
        buf.put_slice(params.as_bytes());
        buf.put_slice(content);
        ApiRequest {
            endpoint: endpoint.to_string(),
            body: buf.freeze(),
        }
    }

    fn text_of(response: ApiResponse) -> String {
        match response.body {
            ResponseBody::Bytes(b) => String::from_utf8(b.to_vec()).unwrap(),
            ResponseBody::Empty => String::new(),
            ResponseBody::Stream { .. } => panic!("expected text body"),
        }
    }

    async fn stream_of(response: ApiResponse) -> Vec<u8> {
        match response.body {
            ResponseBody::Stream { stream, .. } => {
                let chunks: Vec<Bytes> = stream.try_collect().await.unwrap();
                chunks.concat()
            }
            _ => panic!("expected stream body"),
        }
    }

    #[tokio::test]
    async fn test_type_endpoint_reports_directory() {
        let dir = TempDir::new().unwrap();
        let plugin = FilesystemPlugin::with_defaults();

        let request = ApiRequest {
            endpoint: "/file/type".to_string(),
            body: Bytes::from(format!("file://{}", dir.path().display())),
        };
        let response = plugin.handle(request).await.unwrap();
        assert_eq!(text_of(response), "1");
    }

    #[tokio::test]
    async fn test_size_endpoint() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("sizeTestFile"), vec![0u8; 512]).unwrap();
        let plugin = FilesystemPlugin::with_defaults();

        let request = ApiRequest {
            endpoint: "/file/size".to_string(),
            body: Bytes::from(uri_for(&dir, "sizeTestFile")),
        };
        let response = plugin.handle(request).await.unwrap();
        assert_eq!(text_of(response), "512");
    }

    #[tokio::test]
    async fn test_read_endpoint_streams_window() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("readTest"), b"Hello Test File!").unwrap();
        let plugin = FilesystemPlugin::with_defaults();

        let request = json_request(
            "/file/read",
            serde_json::json!({"path": uri_for(&dir, "readTest"), "length": 2, "offset": 1}),
        );
        let response = plugin.handle(request).await.unwrap();
        assert_eq!(response.content_type, "application/octet-stream");
        assert_eq!(stream_of(response).await, b"el");
    }

    #[tokio::test]
    async fn test_read_of_zero_window_is_empty_200() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("empty"), b"").unwrap();
        let plugin = FilesystemPlugin::with_defaults();

        let request = json_request(
            "/file/read",
            serde_json::json!({"path": uri_for(&dir, "empty"), "length": -1, "offset": 0}),
        );
        let response = plugin.handle(request).await.unwrap();
        assert_eq!(response.status, 200);
        assert!(matches!(response.body, ResponseBody::Empty));
    }

    #[tokio::test]
    async fn test_append_endpoint_reports_bytes_written() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("appendFileTest"), b"Initial State!").unwrap();
        let plugin = FilesystemPlugin::with_defaults();

        let request = framed_request(
            "/file/append",
            &uri_for(&dir, "appendFileTest"),
            b" + more data!",
        );
        let response = plugin.handle(request).await.unwrap();
        assert_eq!(text_of(response), "13");
        assert_eq!(
            std::fs::read(dir.path().join("appendFileTest")).unwrap(),
            b"Initial State! + more data!"
        );
    }

    #[tokio::test]
    async fn test_append_empty_content_is_zero() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("f"), b"x").unwrap();
        let plugin = FilesystemPlugin::with_defaults();

        let request = framed_request("/file/append", &uri_for(&dir, "f"), b"");
        assert_eq!(text_of(plugin.handle(request).await.unwrap()), "0");
    }

    #[tokio::test]
    async fn test_write_endpoint_with_offset() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("writeFileTest"), b"Initial State!").unwrap();
        let plugin = FilesystemPlugin::with_defaults();

        let params =
            serde_json::json!({"path": uri_for(&dir, "writeFileTest"), "offset": 2}).to_string();
        let request = framed_request("/file/write", &params, b"Rewrite");
        let response = plugin.handle(request).await.unwrap();
        assert_eq!(text_of(response), "7");
        assert_eq!(
            std::fs::read(dir.path().join("writeFileTest")).unwrap(),
            b"InRewritetate!"
        );
    }

    #[tokio::test]
    async fn test_truncate_endpoint_with_new_content() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("truncateTest1"), b"Initial State!").unwrap();
        let plugin = FilesystemPlugin::with_defaults();

        let request =
            framed_request("/file/truncate", &uri_for(&dir, "truncateTest1"), b"new content");
        let response = plugin.handle(request).await.unwrap();
        assert_eq!(text_of(response), "11");
        assert_eq!(
            std::fs::read(dir.path().join("truncateTest1")).unwrap(),
            b"new content"
        );
    }

    #[tokio::test]
    async fn test_remove_missing_path_is_false() {
        let dir = TempDir::new().unwrap();
        let plugin = FilesystemPlugin::with_defaults();

        let request = json_request(
            "/file/remove",
            serde_json::json!({"path": uri_for(&dir, "doesNotExists"), "recursive": false}),
        );
        assert_eq!(text_of(plugin.handle(request).await.unwrap()), "false");
    }

    #[tokio::test]
    async fn test_unknown_endpoint_is_rejected() {
        let plugin = FilesystemPlugin::with_defaults();
        let request = ApiRequest {
            endpoint: "/file/chmod".to_string(),
            body: Bytes::new(),
        };
        let err = plugin.handle(request).await.unwrap_err();
        assert!(matches!(err, FuseFilesystemError::UnknownEndpoint(_)));
    }
}
