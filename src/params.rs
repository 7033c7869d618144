//! Request parameter decoding
//!
//! Endpoints take one of three body shapes:
//! - a plain-text body holding a single file URI (`/file/size`, `/file/exists`,
//!   `/file/type`),
//! - a JSON object (`/file/read`, `/file/mkdir`, `/file/remove`),
//! - a framed binary body (`/file/append`, `/file/write`, `/file/truncate`):
//!   a big-endian u32 length prefix, that many parameter bytes (a URI or a
//!   JSON object), then the raw file content.

use bytes::{Buf, Bytes};
use serde::Deserialize;

use crate::error::{FuseFilesystemError, Result};

fn default_length() -> i64 {
    -1
}

/// Parameters for `/file/read`
#[derive(Debug, Clone, Deserialize)]
pub struct ReadParams {
    pub path: String,
    #[serde(default = "default_length")]
    pub length: i64,
    #[serde(default)]
    pub offset: u64,
}

/// Parameters for `/file/mkdir` and `/file/remove`
#[derive(Debug, Clone, Deserialize)]
pub struct TreeParams {
    pub path: String,
    #[serde(default)]
    pub recursive: bool,
}

/// Parameters for `/file/write`
#[derive(Debug, Clone, Deserialize)]
pub struct WriteParams {
    pub path: String,
    #[serde(default)]
    pub offset: u64,
}

/// Decode a JSON parameter object from a request body
pub fn from_json<'a, T: Deserialize<'a>>(body: &'a [u8]) -> Result<T> {
    serde_json::from_slice(body)
        .map_err(|e| FuseFilesystemError::InvalidParams(e.to_string()))
}

/// A framed binary body split into its parameter and content sections
#[derive(Debug, Clone)]
pub struct FramedBody {
    pub params: Bytes,
    pub content: Bytes,
}

impl FramedBody {
    /// Split a framed body: u32 BE parameter length, parameters, content.
    pub fn parse(mut body: Bytes) -> Result<Self> {
        if body.len() < 4 {
            return Err(FuseFilesystemError::InvalidParams(
                "framed body shorter than its length prefix".to_string(),
            ));
        }

        let param_len = body.get_u32() as usize;
        if param_len > body.len() {
            return Err(FuseFilesystemError::InvalidParams(format!(
                "parameter length {} exceeds remaining body of {} bytes",
                param_len,
                body.len()
            )));
        }

        let params = body.split_to(param_len);
        Ok(Self {
            params,
            content: body,
        })
    }

    /// Interpret the parameter section as UTF-8 text (a URI)
    pub fn params_str(&self) -> Result<&str> {
        std::str::from_utf8(&self.params)
            .map_err(|_| FuseFilesystemError::InvalidParams("parameters are not UTF-8".to_string()))
    }
}
