//! Local filesystem backend
//!
//! Implements the `FsApi` trait for the `file://` scheme using tokio's
//! filesystem primitives. This is the backend every deployment registers;
//! additional schemes can be layered on top via the registry.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use async_stream::try_stream;
use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, trace};

use crate::error::{FuseFilesystemError, Result};
use crate::fsapi::{clamp_read_window, FileRead, FileType, FsApi};

/// `FsApi` implementation over the local filesystem
#[derive(Debug, Default)]
pub struct LocalFs;

impl LocalFs {
    pub fn new() -> Self {
        Self
    }
}

fn not_found(path: &Path) -> FuseFilesystemError {
    FuseFilesystemError::NotFound(path.display().to_string())
}

#[async_trait]
impl FsApi for LocalFs {
    async fn file_type(&self, path: &Path) -> Result<FileType> {
        let meta = fs::metadata(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                not_found(path)
            } else {
                e.into()
            }
        })?;

        if meta.is_dir() {
            Ok(FileType::Directory)
        } else {
            Ok(FileType::File)
        }
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        match fs::metadata(path).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn size(&self, path: &Path) -> Result<u64> {
        let meta = fs::metadata(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                not_found(path)
            } else {
                e.into()
            }
        })?;

        Ok(meta.len())
    }

    async fn mkdir(&self, path: &Path, recursive: bool) -> Result<bool> {
        // An existing directory is not an error, just "nothing created"
        if fs::metadata(path).await.is_ok() {
            return Ok(false);
        }

        let result = if recursive {
            fs::create_dir_all(path).await
        } else {
            fs::create_dir(path).await
        };

        match result {
            Ok(()) => {
                debug!("mkdir: created {:?} (recursive={})", path, recursive);
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                Err(FuseFilesystemError::PermissionDenied)
            }
            Err(e)
                if e.kind() == std::io::ErrorKind::NotFound
                    || e.kind() == std::io::ErrorKind::AlreadyExists =>
            {
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, path: &Path, recursive: bool) -> Result<bool> {
        let meta = match fs::metadata(path).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };

        if meta.is_dir() {
            if recursive {
                fs::remove_dir_all(path).await?;
            } else {
                match fs::remove_dir(path).await {
                    Ok(()) => {}
                    // A non-empty directory cannot be removed without recursion
                    Err(e) if e.kind() == std::io::ErrorKind::DirectoryNotEmpty => {
                        return Ok(false)
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        } else {
            fs::remove_file(path).await?;
        }

        debug!("remove: deleted {:?} (recursive={})", path, recursive);
        Ok(true)
    }

    async fn append(&self, path: &Path, data: &[u8]) -> Result<u64> {
        if data.is_empty() {
            return Ok(0);
        }

        let mut file = fs::OpenOptions::new()
            .append(true)
            .open(path)
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    not_found(path)
                } else {
                    e.into()
                }
            })?;

        file.write_all(data).await?;
        file.flush().await?;

        trace!("append: wrote {} bytes to {:?}", data.len(), path);
        Ok(data.len() as u64)
    }

    async fn write(&self, path: &Path, offset: u64, data: &[u8]) -> Result<u64> {
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .open(path)
            .await?;

        if offset > 0 {
            file.seek(SeekFrom::Start(offset)).await?;
        }
        file.write_all(data).await?;
        file.flush().await?;

        trace!(
            "write: wrote {} bytes to {:?} at offset {}",
            data.len(),
            path,
            offset
        );
        Ok(data.len() as u64)
    }

    async fn truncate(&self, path: &Path, data: &[u8]) -> Result<u64> {
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .await?;

        if !data.is_empty() {
            file.write_all(data).await?;
            file.flush().await?;
        }

        trace!("truncate: {:?} now holds {} bytes", path, data.len());
        Ok(data.len() as u64)
    }

    async fn read(
        &self,
        path: &Path,
        offset: u64,
        length: i64,
        chunk_size: usize,
    ) -> Result<FileRead> {
        let meta = fs::metadata(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                not_found(path)
            } else {
                e.into()
            }
        })?;

        let content_length = clamp_read_window(meta.len(), offset, length);

        if content_length == 0 {
            return Ok(FileRead {
                content_length: 0,
                stream: Box::pin(futures::stream::empty()),
            });
        }

        let mut file = fs::File::open(path).await?;
        if offset > 0 {
            file.seek(SeekFrom::Start(offset)).await?;
        }

        // Never allocate past what will actually be served
        let chunk = chunk_size.min(content_length as usize).max(1);
        let owned_path: PathBuf = path.to_path_buf();

        let stream = try_stream! {
            let mut remaining = content_length;
            let mut buffer = vec![0u8; chunk];

            while remaining > 0 {
                let want = chunk.min(remaining as usize);
                let n = file.read(&mut buffer[..want]).await?;
                if n == 0 {
                    // File shrank underneath us; serve what we have
                    debug!("read: {:?} hit EOF with {} bytes remaining", owned_path, remaining);
                    break;
                }
                remaining -= n as u64;
                yield Bytes::copy_from_slice(&buffer[..n]);
            }
        };

        Ok(FileRead {
            content_length,
            stream: Box::pin(stream),
        })
    }
}
