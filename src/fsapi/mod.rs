pub mod local;
pub mod registry;

use std::path::Path;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use crate::error::Result;

/// File type enumeration, reported to API clients as its integer value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    File = 0,
    Directory = 1,
}

impl FileType {
    /// Integer value used on the wire
    pub fn as_int(self) -> u8 {
        self as u8
    }
}

/// Stream type for chunked file reads
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// A file read prepared by a backend: the exact number of bytes the
/// stream will yield, plus the stream itself.
pub struct FileRead {
    pub content_length: u64,
    pub stream: ByteStream,
}

impl std::fmt::Debug for FileRead {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileRead")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Clamp a requested read window to what the file can actually serve.
///
/// `length < 0` means "read to the end of the file". The returned value
/// never extends past `file_size` when combined with `offset`.
pub fn clamp_read_window(file_size: u64, offset: u64, length: i64) -> u64 {
    if offset >= file_size {
        return 0;
    }
    let desired = if length < 0 {
        file_size
    } else {
        (length as u64).min(file_size)
    };
    desired.min(file_size - offset)
}

/// Core filesystem API trait for URI-scheme backends
///
/// Backends are stateless and path-based. Each operation receives the
/// path component of an already-parsed URI. The plugin layer handles
/// parameter decoding and scheme resolution.
#[async_trait]
pub trait FsApi: Send + Sync {
    /// Get metadata type for a path
    ///
    /// Errors with NotFound if nothing exists at the path.
    async fn file_type(&self, path: &Path) -> Result<FileType>;

    /// Check if a path exists
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Get the size of a file in bytes
    ///
    /// Errors with NotFound if nothing exists at the path.
    async fn size(&self, path: &Path) -> Result<u64>;

    /// Create a directory
    ///
    /// With `recursive`, missing parents are created as well. Returns
    /// whether a directory was created; an already-existing directory or
    /// a missing parent in non-recursive mode yields `false`.
    async fn mkdir(&self, path: &Path, recursive: bool) -> Result<bool>;

    /// Delete a file or directory
    ///
    /// Returns `false` when nothing exists at the path. Directories with
    /// contents require `recursive`.
    async fn remove(&self, path: &Path, recursive: bool) -> Result<bool>;

    /// Append data to an existing file
    ///
    /// # Returns
    /// Number of bytes written
    async fn append(&self, path: &Path, data: &[u8]) -> Result<u64>;

    /// Write data at a byte offset, leaving the rest of the file intact
    ///
    /// # Returns
    /// Number of bytes written
    async fn write(&self, path: &Path, offset: u64, data: &[u8]) -> Result<u64>;

    /// Truncate a file to zero length, then write the given content (which
    /// may be empty)
    ///
    /// # Returns
    /// Number of bytes written
    async fn truncate(&self, path: &Path, data: &[u8]) -> Result<u64>;

    /// Read a byte range from a file as a chunked stream
    ///
    /// # Arguments
    /// * `offset` - Byte offset to start reading from
    /// * `length` - Number of bytes to read, or -1 for the whole file
    /// * `chunk_size` - Upper bound on individual chunk sizes
    async fn read(
        &self,
        path: &Path,
        offset: u64,
        length: i64,
        chunk_size: usize,
    ) -> Result<FileRead>;
}

impl std::fmt::Debug for dyn FsApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn FsApi")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_whole_file() {
        assert_eq!(clamp_read_window(16, 0, -1), 16);
    }

    #[test]
    fn test_clamp_partial() {
        assert_eq!(clamp_read_window(16, 0, 2), 2);
        assert_eq!(clamp_read_window(16, 1, 2), 2);
    }

    #[test]
    fn test_clamp_overhang() {
        // reading 10 bytes at offset 10 of a 16 byte file serves 6
        assert_eq!(clamp_read_window(16, 10, 10), 6);
        assert_eq!(clamp_read_window(16, 10, -1), 6);
    }

    #[test]
    fn test_clamp_offset_past_eof() {
        assert_eq!(clamp_read_window(16, 16, -1), 0);
        assert_eq!(clamp_read_window(16, 32, 4), 0);
        assert_eq!(clamp_read_window(0, 0, -1), 0);
    }

    #[test]
    fn test_file_type_wire_values() {
        assert_eq!(FileType::File.as_int(), 0);
        assert_eq!(FileType::Directory.as_int(), 1);
    }
}
