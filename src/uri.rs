//! File URI parsing
//!
//! API clients address files with `scheme://path` URIs (e.g.
//! `file:///data/files/readme.txt`). The scheme selects which registered
//! filesystem backend handles the operation; the remainder is the path
//! handed to that backend.

use std::path::{Path, PathBuf};

use crate::error::{FuseFilesystemError, Result};

/// A parsed file URI: a backend scheme plus the path within that backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUri {
    scheme: String,
    path: PathBuf,
}

impl FileUri {
    /// Parse a `scheme://path` URI.
    ///
    /// The path component must be absolute (`file:///a/b` parses to `/a/b`).
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();

        let (scheme, rest) = input
            .split_once("://")
            .ok_or_else(|| FuseFilesystemError::InvalidUri(input.to_string()))?;

        if scheme.is_empty()
            || !scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.')
        {
            return Err(FuseFilesystemError::InvalidUri(input.to_string()));
        }

        if !rest.starts_with('/') {
            return Err(FuseFilesystemError::InvalidUri(input.to_string()));
        }

        Ok(Self {
            scheme: scheme.to_ascii_lowercase(),
            path: PathBuf::from(rest),
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Display for FileUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}", self.scheme, self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_file_uri() {
        let uri = FileUri::parse("file:///data/files/readme.txt").unwrap();
        assert_eq!(uri.scheme(), "file");
        assert_eq!(uri.path(), Path::new("/data/files/readme.txt"));
    }

    #[test]
    fn test_parse_root() {
        let uri = FileUri::parse("file:///").unwrap();
        assert_eq!(uri.path(), Path::new("/"));
    }

    #[test]
    fn test_scheme_is_lowercased() {
        let uri = FileUri::parse("FILE:///a").unwrap();
        assert_eq!(uri.scheme(), "file");
    }

    #[test]
    fn test_missing_scheme_is_rejected() {
        assert!(FileUri::parse("/data/files/readme.txt").is_err());
        assert!(FileUri::parse("://x/y").is_err());
    }

    #[test]
    fn test_relative_path_is_rejected() {
        assert!(FileUri::parse("file://data/files").is_err());
    }

    #[test]
    fn test_surrounding_whitespace_is_trimmed() {
        let uri = FileUri::parse("  file:///a/b \n").unwrap();
        assert_eq!(uri.path(), Path::new("/a/b"));
    }
}
