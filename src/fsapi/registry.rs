//! URI scheme to backend registry
//!
//! Every API request carries a file URI; the registry resolves its scheme
//! to the backend that owns it. The `file` scheme is wired to `LocalFs`
//! by default.

use std::sync::Arc;

use dashmap::DashMap;

use crate::error::{FuseFilesystemError, Result};
use crate::fsapi::local::LocalFs;
use crate::fsapi::FsApi;
use crate::uri::FileUri;

/// Registry mapping URI schemes to filesystem backends
pub struct FsApiRegistry {
    backends: DashMap<String, Arc<dyn FsApi>>,
}

impl FsApiRegistry {
    /// Create a registry with the `file` scheme pre-registered
    pub fn new() -> Self {
        let registry = Self::empty();
        registry.register("file", Arc::new(LocalFs::new()));
        registry
    }

    /// Create a registry with no registered schemes
    pub fn empty() -> Self {
        Self {
            backends: DashMap::new(),
        }
    }

    /// Register a backend for a URI scheme, replacing any existing one
    pub fn register(&self, scheme: &str, backend: Arc<dyn FsApi>) {
        self.backends
            .insert(scheme.to_ascii_lowercase(), backend);
    }

    /// Resolve the backend for a parsed URI
    pub fn resolve(&self, uri: &FileUri) -> Result<Arc<dyn FsApi>> {
        self.backends
            .get(uri.scheme())
            .map(|entry| entry.value().clone())
            .ok_or_else(|| FuseFilesystemError::UnsupportedScheme(uri.scheme().to_string()))
    }
}

impl Default for FsApiRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_scheme_registered_by_default() {
        let registry = FsApiRegistry::new();
        let uri = FileUri::parse("file:///tmp").unwrap();
        assert!(registry.resolve(&uri).is_ok());
    }

    #[test]
    fn test_unknown_scheme_is_rejected() {
        let registry = FsApiRegistry::new();
        let uri = FileUri::parse("asset:///logo.png").unwrap();
        let err = registry.resolve(&uri).unwrap_err();
        assert!(matches!(err, FuseFilesystemError::UnsupportedScheme(_)));
    }

    #[test]
    fn test_register_custom_scheme() {
        let registry = FsApiRegistry::new();
        registry.register("Asset", Arc::new(LocalFs::new()));
        let uri = FileUri::parse("asset:///logo.png").unwrap();
        assert!(registry.resolve(&uri).is_ok());
    }
}
