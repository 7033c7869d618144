//! fuse-filesystem: filesystem plugin for the fuse API bridge
//!
//! This library implements the filesystem surface of a fuse application:
//! a loopback HTTP API bridge hosts plugins, and the filesystem plugin
//! serves `/file/*` endpoints (read, write, append, truncate, mkdir,
//! remove, exists, size, type) against pluggable, URI-scheme-keyed
//! filesystem backends.
//!
//! # Architecture
//!
//! - **FsApi backends**: filesystem implementations (local disk by default)
//!   selected by URI scheme through the `FsApiRegistry`.
//! - **Plugin layer**: decodes endpoint parameters (plain URIs, JSON
//!   objects, or length-prefixed framed bodies) and encodes the wire
//!   responses clients expect.
//! - **API bridge**: a secret-protected loopback HTTP/1 server routing
//!   `POST /api/{plugin}/{endpoint}` to registered plugins, streaming
//!   read bodies chunk by chunk.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use fuse_filesystem::plugin::FilesystemPlugin;
//! use fuse_filesystem::server::{ApiBridge, ApiServer};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let bridge = Arc::new(ApiBridge::new());
//! bridge.register_plugin(Arc::new(FilesystemPlugin::with_defaults()));
//!
//! let server = ApiServer::bind("127.0.0.1", 0, bridge.clone()).await?;
//! println!("listening on {} secret {}", server.local_addr(), bridge.secret());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod env;
pub mod error;
pub mod fsapi;
pub mod params;
pub mod plugin;
pub mod server;
pub mod uri;

pub use error::{FuseFilesystemError, Result};
