//! S3 Gateway: an S3-compatible front door for provider-agnostic object storage.
//!
//! This library is the bootstrap and lifecycle layer of a protocol-translating
//! proxy. It validates a configuration bundle, assembles a plain or TLS
//! listener, and binds a request handler that maps the S3 wire protocol onto
//! an opaque [`storage::ObjectStore`] capability. The wire protocol itself and
//! real storage backends live behind those seams.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use s3_gateway::gateway::GatewayBuilder;
//! use s3_gateway::storage::TransientStore;
//!
//! #[tokio::main]
//! async fn main() -> s3_gateway::Result<()> {
//!     let mut gateway = GatewayBuilder::new()
//!         .store(Arc::new(TransientStore::new()))
//!         .endpoint("http://127.0.0.1:0")?
//!         .build()?;
//!
//!     gateway.start().await?;
//!     println!("listening on port {}", gateway.local_port()?);
//!
//!     gateway.stop().await?;
//!     Ok(())
//! }
//! ```

// Public modules
pub mod common;
pub mod config;
pub mod gateway;
pub mod handler;
pub mod storage;
pub mod tls;

// Re-export commonly used structures and functions for convenience
pub use common::{GatewayError, Result};
pub use gateway::{Gateway, GatewayBuilder, ServerState};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
