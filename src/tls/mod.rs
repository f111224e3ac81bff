//! TLS handling module
//!
//! This module turns the configured certificate store into an acceptor the
//! listener uses to terminate TLS.

mod acceptor;

pub use acceptor::create_tls_acceptor;
