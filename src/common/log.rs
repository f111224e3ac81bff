//! Logging helpers
//!
//! This module provides logging system related utility functions.

/// Initialize the logging system
///
/// The `RUST_LOG` environment variable overrides `level` when set.
pub fn init_logger(level: &str) {
    let env = env_logger::Env::default().filter_or("RUST_LOG", level);

    env_logger::Builder::from_env(env).try_init().ok();
}
