//! Gateway assembly and lifecycle
//!
//! [`GatewayBuilder`] accumulates and validates configuration; [`Gateway`]
//! owns the frozen configuration and manages the listener lifecycle.

mod builder;
mod server;

pub use builder::GatewayBuilder;
pub use server::{Gateway, GatewayStatus, ServerState};
