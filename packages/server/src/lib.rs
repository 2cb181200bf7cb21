//! Real-time presence and message relay server.
//!
//! Tracks which users are online (user identity -> live WebSocket connection)
//! and relays chat messages to the recipient's connection, if present.

pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// Re-export entry points
pub use error::ServerError;
pub use ui::{ServerArgs, ServerConfig, run};
