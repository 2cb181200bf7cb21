//! WebSocket relay server implementation.

pub mod config;
mod handler;
mod runner;
mod signal;
pub mod state;

pub use config::{OriginPolicy, ServerArgs, ServerConfig};
pub use runner::{WEBSOCKET_PATH, create_router, run, serve};
