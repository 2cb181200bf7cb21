//! Handler modules for WebSocket endpoints.

pub mod websocket;

// Re-export WebSocket handlers
pub use websocket::websocket_handler;
