//! Data transfer objects.

pub mod websocket;
