//! Server startup and runtime errors.

use std::net::SocketAddr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    /// The listening address could not be bound (e.g. port already in use)
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The server loop stopped with an I/O error
    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),

    /// An allowed origin is not a valid header value
    #[error("Invalid allowed origin '{0}'")]
    InvalidOrigin(String),
}
