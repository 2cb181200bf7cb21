//! Presence and message relay server.
//!
//! Tracks online users and relays chat messages to the recipient's connection.
//!
//! Run with:
//! ```not_rust
//! PORT=8900 ALLOWED_ORIGINS=http://localhost:5173 cargo run --bin messenger-server
//! ```

use clap::Parser;
use messenger_server::{ServerArgs, ServerConfig};
use messenger_shared::logger::setup_logger;

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let config = match ServerConfig::try_from(ServerArgs::parse()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Run the server
    if let Err(e) = messenger_server::run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
