//! Shared utilities for the messenger presence and relay service.

pub mod logger;
pub mod time;
