//! Domain layer for the presence and relay service.
//!
//! This module contains the presence model and relay rules, independent of
//! the wire format (DTOs) and of the transport.

pub mod entity;
pub mod error;
pub mod factory;
pub mod repository;
pub mod value_object;

pub use entity::{
    AnnounceOutcome, ConnectionState, DuplicateAnnouncePolicy, PresenceEntry, PresenceRegistry,
    RelayMessage,
};
pub use error::RepositoryError;
pub use factory::ConnectionIdFactory;
pub use repository::PresenceRepository;
pub use value_object::{ConnectionId, MessageText, Timestamp, UserId};

#[cfg(test)]
pub use repository::MockPresenceRepository;
