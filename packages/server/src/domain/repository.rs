//! Repository trait for presence and live-connection state.
//!
//! The domain defines the contract; `infrastructure::repository` provides the
//! in-memory implementation. Implementations must serialize every access to the
//! presence registry.

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

use super::{
    entity::{AnnounceOutcome, PresenceEntry},
    error::RepositoryError,
    value_object::{ConnectionId, Timestamp, UserId},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PresenceRepository: Send + Sync {
    /// Register a live connection and the channel used to push frames to it.
    async fn register_connection(
        &self,
        connection_id: ConnectionId,
        sender: UnboundedSender<String>,
        connected_at: Timestamp,
    ) -> Result<(), RepositoryError>;

    /// Bind `user_id` to a registered connection.
    ///
    /// Fails with `ConnectionNotFound` if the connection is not registered.
    async fn announce(
        &self,
        connection_id: ConnectionId,
        user_id: UserId,
        announced_at: Timestamp,
    ) -> Result<AnnounceOutcome, RepositoryError>;

    /// Connection bound to `user_id`, if present.
    async fn find_connection(&self, user_id: &UserId) -> Option<ConnectionId>;

    /// Unregister a connection and drop its presence entry.
    ///
    /// Returns the removed entry (if the connection was announced), or
    /// `ConnectionNotFound` if the connection was already closed.
    async fn close_connection(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<Option<PresenceEntry>, RepositoryError>;

    /// Identities currently present, in announce order.
    async fn roster(&self) -> Vec<UserId>;

    /// Push one frame to one connection. Returns `false` if it is gone.
    async fn push(&self, connection_id: &ConnectionId, frame: String) -> bool;

    /// Push the current roster to every registered connection.
    ///
    /// The roster is read under the same lock that serializes registry
    /// mutations. Returns the number of connections reached.
    async fn broadcast_roster(&self) -> usize;

    /// Number of live connections.
    async fn count_connections(&self) -> usize;
}
