//! Connection lifecycle facade.
//!
//! `ConnectionManager` bundles the four use cases behind the callbacks the
//! transport layer drives: connect, announce, send, disconnect.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;

use crate::domain::{AnnounceOutcome, ConnectionId, PresenceRepository, RelayMessage, UserId};

use super::{
    AnnounceUserUseCase, ConnectClientUseCase, Delivery, DisconnectClientUseCase,
    DisconnectOutcome, SendMessageUseCase,
    error::{AnnounceError, ConnectError},
};

#[derive(Clone)]
pub struct ConnectionManager {
    repository: Arc<dyn PresenceRepository>,
}

impl ConnectionManager {
    pub fn new(repository: Arc<dyn PresenceRepository>) -> Self {
        Self { repository }
    }

    /// Register a new connection in the `Connected` state.
    ///
    /// Nothing is pushed and the registry is untouched until the connection
    /// announces.
    pub async fn on_connect(
        &self,
        sender: UnboundedSender<String>,
    ) -> Result<ConnectionId, ConnectError> {
        let connection_id = ConnectClientUseCase::new(self.repository.clone())
            .execute(sender)
            .await?;
        tracing::info!(
            "Connection '{}' opened ({} open)",
            connection_id,
            self.connection_count().await
        );

        Ok(connection_id)
    }

    /// Handle `addUser`.
    pub async fn on_announce(
        &self,
        connection_id: ConnectionId,
        user_id: UserId,
    ) -> Result<AnnounceOutcome, AnnounceError> {
        let outcome = AnnounceUserUseCase::new(self.repository.clone())
            .execute(connection_id, user_id.clone())
            .await?;

        match &outcome {
            AnnounceOutcome::Inserted => {
                tracing::info!("User '{}' is online on '{}'", user_id, connection_id);
            }
            AnnounceOutcome::Replaced { previous } => {
                tracing::info!(
                    "User '{}' moved from '{}' to '{}'",
                    user_id,
                    previous,
                    connection_id
                );
            }
            AnnounceOutcome::IdentityTaken { existing } => {
                tracing::debug!(
                    "User '{}' already bound to '{}', ignoring announce from '{}'",
                    user_id,
                    existing,
                    connection_id
                );
            }
            AnnounceOutcome::ConnectionAlreadyBound { user_id: bound } => {
                tracing::debug!(
                    "Connection '{}' already announced as '{}', ignoring '{}'",
                    connection_id,
                    bound,
                    user_id
                );
            }
        }

        Ok(outcome)
    }

    /// Handle `sendMessage`. Never fails: misses are dropped.
    pub async fn on_send_message(&self, message: RelayMessage) -> Delivery {
        SendMessageUseCase::new(self.repository.clone())
            .execute(message)
            .await
    }

    /// Close a connection. Safe to call more than once.
    pub async fn on_disconnect(&self, connection_id: ConnectionId) -> DisconnectOutcome {
        let outcome = DisconnectClientUseCase::new(self.repository.clone())
            .execute(connection_id)
            .await;

        if let DisconnectOutcome::Closed { released } = &outcome {
            match released {
                Some(user_id) => tracing::info!(
                    "Connection '{}' closed, user '{}' is offline",
                    connection_id,
                    user_id
                ),
                None => tracing::info!("Connection '{}' closed", connection_id),
            }
        }

        outcome
    }

    /// Identities currently present.
    pub async fn roster(&self) -> Vec<UserId> {
        self.repository.roster().await
    }

    /// Number of live connections, announced or not.
    pub async fn connection_count(&self) -> usize {
        self.repository.count_connections().await
    }

    /// Connection bound to `user_id`, if present.
    pub async fn lookup(&self, user_id: &UserId) -> Option<ConnectionId> {
        self.repository.find_connection(user_id).await
    }
}
