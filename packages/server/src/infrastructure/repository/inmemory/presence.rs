//! InMemory Presence Repository 実装
//!
//! ドメイン層が定義する PresenceRepository trait の具体的な実装。
//! 接続テーブル（HashMap）と PresenceRegistry をそれぞれ Mutex で保護します。
//!
//! ## ロック順序
//!
//! 両方のロックが必要な場合は必ず `registry` -> `connected_clients` の順に取得します。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc::UnboundedSender};

use crate::{
    domain::{
        AnnounceOutcome, ConnectionId, ConnectionState, PresenceEntry, PresenceRegistry,
        PresenceRepository, RepositoryError, Timestamp, UserId,
    },
    infrastructure::dto::websocket::ServerEvent,
};

/// Live connection information
pub struct ClientInfo {
    /// Outbound frame channel, drained by the connection's writer task
    pub sender: UnboundedSender<String>,
    /// Unix timestamp when connected (in JST, milliseconds)
    pub connected_at: Timestamp,
    /// Lifecycle state
    pub state: ConnectionState,
}

/// インメモリ Presence Repository 実装
///
/// ドメイン層の PresenceRepository trait を実装します（依存性の逆転）。
pub struct InMemoryPresenceRepository {
    /// 接続中のクライアント情報（WebSocket sender を含む）
    connected_clients: Arc<Mutex<HashMap<ConnectionId, ClientInfo>>>,
    /// PresenceRegistry ドメインモデル
    registry: Arc<Mutex<PresenceRegistry>>,
}

impl InMemoryPresenceRepository {
    /// 新しい InMemoryPresenceRepository を作成
    pub fn new(registry: PresenceRegistry) -> Self {
        Self {
            connected_clients: Arc::new(Mutex::new(HashMap::new())),
            registry: Arc::new(Mutex::new(registry)),
        }
    }

    /// 接続の状態（閉じた接続・未知の接続は None）
    pub async fn connection_state(
        &self,
        connection_id: &ConnectionId,
    ) -> Option<ConnectionState> {
        let clients = self.connected_clients.lock().await;
        clients.get(connection_id).map(|info| info.state.clone())
    }

    /// 登録中の全エントリ（登録順）
    pub async fn entries(&self) -> Vec<PresenceEntry> {
        let registry = self.registry.lock().await;
        registry.entries().to_vec()
    }
}

impl Default for InMemoryPresenceRepository {
    fn default() -> Self {
        Self::new(PresenceRegistry::new())
    }
}

#[async_trait]
impl PresenceRepository for InMemoryPresenceRepository {
    async fn register_connection(
        &self,
        connection_id: ConnectionId,
        sender: UnboundedSender<String>,
        connected_at: Timestamp,
    ) -> Result<(), RepositoryError> {
        let mut clients = self.connected_clients.lock().await;
        if clients.contains_key(&connection_id) {
            return Err(RepositoryError::DuplicateConnection(
                connection_id.to_string(),
            ));
        }
        clients.insert(
            connection_id,
            ClientInfo {
                sender,
                connected_at,
                state: ConnectionState::Connected,
            },
        );
        Ok(())
    }

    async fn announce(
        &self,
        connection_id: ConnectionId,
        user_id: UserId,
        announced_at: Timestamp,
    ) -> Result<AnnounceOutcome, RepositoryError> {
        let mut registry = self.registry.lock().await;
        let mut clients = self.connected_clients.lock().await;

        let Some(client_info) = clients.get(&connection_id) else {
            return Err(RepositoryError::ConnectionNotFound(
                connection_id.to_string(),
            ));
        };
        if let Some(bound) = client_info.state.user_id() {
            return Ok(AnnounceOutcome::ConnectionAlreadyBound {
                user_id: bound.clone(),
            });
        }

        let outcome = registry.add(user_id.clone(), connection_id, announced_at);

        if let AnnounceOutcome::Replaced { previous } = &outcome
            && let Some(displaced) = clients.get_mut(previous)
        {
            displaced.state.release();
        }
        if outcome.is_registered()
            && let Some(client_info) = clients.get_mut(&connection_id)
        {
            client_info.state.announce(user_id);
        }

        Ok(outcome)
    }

    async fn find_connection(&self, user_id: &UserId) -> Option<ConnectionId> {
        let registry = self.registry.lock().await;
        registry.lookup(user_id)
    }

    async fn close_connection(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<Option<PresenceEntry>, RepositoryError> {
        let mut registry = self.registry.lock().await;
        let mut clients = self.connected_clients.lock().await;

        if clients.remove(connection_id).is_none() {
            return Err(RepositoryError::ConnectionNotFound(
                connection_id.to_string(),
            ));
        }

        Ok(registry.remove(connection_id))
    }

    async fn roster(&self) -> Vec<UserId> {
        let registry = self.registry.lock().await;
        registry.snapshot()
    }

    async fn push(&self, connection_id: &ConnectionId, frame: String) -> bool {
        let clients = self.connected_clients.lock().await;
        match clients.get(connection_id) {
            Some(client_info) => client_info.sender.send(frame).is_ok(),
            None => false,
        }
    }

    async fn broadcast_roster(&self) -> usize {
        let registry = self.registry.lock().await;
        let Some(frame) = encode_roster(&registry) else {
            return 0;
        };

        let clients = self.connected_clients.lock().await;
        let mut delivered = 0;
        for (id, client_info) in clients.iter() {
            if client_info.sender.send(frame.clone()).is_ok() {
                delivered += 1;
            } else {
                tracing::warn!("Failed to send roster to connection '{}'", id);
            }
        }
        delivered
    }

    async fn count_connections(&self) -> usize {
        let clients = self.connected_clients.lock().await;
        clients.len()
    }
}

fn encode_roster(registry: &PresenceRegistry) -> Option<String> {
    match ServerEvent::roster(&registry.snapshot()).to_frame() {
        Ok(frame) => Some(frame),
        Err(e) => {
            tracing::error!("Failed to encode roster: {}", e);
            None
        }
    }
}
