//! UseCase: クライアント接続処理
//!
//! トランスポート接続時にハンドルを払い出し、接続テーブルに登録する。
//! この時点では Presence は登録しない（Connected 状態）。

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;

use crate::domain::{ConnectionId, ConnectionIdFactory, PresenceRepository, Timestamp};

use super::error::ConnectError;

/// クライアント接続のユースケース
pub struct ConnectClientUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn PresenceRepository>,
}

impl ConnectClientUseCase {
    /// 新しい ConnectClientUseCase を作成
    pub fn new(repository: Arc<dyn PresenceRepository>) -> Self {
        Self { repository }
    }

    /// クライアント接続を実行
    ///
    /// # Arguments
    ///
    /// * `sender` - この接続へのフレーム送信チャンネル
    ///
    /// # Returns
    ///
    /// * `Ok(ConnectionId)` - 払い出した接続ハンドル
    /// * `Err(ConnectError)` - 接続失敗
    pub async fn execute(
        &self,
        sender: UnboundedSender<String>,
    ) -> Result<ConnectionId, ConnectError> {
        let connection_id = ConnectionIdFactory::generate();
        self.repository
            .register_connection(connection_id, sender, Timestamp::now())
            .await
            .map_err(|_| ConnectError::DuplicateConnectionId(connection_id.to_string()))?;

        Ok(connection_id)
    }
}
