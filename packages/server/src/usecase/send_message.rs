//! UseCase: メッセージ中継処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - 受信者の接続を Presence から引き、その接続だけに getMessage を送る
//!
//! ### なぜこのテストが必要か
//! - 受信者以外（送信者を含む）に届かないことを保証する
//! - 受信者が不在の場合はエラーにせず破棄することを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：接続中の受信者への中継
//! - エッジケース：受信者が未接続、受信者の接続が直前に閉じた

use std::sync::Arc;

use messenger_shared::time::timestamp_to_jst_rfc3339;

use crate::{
    domain::{ConnectionId, PresenceRepository, RelayMessage},
    infrastructure::dto::websocket::ServerEvent,
};

/// Why a relay did not reach anyone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// No presence entry for the recipient
    RecipientAbsent,
    /// The recipient's connection went away before the push
    PushFailed,
}

/// 中継結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Pushed to the recipient's connection
    Delivered(ConnectionId),
    /// Silently dropped
    Dropped(DropReason),
}

/// メッセージ中継のユースケース
pub struct SendMessageUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn PresenceRepository>,
}

impl SendMessageUseCase {
    /// 新しい SendMessageUseCase を作成
    pub fn new(repository: Arc<dyn PresenceRepository>) -> Self {
        Self { repository }
    }

    /// メッセージ中継を実行
    ///
    /// 配送は best-effort で、失敗しても再送もエラー返却もしない。
    ///
    /// # Arguments
    ///
    /// * `message` - 中継するメッセージ（Domain Model）
    ///
    /// # Returns
    ///
    /// 中継結果（`Delivery`）
    pub async fn execute(&self, message: RelayMessage) -> Delivery {
        // 1. 受信者の接続を取得
        let Some(connection_id) = self.repository.find_connection(&message.recipient).await
        else {
            tracing::info!(
                "User '{}' is not connected, dropping message from '{}'",
                message.recipient,
                message.sender
            );
            return Delivery::Dropped(DropReason::RecipientAbsent);
        };

        // 2. getMessage を受信者の接続だけに送信
        let frame = match ServerEvent::relayed(&message).to_frame() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!("Failed to encode message for '{}': {}", message.recipient, e);
                return Delivery::Dropped(DropReason::PushFailed);
            }
        };

        if self.repository.push(&connection_id, frame).await {
            tracing::debug!(
                "Relayed message from '{}' to '{}' (received at {})",
                message.sender,
                message.recipient,
                timestamp_to_jst_rfc3339(message.received_at.value()).unwrap_or_default()
            );
            Delivery::Delivered(connection_id)
        } else {
            tracing::warn!(
                "Failed to push message to '{}' on connection '{}'",
                message.recipient,
                connection_id
            );
            Delivery::Dropped(DropReason::PushFailed)
        }
    }
}
