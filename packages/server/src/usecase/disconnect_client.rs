//! UseCase: クライアント切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectClientUseCase::execute() メソッド
//! - 接続の登録解除、Presence の削除、ロスターの再ブロードキャスト
//!
//! ### なぜこのテストが必要か
//! - 切断後は lookup / ロスターからユーザーが消えることを保証する
//! - 同じ接続の二重切断が 1 回目と同じ結果になる（冪等）ことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：登録済みユーザーの切断
//! - エッジケース：未登録（Connected のまま）の接続の切断、二重切断

use std::sync::Arc;

use crate::domain::{ConnectionId, PresenceRepository, UserId};

/// 切断結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectOutcome {
    /// The connection was closed; `released` is the identity it carried, if any
    Closed { released: Option<UserId> },
    /// The connection was already closed; nothing happened
    AlreadyClosed,
}

/// クライアント切断のユースケース
pub struct DisconnectClientUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn PresenceRepository>,
}

impl DisconnectClientUseCase {
    /// 新しい DisconnectClientUseCase を作成
    pub fn new(repository: Arc<dyn PresenceRepository>) -> Self {
        Self { repository }
    }

    /// クライアント切断を実行
    ///
    /// # Arguments
    ///
    /// * `connection_id` - 切断する接続ハンドル
    ///
    /// # Returns
    ///
    /// 切断結果。2 回目以降の呼び出しは `AlreadyClosed` で、何も送信しない。
    pub async fn execute(&self, connection_id: ConnectionId) -> DisconnectOutcome {
        // 1. 接続と Presence を削除
        let removed = match self.repository.close_connection(&connection_id).await {
            Ok(removed) => removed,
            Err(_) => return DisconnectOutcome::AlreadyClosed,
        };

        // 2. 残りの接続にロスターをブロードキャスト
        let delivered = self.repository.broadcast_roster().await;
        tracing::debug!("Broadcasted roster to {} connection(s)", delivered);

        DisconnectOutcome::Closed {
            released: removed.map(|entry| entry.user_id),
        }
    }

    /// 残りの接続数を取得
    pub async fn count_remaining_connections(&self) -> usize {
        self.repository.count_connections().await
    }
}
