//! UseCase: ユーザー登録（addUser）処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - AnnounceUserUseCase::execute() メソッド
//! - Presence の登録とロスターのブロードキャスト
//!
//! ### なぜこのテストが必要か
//! - 同じユーザー ID の二重登録時の挙動（ポリシー）を保証する
//! - ロスターが全接続（未登録の接続を含む）に届くことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規ユーザーの登録
//! - エッジケース：同じユーザー ID での再登録（KeepFirst / Replace）
//! - 異常系：既に閉じた接続からの登録

use std::sync::Arc;

use crate::domain::{AnnounceOutcome, ConnectionId, PresenceRepository, Timestamp, UserId};

use super::error::AnnounceError;

/// ユーザー登録のユースケース
pub struct AnnounceUserUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn PresenceRepository>,
}

impl AnnounceUserUseCase {
    /// 新しい AnnounceUserUseCase を作成
    pub fn new(repository: Arc<dyn PresenceRepository>) -> Self {
        Self { repository }
    }

    /// ユーザー登録を実行
    ///
    /// 登録結果に関わらず、現在のロスターを全接続にブロードキャストする。
    ///
    /// # Arguments
    ///
    /// * `connection_id` - 登録元の接続ハンドル
    /// * `user_id` - 登録するユーザー ID（Domain Model）
    ///
    /// # Returns
    ///
    /// * `Ok(AnnounceOutcome)` - 登録結果（重複は Ok として返る）
    /// * `Err(AnnounceError)` - 接続が既に閉じている
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        user_id: UserId,
    ) -> Result<AnnounceOutcome, AnnounceError> {
        // 1. Presence に登録
        let outcome = self
            .repository
            .announce(connection_id, user_id, Timestamp::now())
            .await
            .map_err(|_| AnnounceError::ConnectionClosed(connection_id.to_string()))?;

        // 2. ロスターをブロードキャスト
        let delivered = self.repository.broadcast_roster().await;
        tracing::debug!("Broadcasted roster to {} connection(s)", delivered);

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{ConnectionState, DuplicateAnnouncePolicy, PresenceRegistry},
        infrastructure::repository::InMemoryPresenceRepository,
        usecase::ConnectClientUseCase,
    };
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn user(id: &str) -> UserId {
        UserId::new(id)
    }

    async fn connect(
        repository: &Arc<InMemoryPresenceRepository>,
    ) -> (ConnectionId, UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = ConnectClientUseCase::new(repository.clone())
            .execute(tx)
            .await
            .unwrap();
        (id, rx)
    }

    #[tokio::test]
    async fn test_announce_user_broadcasts_roster_to_all() {
        // テスト項目: 未登録の接続を含む全接続に getUsers が届く
        // given (前提条件):
        let repository = Arc::new(InMemoryPresenceRepository::default());
        let usecase = AnnounceUserUseCase::new(repository.clone());
        let (h1, mut rx1) = connect(&repository).await;
        let (_h2, mut rx2) = connect(&repository).await;

        // when (操作): h1 を alice として登録
        let result = usecase.execute(h1, user("alice")).await;

        // then (期待する結果):
        assert_eq!(result, Ok(AnnounceOutcome::Inserted));
        let expected = r#"{"event":"getUsers","data":["alice"]}"#;
        assert_eq!(rx1.try_recv().unwrap(), expected);
        assert_eq!(rx2.try_recv().unwrap(), expected);
        assert!(rx1.try_recv().is_err());
        assert!(rx2.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_announce_user_lookup_returns_handle() {
        // テスト項目: 登録直後に lookup すると登録した接続が返される
        // given (前提条件):
        let repository = Arc::new(InMemoryPresenceRepository::default());
        let usecase = AnnounceUserUseCase::new(repository.clone());
        let (h1, _rx1) = connect(&repository).await;

        // when (操作):
        usecase.execute(h1, user("alice")).await.unwrap();

        // then (期待する結果):
        assert_eq!(repository.find_connection(&user("alice")).await, Some(h1));
        assert_eq!(
            repository.connection_state(&h1).await,
            Some(ConnectionState::Announced(user("alice")))
        );
    }

    #[tokio::test]
    async fn test_announce_duplicate_user_keeps_first() {
        // テスト項目: 同じユーザー ID の再登録は無視され、最初の接続が残る
        // given (前提条件):
        let repository = Arc::new(InMemoryPresenceRepository::default());
        let usecase = AnnounceUserUseCase::new(repository.clone());
        let (h1, _rx1) = connect(&repository).await;
        let (h2, mut rx2) = connect(&repository).await;
        usecase.execute(h1, user("alice")).await.unwrap();
        while rx2.try_recv().is_ok() {}

        // when (操作): h2 も alice として登録
        let result = usecase.execute(h2, user("alice")).await;

        // then (期待する結果): エラーにはならず、ロスターは再送される
        assert_eq!(result, Ok(AnnounceOutcome::IdentityTaken { existing: h1 }));
        assert_eq!(repository.roster().await, vec![user("alice")]);
        assert_eq!(repository.find_connection(&user("alice")).await, Some(h1));
        assert_eq!(
            rx2.try_recv().unwrap(),
            r#"{"event":"getUsers","data":["alice"]}"#
        );
        assert_eq!(
            repository.connection_state(&h2).await,
            Some(ConnectionState::Connected)
        );
    }

    #[tokio::test]
    async fn test_announce_duplicate_user_replace_policy() {
        // テスト項目: Replace ポリシーでは新しい接続に付け替えられる
        // given (前提条件):
        let repository = Arc::new(InMemoryPresenceRepository::new(
            PresenceRegistry::with_policy(DuplicateAnnouncePolicy::Replace),
        ));
        let usecase = AnnounceUserUseCase::new(repository.clone());
        let (h1, _rx1) = connect(&repository).await;
        let (h2, _rx2) = connect(&repository).await;
        usecase.execute(h1, user("alice")).await.unwrap();

        // when (操作):
        let result = usecase.execute(h2, user("alice")).await;

        // then (期待する結果):
        assert_eq!(result, Ok(AnnounceOutcome::Replaced { previous: h1 }));
        assert_eq!(repository.find_connection(&user("alice")).await, Some(h2));
        assert_eq!(repository.roster().await, vec![user("alice")]);
    }

    #[tokio::test]
    async fn test_announce_from_closed_connection_fails() {
        // テスト項目: 閉じた接続からの登録はエラーになり、ブロードキャストもされない
        // given (前提条件):
        let repository = Arc::new(InMemoryPresenceRepository::default());
        let usecase = AnnounceUserUseCase::new(repository.clone());
        let (h1, _rx1) = connect(&repository).await;
        let (_h2, mut rx2) = connect(&repository).await;
        repository.close_connection(&h1).await.unwrap();

        // when (操作):
        let result = usecase.execute(h1, user("alice")).await;

        // then (期待する結果):
        assert_eq!(result, Err(AnnounceError::ConnectionClosed(h1.to_string())));
        assert!(repository.roster().await.is_empty());
        assert!(rx2.try_recv().is_err());
    }
}
