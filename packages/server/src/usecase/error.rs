//! UseCase 層のエラー定義

use thiserror::Error;

/// 接続処理のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectError {
    /// 生成したハンドルが既に登録されていた
    #[error("Connection handle '{0}' is already registered")]
    DuplicateConnectionId(String),
}

/// Announce 処理のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnnounceError {
    /// 接続が既に閉じられている
    #[error("Connection '{0}' is closed")]
    ConnectionClosed(String),
}
