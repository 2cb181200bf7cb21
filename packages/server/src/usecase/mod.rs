//! UseCase 層
//!
//! ビジネスロジックを実装するレイヤー。
//! UI 層から呼び出され、Domain 層を操作します。

pub mod announce_user;
pub mod connect_client;
pub mod connection_manager;
pub mod disconnect_client;
pub mod error;
pub mod send_message;

pub use announce_user::AnnounceUserUseCase;
pub use connect_client::ConnectClientUseCase;
pub use connection_manager::ConnectionManager;
pub use disconnect_client::{DisconnectClientUseCase, DisconnectOutcome};
pub use error::{AnnounceError, ConnectError};
pub use send_message::{Delivery, DropReason, SendMessageUseCase};
