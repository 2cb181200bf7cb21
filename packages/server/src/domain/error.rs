//! Domain layer error definitions.

use thiserror::Error;

/// Errors raised by a presence repository
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// A live connection with the same id is already registered
    #[error("Connection '{0}' is already registered")]
    DuplicateConnection(String),

    /// The connection is not (or no longer) registered
    #[error("Connection '{0}' not found")]
    ConnectionNotFound(String),
}
