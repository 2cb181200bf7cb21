//! Core domain models for presence tracking and relaying.

use super::value_object::{ConnectionId, MessageText, Timestamp, UserId};

/// What to do when an identity is announced while it is already present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicateAnnouncePolicy {
    /// First writer wins: the existing binding is kept, the new announce is ignored.
    #[default]
    KeepFirst,
    /// Last writer wins: the identity is rebound to the announcing connection.
    Replace,
}

/// Result of `PresenceRegistry::add`.
///
/// None of these are errors: every duplicate case is a defined no-op or rebind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnounceOutcome {
    /// A new entry was inserted
    Inserted,
    /// The identity is already bound to another connection and was left untouched
    IdentityTaken { existing: ConnectionId },
    /// The identity was rebound; `previous` is no longer registered
    Replaced { previous: ConnectionId },
    /// The announcing connection already carries an identity
    ConnectionAlreadyBound { user_id: UserId },
}

impl AnnounceOutcome {
    /// Whether the registry changed.
    pub fn is_registered(&self) -> bool {
        matches!(self, Self::Inserted | Self::Replaced { .. })
    }
}

/// One (identity, connection) association
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceEntry {
    /// Announced user identity
    pub user_id: UserId,
    /// Connection the identity is reachable on
    pub connection_id: ConnectionId,
    /// When the announce was processed
    pub announced_at: Timestamp,
}

impl PresenceEntry {
    /// Create a new presence entry
    pub fn new(user_id: UserId, connection_id: ConnectionId, announced_at: Timestamp) -> Self {
        Self {
            user_id,
            connection_id,
            announced_at,
        }
    }
}

/// Live set of (identity -> connection) pairs.
///
/// Pure state container: no I/O, no locking. Callers serialize access.
/// Entries are kept in announce order, which is also the roster order.
///
/// Invariants:
/// - at most one entry per `UserId`
/// - at most one entry per `ConnectionId`
#[derive(Debug, Clone, Default)]
pub struct PresenceRegistry {
    entries: Vec<PresenceEntry>,
    policy: DuplicateAnnouncePolicy,
}

impl PresenceRegistry {
    /// Create an empty registry with the first-writer-wins policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry with the given duplicate-announce policy
    pub fn with_policy(policy: DuplicateAnnouncePolicy) -> Self {
        Self {
            entries: Vec::new(),
            policy,
        }
    }

    /// Duplicate-announce policy in effect
    pub fn policy(&self) -> DuplicateAnnouncePolicy {
        self.policy
    }

    /// Associate `user_id` with `connection_id`.
    ///
    /// A connection that is already bound is never bound a second time. An
    /// identity that is already present is handled according to the policy.
    pub fn add(
        &mut self,
        user_id: UserId,
        connection_id: ConnectionId,
        announced_at: Timestamp,
    ) -> AnnounceOutcome {
        if let Some(bound) = self
            .entries
            .iter()
            .find(|e| e.connection_id == connection_id)
        {
            return AnnounceOutcome::ConnectionAlreadyBound {
                user_id: bound.user_id.clone(),
            };
        }

        match self.entries.iter_mut().find(|e| e.user_id == user_id) {
            Some(entry) => match self.policy {
                DuplicateAnnouncePolicy::KeepFirst => AnnounceOutcome::IdentityTaken {
                    existing: entry.connection_id,
                },
                DuplicateAnnouncePolicy::Replace => {
                    // Rebind in place so the roster order stays stable
                    let previous = entry.connection_id;
                    entry.connection_id = connection_id;
                    entry.announced_at = announced_at;
                    AnnounceOutcome::Replaced { previous }
                }
            },
            None => {
                self.entries
                    .push(PresenceEntry::new(user_id, connection_id, announced_at));
                AnnounceOutcome::Inserted
            }
        }
    }

    /// Connection currently bound to `user_id`, if any
    pub fn lookup(&self, user_id: &UserId) -> Option<ConnectionId> {
        self.entries
            .iter()
            .find(|e| &e.user_id == user_id)
            .map(|e| e.connection_id)
    }

    /// Remove the entry owned by `connection_id`; no-op if there is none
    pub fn remove(&mut self, connection_id: &ConnectionId) -> Option<PresenceEntry> {
        let index = self
            .entries
            .iter()
            .position(|e| &e.connection_id == connection_id)?;
        Some(self.entries.remove(index))
    }

    /// Identities currently present, in announce order
    pub fn snapshot(&self) -> Vec<UserId> {
        self.entries.iter().map(|e| e.user_id.clone()).collect()
    }

    /// All entries, in announce order
    pub fn entries(&self) -> &[PresenceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lifecycle of one live connection handle.
///
/// `Connected -> Announced`. A closed handle is no longer tracked at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// Transport is up, no identity announced yet
    Connected,
    /// The connection is registered under this identity
    Announced(UserId),
}

impl ConnectionState {
    /// Move to `Announced`. Only a `Connected` handle can announce.
    ///
    /// Returns whether the state changed.
    pub fn announce(&mut self, user_id: UserId) -> bool {
        match self {
            Self::Connected => {
                *self = Self::Announced(user_id);
                true
            }
            Self::Announced(_) => false,
        }
    }

    /// Drop back to `Connected` after the identity was rebound elsewhere
    pub fn release(&mut self) {
        *self = Self::Connected;
    }

    /// Identity carried by an announced connection
    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            Self::Announced(user_id) => Some(user_id),
            Self::Connected => None,
        }
    }
}

/// A chat event in flight. Never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayMessage {
    /// Sender identity, as claimed by the sending client
    pub sender: UserId,
    /// Recipient identity
    pub recipient: UserId,
    /// Text payload
    pub text: MessageText,
    /// Receive time on this server (not transmitted)
    pub received_at: Timestamp,
}

impl RelayMessage {
    /// Create a new relay message
    pub fn new(
        sender: UserId,
        recipient: UserId,
        text: MessageText,
        received_at: Timestamp,
    ) -> Self {
        Self {
            sender,
            recipient,
            text,
            received_at,
        }
    }
}
