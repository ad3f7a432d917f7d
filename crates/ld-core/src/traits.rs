//! # Core Traits (Ports)
//!
//! Any storage plugin must implement these traits to be used by the binary.
//! The engine never assumes a particular storage technology.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Notification, RecipientScope, Ticket};

/// Durable keyed storage for tickets.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn insert_ticket(&self, ticket: &Ticket) -> anyhow::Result<()>;
    async fn get_ticket(&self, id: Uuid) -> anyhow::Result<Option<Ticket>>;
    /// Overwrites the stored record with the same id.
    async fn update_ticket(&self, ticket: &Ticket) -> anyhow::Result<()>;
    /// All tickets, most recently created first.
    async fn list_tickets(&self) -> anyhow::Result<Vec<Ticket>>;
    /// Tickets owned by one reporter, most recently created first.
    async fn list_tickets_by_reporter(&self, reporter_id: Uuid) -> anyhow::Result<Vec<Ticket>>;
}

/// Storage for notification records and each recipient's view of them.
///
/// A role broadcast is stored once, but read and cleared state is kept per
/// recipient: one resolver clearing their inbox never changes what another
/// resolver sees. `recipient` is always the id of the user whose view is
/// being read or changed.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Stores a freshly emitted, unread notification.
    async fn insert_notification(&self, notification: &Notification) -> anyhow::Result<()>;
    /// The notification as `recipient` sees it, or `None` if it does not
    /// exist or `recipient` has cleared it.
    async fn get_notification(&self, id: Uuid, recipient: Uuid) -> anyhow::Result<Option<Notification>>;
    /// Notifications addressed to any of `scopes` and not cleared by
    /// `recipient`, most recent first.
    async fn list_notifications(&self, recipient: Uuid, scopes: &[RecipientScope])
        -> anyhow::Result<Vec<Notification>>;
    async fn set_read(&self, id: Uuid, recipient: Uuid) -> anyhow::Result<()>;
    /// Flags every notification in `scopes` that is unread for `recipient`;
    /// returns how many changed.
    async fn mark_all_read(&self, recipient: Uuid, scopes: &[RecipientScope]) -> anyhow::Result<u64>;
    /// Removes every notification in `scopes` from `recipient`'s view and
    /// returns how many disappeared. Direct messages are deleted outright;
    /// role broadcasts are only dismissed for `recipient`.
    async fn clear_all(&self, recipient: Uuid, scopes: &[RecipientScope]) -> anyhow::Result<u64>;
}
