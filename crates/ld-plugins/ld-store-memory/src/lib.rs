//! # ld-store-memory
//!
//! In-process implementation of `TicketStore` and `NotificationStore`.
//! Nothing survives a restart; suited to development and tests.

use std::collections::HashSet;

use async_trait::async_trait;
use dashmap::DashMap;
use ld_core::models::{Notification, RecipientScope, Ticket};
use ld_core::traits::{NotificationStore, TicketStore};
use uuid::Uuid;

/// One recipient's state for one notification.
#[derive(Debug, Default, Clone, Copy)]
struct Receipt {
    read: bool,
    dismissed: bool,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tickets: DashMap<Uuid, Ticket>,
    notifications: DashMap<Uuid, Notification>,
    /// Keyed by (notification id, recipient id).
    receipts: DashMap<(Uuid, Uuid), Receipt>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn view(&self, notification: &Notification, recipient: Uuid) -> Option<Notification> {
        let receipt = self
            .receipts
            .get(&(notification.id, recipient))
            .map(|r| *r)
            .unwrap_or_default();
        if receipt.dismissed {
            return None;
        }
        Some(Notification { read: receipt.read, ..notification.clone() })
    }

    fn visible(&self, recipient: Uuid, scopes: &[RecipientScope]) -> Vec<Notification> {
        let mut items: Vec<Notification> = self
            .notifications
            .iter()
            .filter(|n| scopes.contains(&n.scope))
            .filter_map(|n| self.view(n.value(), recipient))
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        items
    }
}

fn newest_first(mut tickets: Vec<Ticket>) -> Vec<Ticket> {
    tickets.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
    tickets
}

#[async_trait]
impl TicketStore for MemoryStore {
    async fn insert_ticket(&self, ticket: &Ticket) -> anyhow::Result<()> {
        if self.tickets.contains_key(&ticket.id) {
            anyhow::bail!("ticket {} already exists", ticket.id);
        }
        self.tickets.insert(ticket.id, ticket.clone());
        Ok(())
    }

    async fn get_ticket(&self, id: Uuid) -> anyhow::Result<Option<Ticket>> {
        Ok(self.tickets.get(&id).map(|t| t.value().clone()))
    }

    async fn update_ticket(&self, ticket: &Ticket) -> anyhow::Result<()> {
        match self.tickets.get_mut(&ticket.id) {
            Some(mut slot) => {
                *slot = ticket.clone();
                Ok(())
            }
            None => anyhow::bail!("ticket {} does not exist", ticket.id),
        }
    }

    async fn list_tickets(&self) -> anyhow::Result<Vec<Ticket>> {
        Ok(newest_first(self.tickets.iter().map(|t| t.value().clone()).collect()))
    }

    async fn list_tickets_by_reporter(&self, reporter_id: Uuid) -> anyhow::Result<Vec<Ticket>> {
        Ok(newest_first(
            self.tickets
                .iter()
                .filter(|t| t.reporter_id == reporter_id)
                .map(|t| t.value().clone())
                .collect(),
        ))
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn insert_notification(&self, notification: &Notification) -> anyhow::Result<()> {
        self.notifications.insert(notification.id, notification.clone());
        Ok(())
    }

    async fn get_notification(&self, id: Uuid, recipient: Uuid) -> anyhow::Result<Option<Notification>> {
        let Some(stored) = self.notifications.get(&id).map(|n| n.value().clone()) else {
            return Ok(None);
        };
        Ok(self.view(&stored, recipient))
    }

    async fn list_notifications(
        &self,
        recipient: Uuid,
        scopes: &[RecipientScope],
    ) -> anyhow::Result<Vec<Notification>> {
        Ok(self.visible(recipient, scopes))
    }

    async fn set_read(&self, id: Uuid, recipient: Uuid) -> anyhow::Result<()> {
        if !self.notifications.contains_key(&id) {
            anyhow::bail!("notification {id} does not exist");
        }
        self.receipts.entry((id, recipient)).or_default().read = true;
        Ok(())
    }

    async fn mark_all_read(&self, recipient: Uuid, scopes: &[RecipientScope]) -> anyhow::Result<u64> {
        let mut changed = 0;
        for n in self.visible(recipient, scopes).into_iter().filter(|n| !n.read) {
            self.receipts.entry((n.id, recipient)).or_default().read = true;
            changed += 1;
        }
        Ok(changed)
    }

    async fn clear_all(&self, recipient: Uuid, scopes: &[RecipientScope]) -> anyhow::Result<u64> {
        let mut removed = 0;
        let mut deleted = HashSet::new();
        for n in self.visible(recipient, scopes) {
            match n.scope {
                RecipientScope::User(_) => {
                    self.notifications.remove(&n.id);
                    deleted.insert(n.id);
                }
                RecipientScope::Role(_) => {
                    self.receipts.entry((n.id, recipient)).or_default().dismissed = true;
                }
            }
            removed += 1;
        }
        self.receipts.retain(|(id, _), _| !deleted.contains(id));
        Ok(removed)
    }
}
