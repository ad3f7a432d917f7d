//! # NotificationCenter
//!
//! Creates notification records for lifecycle events and tracks their read
//! state. A recipient may only see, read or clear notifications addressed to
//! their own inbox or to their role's broadcast scope.
//!
//! Read and cleared state belongs to the recipient. A role broadcast is one
//! record, but each member of the role reads and clears it independently.
//!
//! The unread count is always derived from `list_for`; it is never stored.

use std::sync::Arc;

use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{AppError, Result};
use crate::models::{Actor, Notification, RecipientScope};
use crate::traits::NotificationStore;

#[derive(Clone)]
pub struct NotificationCenter {
    store: Arc<dyn NotificationStore>,
    clock: Arc<dyn Clock>,
}

impl NotificationCenter {
    pub fn new(store: Arc<dyn NotificationStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Records a new unread notification for `scope`.
    pub async fn emit(&self, scope: RecipientScope, message: impl Into<String>) -> Result<Notification> {
        let notification = Notification {
            id: Uuid::now_v7(),
            scope,
            message: message.into(),
            read: false,
            created_at: self.clock.now(),
        };
        self.store.insert_notification(&notification).await?;
        log::debug!("notification {} emitted to {}", notification.id, scope.key());
        Ok(notification)
    }

    /// Emits after a committed mutation. A failure here is logged and
    /// swallowed; the mutation that triggered it stands.
    pub async fn emit_best_effort(&self, scope: RecipientScope, message: impl Into<String>) -> Option<Notification> {
        match self.emit(scope, message).await {
            Ok(notification) => Some(notification),
            Err(e) => {
                log::warn!("failed to emit notification to {}: {e}", scope.key());
                None
            }
        }
    }

    /// Everything addressed to the recipient, most recent first. Pure read.
    pub async fn list_for(&self, recipient: &Actor) -> Result<Vec<Notification>> {
        let mut items = self.store.list_notifications(recipient.id, &recipient.scopes()).await?;
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(items)
    }

    pub async fn unread_count(&self, recipient: &Actor) -> Result<usize> {
        let items = self.list_for(recipient).await?;
        Ok(items.iter().filter(|n| !n.read).count())
    }

    /// Marks one notification read for `recipient` only. Already-read
    /// notifications are returned unchanged.
    pub async fn mark_read(&self, id: Uuid, recipient: &Actor) -> Result<Notification> {
        let mut notification = self
            .store
            .get_notification(id, recipient.id)
            .await?
            .ok_or_else(|| AppError::NotFound("Notification", id.to_string()))?;

        if !recipient.owns_scope(&notification.scope) {
            return Err(AppError::Forbidden(format!(
                "notification {id} is not addressed to this recipient"
            )));
        }
        if notification.read {
            return Ok(notification);
        }

        self.store.set_read(id, recipient.id).await?;
        notification.read = true;
        Ok(notification)
    }

    pub async fn mark_all_read(&self, recipient: &Actor) -> Result<u64> {
        let changed = self.store.mark_all_read(recipient.id, &recipient.scopes()).await?;
        log::debug!("{changed} notifications marked read for {}", recipient.id);
        Ok(changed)
    }

    /// Empties the recipient's inbox. Other members of the recipient's role
    /// keep their copy of any broadcast. No undo.
    pub async fn clear_all(&self, recipient: &Actor) -> Result<u64> {
        let removed = self.store.clear_all(recipient.id, &recipient.scopes()).await?;
        log::info!("{removed} notifications cleared for {}", recipient.id);
        Ok(removed)
    }
}
