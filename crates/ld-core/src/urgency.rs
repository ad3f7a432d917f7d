//! # UrgencyMonitor
//!
//! An unresolved, not-yet-urgent ticket becomes eligible for escalation once
//! it is older than the configured threshold. `sweep` only reports eligible
//! tickets; the flag is set through `mark_urgent`, exactly once.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{AppError, Result};
use crate::locks::TicketLocks;
use crate::models::{Actor, RecipientScope, Role, Ticket, TicketStatus};
use crate::notifications::NotificationCenter;
use crate::traits::TicketStore;

/// Escalation rule, shared by `sweep` and `mark_urgent`.
pub fn is_eligible(ticket: &Ticket, now: DateTime<Utc>, threshold: TimeDelta) -> bool {
    ticket.status != TicketStatus::Resolved && !ticket.is_urgent && now - ticket.created_at >= threshold
}

#[derive(Clone)]
pub struct UrgencyMonitor {
    store: Arc<dyn TicketStore>,
    locks: TicketLocks,
    notifications: NotificationCenter,
    clock: Arc<dyn Clock>,
    threshold: TimeDelta,
}

impl UrgencyMonitor {
    pub fn new(
        store: Arc<dyn TicketStore>,
        locks: TicketLocks,
        notifications: NotificationCenter,
        clock: Arc<dyn Clock>,
        threshold: TimeDelta,
    ) -> Self {
        Self { store, locks, notifications, clock, threshold }
    }

    pub fn threshold(&self) -> TimeDelta {
        self.threshold
    }

    /// Ids of tickets currently eligible for escalation, oldest first.
    /// Read-only.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<Vec<Uuid>> {
        let mut eligible: Vec<Ticket> = self
            .store
            .list_tickets()
            .await?
            .into_iter()
            .filter(|t| is_eligible(t, now, self.threshold))
            .collect();
        eligible.sort_by_key(|t| t.created_at);
        log::debug!("urgency sweep found {} eligible tickets", eligible.len());
        Ok(eligible.into_iter().map(|t| t.id).collect())
    }

    /// Flags a ticket urgent and broadcasts it to every resolver.
    pub async fn mark_urgent(&self, ticket_id: Uuid, actor: &Actor) -> Result<Ticket> {
        if actor.role != Role::Resolver {
            return Err(AppError::Forbidden("only resolvers can escalate tickets".into()));
        }

        let ticket = {
            let _guard = self.locks.acquire(ticket_id).await;

            let mut ticket = self
                .store
                .get_ticket(ticket_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Ticket", ticket_id.to_string()))?;

            let now = self.clock.now();
            if ticket.is_urgent {
                return Err(AppError::NotEligible(format!("ticket {ticket_id} is already urgent")));
            }
            if ticket.status == TicketStatus::Resolved {
                return Err(AppError::NotEligible(format!("ticket {ticket_id} is already resolved")));
            }
            if !is_eligible(&ticket, now, self.threshold) {
                return Err(AppError::NotEligible(format!(
                    "ticket {ticket_id} is younger than {}s",
                    self.threshold.num_seconds()
                )));
            }

            ticket.is_urgent = true;
            ticket.escalated_by = Some(actor.id);
            ticket.escalated_at = Some(now);
            self.store.update_ticket(&ticket).await?;
            ticket
        };
        log::info!("ticket {} escalated by {}", ticket.id, actor.id);

        self.notifications
            .emit_best_effort(
                RecipientScope::Role(Role::Resolver),
                format!(
                    "Ticket {} ({} issue at {}) has been marked urgent",
                    ticket.id,
                    ticket.issue_category,
                    ticket.location()
                ),
            )
            .await;

        Ok(ticket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IssueCategory;

    fn ticket_at(created_at: DateTime<Utc>) -> Ticket {
        Ticket {
            id: Uuid::now_v7(),
            reporter_id: Uuid::now_v7(),
            pc_label: None,
            source_address: "10.1.2.3".into(),
            issue_category: IssueCategory::Network,
            description: "No link light".into(),
            status: TicketStatus::Open,
            is_urgent: false,
            escalated_by: None,
            escalated_at: None,
            created_at,
            resolved_at: None,
            rating: None,
            feedback_text: None,
        }
    }

    #[test]
    fn test_eligibility_boundary() {
        let created = Utc::now();
        let ticket = ticket_at(created);
        let threshold = TimeDelta::seconds(120);

        assert!(!is_eligible(&ticket, created + TimeDelta::seconds(119), threshold));
        assert!(is_eligible(&ticket, created + TimeDelta::seconds(120), threshold));
    }

    #[test]
    fn test_urgent_or_resolved_never_eligible() {
        let created = Utc::now();
        let later = created + TimeDelta::minutes(10);
        let threshold = TimeDelta::seconds(120);

        let mut urgent = ticket_at(created);
        urgent.is_urgent = true;
        assert!(!is_eligible(&urgent, later, threshold));

        let mut resolved = ticket_at(created);
        resolved.status = TicketStatus::Resolved;
        assert!(!is_eligible(&resolved, later, threshold));

        let mut working = ticket_at(created);
        working.status = TicketStatus::InProgress;
        assert!(is_eligible(&working, later, threshold));
    }
}
