//! # LifecycleEngine
//!
//! Creates tickets and moves them along Open -> In Progress -> Resolved.
//! Only resolvers may advance a ticket, one step at a time.
//!
//! # Developer Note
//! The ticket write is committed before any notification goes out. A failed
//! notification never rolls the transition back.

use std::sync::Arc;

use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{AppError, Result};
use crate::locks::TicketLocks;
use crate::models::{Actor, IssueCategory, NewTicket, RecipientScope, Role, Ticket, TicketStatus};
use crate::notifications::NotificationCenter;
use crate::policy::EnginePolicy;
use crate::traits::TicketStore;

#[derive(Clone)]
pub struct LifecycleEngine {
    store: Arc<dyn TicketStore>,
    locks: TicketLocks,
    notifications: NotificationCenter,
    clock: Arc<dyn Clock>,
    policy: EnginePolicy,
}

impl LifecycleEngine {
    pub fn new(
        store: Arc<dyn TicketStore>,
        locks: TicketLocks,
        notifications: NotificationCenter,
        clock: Arc<dyn Clock>,
        policy: EnginePolicy,
    ) -> Self {
        Self { store, locks, notifications, clock, policy }
    }

    /// Files a new ticket for `reporter`.
    ///
    /// `source_address` comes from the transport layer, never from the
    /// submitted body. Nothing is persisted when validation fails.
    pub async fn create(&self, reporter: &Actor, source_address: &str, input: NewTicket) -> Result<Ticket> {
        if reporter.role != Role::Reporter {
            return Err(AppError::Forbidden("only reporters can file tickets".into()));
        }

        // 1. Validate input
        let description = input.description.trim();
        if description.is_empty() {
            return Err(AppError::Validation("description must not be empty".into()));
        }
        let issue_category: IssueCategory = input.issue_category.parse().map_err(AppError::Validation)?;
        let pc_label = input
            .pc_label
            .map(|label| label.trim().to_string())
            .filter(|label| !label.is_empty());

        // 2. Persist
        let ticket = Ticket {
            id: Uuid::now_v7(),
            reporter_id: reporter.id,
            pc_label,
            source_address: source_address.to_string(),
            issue_category,
            description: description.to_string(),
            status: TicketStatus::Open,
            is_urgent: false,
            escalated_by: None,
            escalated_at: None,
            created_at: self.clock.now(),
            resolved_at: None,
            rating: None,
            feedback_text: None,
        };
        self.store.insert_ticket(&ticket).await?;
        log::info!("ticket {} filed by {} ({})", ticket.id, reporter.id, ticket.issue_category);

        // 3. Alert the resolver pool
        if self.policy.notify_on_create {
            self.notifications
                .emit_best_effort(
                    RecipientScope::Role(Role::Resolver),
                    format!("New {} issue reported at {}", ticket.issue_category, ticket.location()),
                )
                .await;
        }

        Ok(ticket)
    }

    /// Advances a ticket to `target`, which must be its immediate successor.
    pub async fn transition(&self, ticket_id: Uuid, actor: &Actor, target: TicketStatus) -> Result<Ticket> {
        let ticket = {
            let _guard = self.locks.acquire(ticket_id).await;

            let mut ticket = self
                .store
                .get_ticket(ticket_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Ticket", ticket_id.to_string()))?;

            if actor.role != Role::Resolver {
                return Err(AppError::InvalidTransition(format!(
                    "a {} cannot change ticket status",
                    actor.role
                )));
            }
            if ticket.status.next() != Some(target) {
                return Err(AppError::InvalidTransition(format!(
                    "cannot move ticket {ticket_id} from {} to {target}",
                    ticket.status
                )));
            }

            ticket.status = target;
            if target == TicketStatus::Resolved {
                ticket.resolved_at = Some(self.clock.now());
            }
            self.store.update_ticket(&ticket).await?;
            ticket
        };
        log::info!("ticket {} moved to {} by {}", ticket.id, ticket.status, actor.id);

        let reporter = RecipientScope::User(ticket.reporter_id);
        match ticket.status {
            TicketStatus::InProgress if self.policy.notify_on_start => {
                self.notifications
                    .emit_best_effort(
                        reporter,
                        format!("Work has started on your {} issue", ticket.issue_category),
                    )
                    .await;
            }
            TicketStatus::Resolved => {
                self.notifications
                    .emit_best_effort(
                        reporter,
                        format!("Your {} issue has been resolved", ticket.issue_category),
                    )
                    .await;
            }
            _ => {}
        }

        Ok(ticket)
    }
}
