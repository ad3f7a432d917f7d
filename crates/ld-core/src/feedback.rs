//! # FeedbackRecorder
//!
//! Attaches a one-time rating and comment to a resolved ticket. Only the
//! reporter who filed the ticket may rate it. No notification is emitted.

use std::sync::Arc;

use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::locks::TicketLocks;
use crate::models::{Actor, Ticket, TicketStatus};
use crate::traits::TicketStore;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

#[derive(Clone)]
pub struct FeedbackRecorder {
    store: Arc<dyn TicketStore>,
    locks: TicketLocks,
}

impl FeedbackRecorder {
    pub fn new(store: Arc<dyn TicketStore>, locks: TicketLocks) -> Self {
        Self { store, locks }
    }

    /// `feedback_text` is stored verbatim; an empty comment is allowed.
    pub async fn record_feedback(
        &self,
        ticket_id: Uuid,
        actor: &Actor,
        rating: i64,
        feedback_text: &str,
    ) -> Result<Ticket> {
        let _guard = self.locks.acquire(ticket_id).await;

        let mut ticket = self
            .store
            .get_ticket(ticket_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Ticket", ticket_id.to_string()))?;

        if ticket.status != TicketStatus::Resolved {
            return Err(AppError::NotResolved(ticket_id.to_string()));
        }
        if actor.id != ticket.reporter_id {
            return Err(AppError::Forbidden("only the reporter can rate this ticket".into()));
        }
        if ticket.rating.is_some() {
            return Err(AppError::AlreadyRated(ticket_id.to_string()));
        }
        let rating = u8::try_from(rating)
            .ok()
            .filter(|r| (MIN_RATING..=MAX_RATING).contains(r))
            .ok_or_else(|| {
                AppError::Validation(format!("rating must be between {MIN_RATING} and {MAX_RATING}"))
            })?;

        ticket.rating = Some(rating);
        ticket.feedback_text = Some(feedback_text.to_string());
        self.store.update_ticket(&ticket).await?;
        log::info!("ticket {} rated {rating}/5", ticket.id);

        Ok(ticket)
    }
}
