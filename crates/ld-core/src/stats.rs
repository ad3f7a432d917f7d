//! # StatsAggregator
//!
//! Dashboard rollups derived from a ticket set on every call. Nothing is
//! cached. Durations are returned as values; formatting belongs to the
//! presentation layer.

use chrono::TimeDelta;
use serde::Serialize;

use crate::models::{Ticket, TicketStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketSummary {
    pub total: usize,
    pub open: usize,
    pub in_progress: usize,
    pub resolved: usize,
}

pub fn summarize(tickets: &[Ticket]) -> TicketSummary {
    tickets.iter().fold(TicketSummary::default(), |mut acc, ticket| {
        acc.total += 1;
        match ticket.status {
            TicketStatus::Open => acc.open += 1,
            TicketStatus::InProgress => acc.in_progress += 1,
            TicketStatus::Resolved => acc.resolved += 1,
        }
        acc
    })
}

/// `resolved_at - created_at`, or `None` for unresolved tickets.
pub fn resolution_duration(ticket: &Ticket) -> Option<TimeDelta> {
    match (ticket.status, ticket.resolved_at) {
        (TicketStatus::Resolved, Some(resolved_at)) => Some(resolved_at - ticket.created_at),
        _ => None,
    }
}

/// Mean time to resolution over resolved tickets.
pub fn average_resolution(tickets: &[Ticket]) -> Option<TimeDelta> {
    let durations: Vec<TimeDelta> = tickets.iter().filter_map(resolution_duration).collect();
    if durations.is_empty() {
        return None;
    }
    let total: TimeDelta = durations.iter().copied().sum();
    let count = i32::try_from(durations.len()).ok()?;
    Some(total / count)
}

/// Mean feedback rating over rated tickets.
pub fn average_rating(tickets: &[Ticket]) -> Option<f64> {
    let ratings: Vec<f64> = tickets.iter().filter_map(|t| t.rating).map(f64::from).collect();
    if ratings.is_empty() {
        return None;
    }
    Some(ratings.iter().sum::<f64>() / ratings.len() as f64)
}

/// The `limit` most recently created tickets, newest first.
pub fn recent(tickets: &[Ticket], limit: usize) -> Vec<Ticket> {
    let mut sorted = tickets.to_vec();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    sorted.truncate(limit);
    sorted
}
