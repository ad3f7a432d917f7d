//! Presentation-boundary shapes and formatting.

use chrono::TimeDelta;
use ld_core::desk::Dashboard;
use ld_core::models::Ticket;
use ld_core::stats::{self, TicketSummary};
use serde::Serialize;

/// Human-readable duration: `2d 3h`, `1h 20m` or `7m`.
pub fn format_duration(duration: TimeDelta) -> String {
    let minutes = duration.num_minutes().max(0);
    let hours = minutes / 60;
    let days = hours / 24;

    if days > 0 {
        format!("{days}d {}h", hours % 24)
    } else if hours > 0 {
        format!("{hours}h {}m", minutes % 60)
    } else {
        format!("{minutes}m")
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketView {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub resolution_time: Option<String>,
}

impl From<Ticket> for TicketView {
    fn from(ticket: Ticket) -> Self {
        let resolution_time = stats::resolution_duration(&ticket).map(format_duration);
        Self { ticket, resolution_time }
    }
}

pub fn ticket_views(tickets: Vec<Ticket>) -> Vec<TicketView> {
    tickets.into_iter().map(TicketView::from).collect()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    #[serde(flatten)]
    pub summary: TicketSummary,
    pub average_resolution_time: Option<String>,
    pub average_rating: Option<f64>,
    pub recent: Vec<TicketView>,
}

impl From<Dashboard> for DashboardView {
    fn from(dashboard: Dashboard) -> Self {
        Self {
            summary: dashboard.summary,
            average_resolution_time: dashboard.average_resolution.map(format_duration),
            average_rating: dashboard.average_rating,
            recent: ticket_views(dashboard.recent),
        }
    }
}
