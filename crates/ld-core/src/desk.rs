//! # HelpDesk
//!
//! Wires the engine components to one pair of stores, one clock and one
//! lock table, and adds the role-scoped ticket queries the request boundary
//! needs.

use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::error::{AppError, Result};
use crate::feedback::FeedbackRecorder;
use crate::lifecycle::LifecycleEngine;
use crate::locks::TicketLocks;
use crate::models::{Actor, Role, Ticket, TicketStatus};
use crate::notifications::NotificationCenter;
use crate::policy::EnginePolicy;
use crate::stats::{self, TicketSummary};
use crate::traits::{NotificationStore, TicketStore};
use crate::urgency::UrgencyMonitor;
use chrono::TimeDelta;

/// How many tickets the dashboard lists as recent.
pub const DASHBOARD_RECENT: usize = 5;

#[derive(Clone)]
pub struct HelpDesk {
    pub lifecycle: LifecycleEngine,
    pub urgency: UrgencyMonitor,
    pub feedback: FeedbackRecorder,
    pub notifications: NotificationCenter,
    tickets: Arc<dyn TicketStore>,
    clock: Arc<dyn Clock>,
}

/// Observer/resolver dashboard rollup.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub summary: TicketSummary,
    pub average_resolution: Option<TimeDelta>,
    pub average_rating: Option<f64>,
    pub recent: Vec<Ticket>,
}

impl HelpDesk {
    pub fn new(
        tickets: Arc<dyn TicketStore>,
        notifications: Arc<dyn NotificationStore>,
        policy: EnginePolicy,
    ) -> Self {
        Self::with_clock(tickets, notifications, policy, Arc::new(SystemClock))
    }

    pub fn with_clock(
        tickets: Arc<dyn TicketStore>,
        notifications: Arc<dyn NotificationStore>,
        policy: EnginePolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let locks = TicketLocks::new();
        let center = NotificationCenter::new(notifications, clock.clone());

        Self {
            lifecycle: LifecycleEngine::new(
                tickets.clone(),
                locks.clone(),
                center.clone(),
                clock.clone(),
                policy,
            ),
            urgency: UrgencyMonitor::new(
                tickets.clone(),
                locks.clone(),
                center.clone(),
                clock.clone(),
                policy.urgency_threshold,
            ),
            feedback: FeedbackRecorder::new(tickets.clone(), locks),
            notifications: center,
            tickets,
            clock,
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// The reporter's own tickets, newest first.
    pub async fn my_tickets(&self, actor: &Actor) -> Result<Vec<Ticket>> {
        if actor.role != Role::Reporter {
            return Err(AppError::Forbidden("only reporters have their own tickets".into()));
        }
        Ok(self.tickets.list_tickets_by_reporter(actor.id).await?)
    }

    /// Every ticket, optionally narrowed to one status. Resolvers and
    /// observers only.
    pub async fn all_tickets(&self, actor: &Actor, status: Option<TicketStatus>) -> Result<Vec<Ticket>> {
        if actor.role == Role::Reporter {
            return Err(AppError::Forbidden("reporters may only list their own tickets".into()));
        }
        let mut tickets = self.tickets.list_tickets().await?;
        if let Some(status) = status {
            tickets.retain(|t| t.status == status);
        }
        Ok(tickets)
    }

    /// Rollups for the staff dashboards, recomputed on every call.
    pub async fn dashboard(&self, actor: &Actor) -> Result<Dashboard> {
        let tickets = self.all_tickets(actor, None).await?;
        Ok(Dashboard {
            summary: stats::summarize(&tickets),
            average_resolution: stats::average_resolution(&tickets),
            average_rating: stats::average_rating(&tickets),
            recent: stats::recent(&tickets, DASHBOARD_RECENT),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IssueCategory;
    use crate::traits::{MockNotificationStore, MockTicketStore};
    use chrono::Utc;
    use uuid::Uuid;

    fn ticket(status: TicketStatus, minutes_ago: i64) -> Ticket {
        let created_at = Utc::now() - TimeDelta::minutes(minutes_ago);
        Ticket {
            id: Uuid::now_v7(),
            reporter_id: Uuid::now_v7(),
            pc_label: None,
            source_address: "10.0.0.1".into(),
            issue_category: IssueCategory::Other,
            description: "Projector remote missing".into(),
            status,
            is_urgent: false,
            escalated_by: None,
            escalated_at: None,
            created_at,
            resolved_at: (status == TicketStatus::Resolved).then(|| created_at + TimeDelta::minutes(30)),
            rating: None,
            feedback_text: None,
        }
    }

    fn desk(tickets: MockTicketStore) -> HelpDesk {
        HelpDesk::new(Arc::new(tickets), Arc::new(MockNotificationStore::new()), EnginePolicy::default())
    }

    #[tokio::test]
    async fn test_reporters_are_kept_to_their_own_tickets() {
        let mut tickets = MockTicketStore::new();
        tickets.expect_list_tickets().never();
        tickets
            .expect_list_tickets_by_reporter()
            .times(1)
            .returning(|_| Ok(vec![]));
        let desk = desk(tickets);
        let reporter = Actor::reporter(Uuid::now_v7());

        assert!(desk.my_tickets(&reporter).await.unwrap().is_empty());
        assert!(matches!(desk.all_tickets(&reporter, None).await, Err(AppError::Forbidden(_))));
        assert!(matches!(desk.dashboard(&reporter).await, Err(AppError::Forbidden(_))));
        assert!(matches!(
            desk.my_tickets(&Actor::resolver(Uuid::now_v7())).await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_status_filter_and_dashboard() {
        let mut tickets = MockTicketStore::new();
        let stored = vec![
            ticket(TicketStatus::Open, 1),
            ticket(TicketStatus::InProgress, 2),
            ticket(TicketStatus::Resolved, 90),
        ];
        tickets.expect_list_tickets().returning(move || Ok(stored.clone()));
        let desk = desk(tickets);
        let observer = Actor::observer(Uuid::now_v7());

        let open = desk.all_tickets(&observer, Some(TicketStatus::Open)).await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].status, TicketStatus::Open);

        let board = desk.dashboard(&observer).await.unwrap();
        assert_eq!(board.summary.total, 3);
        assert_eq!(board.summary.resolved, 1);
        assert_eq!(board.average_resolution, Some(TimeDelta::minutes(30)));
        assert_eq!(board.average_rating, None);
        assert_eq!(board.recent.len(), 3);
    }
}
