use chrono::TimeDelta;
use integration_tests::{new_ticket, observer, reporter, resolver, Harness};
use ld_core::error::AppError;
use ld_core::models::{IssueCategory, RecipientScope, Role, TicketStatus};

#[tokio::test]
async fn test_full_lifecycle_scenario() {
    let h = Harness::memory();
    let student = reporter();
    let staff = resolver();

    let ticket = h
        .desk
        .lifecycle
        .create(&student, "10.20.0.14", new_ticket("Hardware", "Monitor flickers"))
        .await
        .unwrap();
    assert_eq!(ticket.status, TicketStatus::Open);
    assert_eq!(ticket.issue_category, IssueCategory::Hardware);
    assert!(!ticket.is_urgent);
    assert!(ticket.resolved_at.is_none());
    assert_eq!(ticket.source_address, "10.20.0.14");

    h.clock.advance(TimeDelta::minutes(3));
    let started = h.desk.lifecycle.transition(ticket.id, &staff, TicketStatus::InProgress).await.unwrap();
    assert_eq!(started.status, TicketStatus::InProgress);
    assert_eq!(h.desk.notifications.list_for(&student).await.unwrap().len(), 1);

    h.clock.advance(TimeDelta::minutes(12));
    let resolved = h.desk.lifecycle.transition(ticket.id, &staff, TicketStatus::Resolved).await.unwrap();
    assert_eq!(resolved.status, TicketStatus::Resolved);
    assert_eq!(resolved.resolved_at, Some(ticket.created_at + TimeDelta::minutes(15)));

    let inbox = h.desk.notifications.list_for(&student).await.unwrap();
    assert_eq!(inbox.len(), 2);
    assert!(inbox[0].message.contains("resolved"));
    assert!(inbox.iter().all(|n| n.scope == RecipientScope::User(student.id)));

    let rated = h
        .desk
        .feedback
        .record_feedback(ticket.id, &student, 4, "fixed fast")
        .await
        .unwrap();
    assert_eq!(rated.rating, Some(4));
    assert_eq!(rated.feedback_text.as_deref(), Some("fixed fast"));

    let again = h.desk.feedback.record_feedback(ticket.id, &student, 5, "").await;
    assert!(matches!(again, Err(AppError::AlreadyRated(_))));
}

#[tokio::test]
async fn test_skips_and_regressions_are_rejected() {
    let h = Harness::sqlite().await;
    let staff = resolver();
    let ticket = h.file(&reporter(), "Mouse unresponsive").await;

    for target in [TicketStatus::Resolved, TicketStatus::Open] {
        let err = h.desk.lifecycle.transition(ticket.id, &staff, target).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)), "Open -> {target}");
    }

    h.desk.lifecycle.transition(ticket.id, &staff, TicketStatus::InProgress).await.unwrap();
    for target in [TicketStatus::Open, TicketStatus::InProgress] {
        let err = h.desk.lifecycle.transition(ticket.id, &staff, target).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)), "In Progress -> {target}");
    }

    h.desk.lifecycle.transition(ticket.id, &staff, TicketStatus::Resolved).await.unwrap();
    for target in [TicketStatus::Open, TicketStatus::InProgress, TicketStatus::Resolved] {
        let err = h.desk.lifecycle.transition(ticket.id, &staff, target).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)), "Resolved -> {target}");
    }
}

#[tokio::test]
async fn test_only_resolvers_move_tickets() {
    let h = Harness::memory();
    let student = reporter();
    let ticket = h.file(&student, "Audio jack broken").await;

    for actor in [student, observer()] {
        let err = h
            .desk
            .lifecycle
            .transition(ticket.id, &actor, TicketStatus::InProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));
    }
}

#[tokio::test]
async fn test_empty_description_is_not_persisted() {
    let h = Harness::sqlite().await;
    let student = reporter();

    let err = h
        .desk
        .lifecycle
        .create(&student, "10.20.0.14", new_ticket("Hardware", ""))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert!(h.desk.my_tickets(&student).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_creation_alerts_resolvers() {
    let h = Harness::memory();
    h.file(&reporter(), "Wi-Fi drops every minute").await;

    let staff_inbox = h.desk.notifications.list_for(&resolver()).await.unwrap();
    assert_eq!(staff_inbox.len(), 1);
    assert_eq!(staff_inbox[0].scope, RecipientScope::Role(Role::Resolver));
    assert!(staff_inbox[0].message.contains("PC-14"));
}

#[tokio::test]
async fn test_unknown_ticket_is_not_found() {
    let h = Harness::memory();
    let err = h
        .desk
        .lifecycle
        .transition(uuid::Uuid::now_v7(), &resolver(), TicketStatus::InProgress)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound("Ticket", _)));
}

#[tokio::test]
async fn test_listing_is_role_scoped() {
    let h = Harness::memory();
    let alice = reporter();
    let bob = reporter();
    let first = h.file(&alice, "Blue screen on boot").await;
    h.file(&bob, "Printer jammed").await;
    h.desk.lifecycle.transition(first.id, &resolver(), TicketStatus::InProgress).await.unwrap();

    let mine = h.desk.my_tickets(&alice).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, first.id);

    assert!(matches!(h.desk.all_tickets(&alice, None).await, Err(AppError::Forbidden(_))));
    assert!(matches!(h.desk.my_tickets(&resolver()).await, Err(AppError::Forbidden(_))));

    assert_eq!(h.desk.all_tickets(&observer(), None).await.unwrap().len(), 2);
    let working = h
        .desk
        .all_tickets(&resolver(), Some(TicketStatus::InProgress))
        .await
        .unwrap();
    assert_eq!(working.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_resolution_has_one_winner() {
    let h = Harness::sqlite().await;
    let student = reporter();
    let ticket = h.file(&student, "Projector overheating").await;
    h.desk.lifecycle.transition(ticket.id, &resolver(), TicketStatus::InProgress).await.unwrap();

    let attempts: Vec<_> = (0..2)
        .map(|_| {
            let desk = h.desk.clone();
            let id = ticket.id;
            tokio::spawn(async move { desk.lifecycle.transition(id, &resolver(), TicketStatus::Resolved).await })
        })
        .collect();

    let mut wins = 0;
    let mut losses = 0;
    for attempt in attempts {
        match attempt.await.unwrap() {
            Ok(t) => {
                assert_eq!(t.status, TicketStatus::Resolved);
                wins += 1;
            }
            Err(AppError::InvalidTransition(_)) => losses += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!((wins, losses), (1, 1));

    // one for the start of work, one for the single resolution
    assert_eq!(h.desk.notifications.list_for(&student).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_dashboard_rollup() {
    let h = Harness::memory();
    let staff = resolver();
    let a = h.file(&reporter(), "Fan noise").await;
    h.file(&reporter(), "Slow login").await;

    h.desk.lifecycle.transition(a.id, &staff, TicketStatus::InProgress).await.unwrap();
    h.clock.advance(TimeDelta::minutes(45));
    h.desk.lifecycle.transition(a.id, &staff, TicketStatus::Resolved).await.unwrap();

    let dashboard = h.desk.dashboard(&observer()).await.unwrap();
    assert_eq!(dashboard.summary.total, 2);
    assert_eq!(dashboard.summary.open, 1);
    assert_eq!(dashboard.summary.resolved, 1);
    assert_eq!(dashboard.average_resolution, Some(TimeDelta::minutes(45)));
    assert_eq!(dashboard.recent.len(), 2);
    assert!(h.desk.dashboard(&reporter()).await.is_err());
}
