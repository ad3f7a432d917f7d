use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use integration_tests::Harness;
use ld_api::handlers::AppState;
use ld_core::models::TicketStatus;
use serde_json::{json, Value};
use uuid::Uuid;

fn as_actor(req: test::TestRequest, id: Uuid, role: &str) -> test::TestRequest {
    req.insert_header(("x-actor-id", id.to_string()))
        .insert_header(("x-actor-role", role.to_string()))
}

#[actix_web::test]
async fn test_notification_bell_flow() {
    let h = Harness::sqlite().await;
    let student = integration_tests::reporter();
    let ticket = h.file(&student, "Monitor flickers").await;
    let staff = integration_tests::resolver();
    h.desk.lifecycle.transition(ticket.id, &staff, TicketStatus::InProgress).await.unwrap();
    h.desk.lifecycle.transition(ticket.id, &staff, TicketStatus::Resolved).await.unwrap();

    let state = web::Data::new(AppState { desk: h.desk });
    let app = test::init_service(App::new().app_data(state).configure(ld_api::configure_routes)).await;

    let req = as_actor(test::TestRequest::get().uri("/api/notifications"), student.id, "student").to_request();
    let list: Value = test::call_and_read_body_json(&app, req).await;
    let items = list.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["read"], false);
    let first_id = items[0]["id"].as_str().unwrap().to_string();

    for _ in 0..2 {
        let req = as_actor(
            test::TestRequest::put().uri(&format!("/api/notifications/{first_id}/read")),
            student.id,
            "student",
        )
        .to_request();
        let marked: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(marked["read"], true);
    }

    let req = as_actor(test::TestRequest::get().uri("/api/notifications/unread-count"), student.id, "student")
        .to_request();
    let count: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(count, json!({ "count": 1 }));

    // another student may not touch it
    let req = as_actor(
        test::TestRequest::put().uri(&format!("/api/notifications/{first_id}/read")),
        Uuid::now_v7(),
        "student",
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = as_actor(test::TestRequest::put().uri("/api/notifications/read-all"), student.id, "student")
        .to_request();
    let updated: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(updated, json!({ "updated": 1 }));

    let req = as_actor(test::TestRequest::delete().uri("/api/notifications/clear"), student.id, "student")
        .to_request();
    let removed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(removed, json!({ "removed": 2 }));

    // the resolver broadcast for the new ticket is untouched
    let req = as_actor(test::TestRequest::get().uri("/api/notifications"), staff.id, "network_team").to_request();
    let staff_list: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(staff_list.as_array().unwrap().len(), 1);
    assert_eq!(staff_list[0]["scope"], json!({ "kind": "role", "target": "resolver" }));
}
