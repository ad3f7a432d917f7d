//! # ld-api Handlers
//!
//! This module coordinates the flow between HTTP requests and the core engine.
//! Handlers only translate; every rule lives in `ld-core`.

use actix_web::{web, HttpRequest, HttpResponse};
use ld_core::desk::HelpDesk;
use ld_core::error::AppError;
use ld_core::models::{NewTicket, Role, TicketStatus};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::error::ApiError;
use crate::identity::{peer_address, CurrentActor};
use crate::present::{ticket_views, DashboardView, TicketView};

/// State shared across all Actix-web workers.
pub struct AppState {
    pub desk: HelpDesk,
}

type ApiResult = Result<HttpResponse, ApiError>;

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackForm {
    pub rating: i64,
    #[serde(default, alias = "feedbackText")]
    pub feedback: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

fn parse_status(raw: &str) -> Result<TicketStatus, AppError> {
    raw.parse().map_err(AppError::Validation)
}

/// Files a ticket. The source address is taken from the connection, never
/// from the body.
pub async fn create_ticket(
    data: web::Data<AppState>,
    req: HttpRequest,
    CurrentActor(actor): CurrentActor,
    form: web::Json<NewTicket>,
) -> ApiResult {
    let source_address = peer_address(&req);
    let ticket = data.desk.lifecycle.create(&actor, &source_address, form.into_inner()).await?;
    Ok(HttpResponse::Created().json(TicketView::from(ticket)))
}

pub async fn my_tickets(data: web::Data<AppState>, CurrentActor(actor): CurrentActor) -> ApiResult {
    let tickets = data.desk.my_tickets(&actor).await?;
    Ok(HttpResponse::Ok().json(ticket_views(tickets)))
}

/// Staff listing; `?status=Open|In Progress|Resolved|All`.
pub async fn all_tickets(
    data: web::Data<AppState>,
    CurrentActor(actor): CurrentActor,
    query: web::Query<ListQuery>,
) -> ApiResult {
    let status = match query.status.as_deref() {
        None | Some("All") | Some("") => None,
        Some(raw) => Some(parse_status(raw)?),
    };
    let tickets = data.desk.all_tickets(&actor, status).await?;
    Ok(HttpResponse::Ok().json(ticket_views(tickets)))
}

pub async fn update_status(
    data: web::Data<AppState>,
    CurrentActor(actor): CurrentActor,
    path: web::Path<Uuid>,
    body: web::Json<StatusUpdate>,
) -> ApiResult {
    let target = parse_status(&body.status)?;
    let ticket = data.desk.lifecycle.transition(path.into_inner(), &actor, target).await?;
    Ok(HttpResponse::Ok().json(TicketView::from(ticket)))
}

pub async fn mark_urgent(
    data: web::Data<AppState>,
    CurrentActor(actor): CurrentActor,
    path: web::Path<Uuid>,
) -> ApiResult {
    let ticket = data.desk.urgency.mark_urgent(path.into_inner(), &actor).await?;
    Ok(HttpResponse::Ok().json(TicketView::from(ticket)))
}

/// Tickets a resolver could escalate right now.
pub async fn urgent_eligible(data: web::Data<AppState>, CurrentActor(actor): CurrentActor) -> ApiResult {
    if actor.role != Role::Resolver {
        return Err(AppError::Forbidden("only resolvers can escalate tickets".into()).into());
    }
    let now = data.desk.clock().now();
    let ids = data.desk.urgency.sweep(now).await?;
    Ok(HttpResponse::Ok().json(ids))
}

pub async fn submit_feedback(
    data: web::Data<AppState>,
    CurrentActor(actor): CurrentActor,
    path: web::Path<Uuid>,
    form: web::Json<FeedbackForm>,
) -> ApiResult {
    let form = form.into_inner();
    let ticket = data
        .desk
        .feedback
        .record_feedback(path.into_inner(), &actor, form.rating, form.feedback.as_deref().unwrap_or(""))
        .await?;
    Ok(HttpResponse::Ok().json(TicketView::from(ticket)))
}

pub async fn dashboard(data: web::Data<AppState>, CurrentActor(actor): CurrentActor) -> ApiResult {
    let dashboard = data.desk.dashboard(&actor).await?;
    Ok(HttpResponse::Ok().json(DashboardView::from(dashboard)))
}

pub async fn list_notifications(data: web::Data<AppState>, CurrentActor(actor): CurrentActor) -> ApiResult {
    let items = data.desk.notifications.list_for(&actor).await?;
    Ok(HttpResponse::Ok().json(items))
}

pub async fn unread_count(data: web::Data<AppState>, CurrentActor(actor): CurrentActor) -> ApiResult {
    let count = data.desk.notifications.unread_count(&actor).await?;
    Ok(HttpResponse::Ok().json(json!({ "count": count })))
}

pub async fn mark_read(
    data: web::Data<AppState>,
    CurrentActor(actor): CurrentActor,
    path: web::Path<Uuid>,
) -> ApiResult {
    let notification = data.desk.notifications.mark_read(path.into_inner(), &actor).await?;
    Ok(HttpResponse::Ok().json(notification))
}

pub async fn mark_all_read(data: web::Data<AppState>, CurrentActor(actor): CurrentActor) -> ApiResult {
    let updated = data.desk.notifications.mark_all_read(&actor).await?;
    Ok(HttpResponse::Ok().json(json!({ "updated": updated })))
}

pub async fn clear_notifications(data: web::Data<AppState>, CurrentActor(actor): CurrentActor) -> ApiResult {
    let removed = data.desk.notifications.clear_all(&actor).await?;
    Ok(HttpResponse::Ok().json(json!({ "removed": removed })))
}

/// Echoes the address the server sees for this client.
pub async fn client_ip(req: HttpRequest) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "ip": peer_address(&req) }))
}
