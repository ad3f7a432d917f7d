//! # ld-api
//!
//! The web routing and orchestration layer for lab-desk.

pub mod error;
pub mod handlers;
pub mod identity;
pub mod middleware;
pub mod present;

use actix_web::web;

/// Configures the helpdesk routes.
///
/// # Developer Note
/// We use a scoped configuration to allow the main binary to mount
/// the API under different paths if needed.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(error::json_config())
            .app_data(error::query_config())
            .app_data(error::path_config())
            // Tickets
            .route("/tickets", web::post().to(handlers::create_ticket))
            .route("/tickets", web::get().to(handlers::all_tickets))
            .route("/tickets/my", web::get().to(handlers::my_tickets))
            .route("/tickets/urgent-eligible", web::get().to(handlers::urgent_eligible))
            .route("/tickets/{id}", web::put().to(handlers::update_status))
            .route("/tickets/{id}/urgent", web::put().to(handlers::mark_urgent))
            .route("/tickets/{id}/feedback", web::post().to(handlers::submit_feedback))
            .route("/stats", web::get().to(handlers::dashboard))
            // Notifications
            .route("/notifications", web::get().to(handlers::list_notifications))
            .route("/notifications/unread-count", web::get().to(handlers::unread_count))
            .route("/notifications/read-all", web::put().to(handlers::mark_all_read))
            .route("/notifications/clear", web::delete().to(handlers::clear_notifications))
            .route("/notifications/{id}/read", web::put().to(handlers::mark_read))
            // Transport helpers
            .route("/get-ip", web::get().to(handlers::client_ip)),
    );
}
