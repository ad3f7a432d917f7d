//! lab-desk/crates/ld-api/src/middleware.rs Middleware
//!
//! Custom middleware for security and logging.

use actix_cors::Cors;
use actix_web::middleware::{DefaultHeaders, Logger};

use crate::identity::{ACTOR_ID_HEADER, ACTOR_ROLE_HEADER};

// Returns the standard access logger for the API.
pub fn standard_middleware() -> Logger {
    // remote-ip "request-line" status-code response-size "referrer" "user-agent"
    Logger::default()
}

// Configures CORS (Cross-Origin Resource Sharing)
// The dashboards are served from a different origin than the API.
pub fn cors_policy() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
        .allowed_headers(vec!["content-type", ACTOR_ID_HEADER, ACTOR_ROLE_HEADER])
        .max_age(3600)
}

// Security headers added to every response.
pub fn security_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("X-Content-Type-Options", "nosniff"))
        .add(("Referrer-Policy", "strict-origin-when-cross-origin"))
}
