//! Actor identity at the request boundary.
//!
//! Credentials are verified upstream; the gateway forwards the caller's id
//! and role as headers, and handlers receive them as an explicit `Actor`.

use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use ld_core::models::{Actor, Role};
use uuid::Uuid;

use crate::error::ApiError;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// The authenticated caller.
#[derive(Debug, Clone, Copy)]
pub struct CurrentActor(pub Actor);

fn header<'a>(req: &'a HttpRequest, name: &str) -> Result<&'a str, ApiError> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized(format!("missing {name} header")))
}

fn actor_from_headers(req: &HttpRequest) -> Result<CurrentActor, ApiError> {
    let id = Uuid::parse_str(header(req, ACTOR_ID_HEADER)?)
        .map_err(|_| ApiError::Unauthorized(format!("malformed {ACTOR_ID_HEADER} header")))?;
    let role: Role = header(req, ACTOR_ROLE_HEADER)?
        .parse()
        .map_err(ApiError::Unauthorized)?;
    Ok(CurrentActor(Actor::new(id, role)))
}

impl FromRequest for CurrentActor {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(actor_from_headers(req))
    }
}

/// Address of the connecting peer, recorded as a ticket's source address.
pub fn peer_address(req: &HttpRequest) -> String {
    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
