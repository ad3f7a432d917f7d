//! Maps core errors onto HTTP responses.
//!
//! Every error body is `{"code": ..., "msg": ...}` so clients can branch on
//! `code` and show `msg` as-is.

use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use ld_core::error::AppError;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    App(#[from] AppError),

    /// Missing or malformed actor identity headers
    #[error("unauthorized: {0}")]
    Unauthorized(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    msg: String,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::App(err) => match err {
                AppError::Validation(_) => StatusCode::BAD_REQUEST,
                AppError::Forbidden(_) => StatusCode::FORBIDDEN,
                AppError::NotFound(..) => StatusCode::NOT_FOUND,
                AppError::InvalidTransition(_)
                | AppError::NotEligible(_)
                | AppError::NotResolved(_)
                | AppError::AlreadyRated(_) => StatusCode::CONFLICT,
                AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ApiError::Unauthorized(_) => ErrorBody { code: "unauthorized", msg: self.to_string() },
            ApiError::App(err) if err.is_internal() => {
                log::error!("request failed: {err}");
                ErrorBody { code: err.code(), msg: "internal service error".into() }
            }
            ApiError::App(err) => ErrorBody { code: err.code(), msg: err.to_string() },
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

fn malformed(what: &str, err: impl std::fmt::Display) -> actix_web::Error {
    ApiError::from(AppError::Validation(format!("malformed {what}: {err}"))).into()
}

/// Extractor settings so a body, query or path that fails to decode still
/// answers with a `validation_error` body.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| malformed("request body", err))
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| malformed("query string", err))
}

pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| malformed("path", err))
}
