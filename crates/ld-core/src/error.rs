//! # AppError
//!
//! Centralized error handling for the lab helpdesk.
//! Every business-rule failure has its own variant so the presentation layer
//! can render it without reinterpreting internal codes.

use thiserror::Error;

/// The primary error type for all ld-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed caller input (e.g., empty description, rating out of range)
    #[error("validation error: {0}")]
    Validation(String),

    /// Role or ownership mismatch
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Illegal status move (skip, regression, wrong actor, already terminal)
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// Urgency rule not satisfied (already urgent, resolved, or too young)
    #[error("not eligible for escalation: {0}")]
    NotEligible(String),

    /// Feedback attempted before the ticket was resolved
    #[error("ticket {0} is not resolved")]
    NotResolved(String),

    /// Feedback already recorded for this ticket
    #[error("ticket {0} has already been rated")]
    AlreadyRated(String),

    /// Resource not found (e.g., Ticket, Notification)
    #[error("{0} not found with ID {1}")]
    NotFound(&'static str, String),

    /// Infrastructure failure (e.g., store unavailable)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable code for each error kind.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::Forbidden(_) => "forbidden",
            AppError::InvalidTransition(_) => "invalid_transition",
            AppError::NotEligible(_) => "not_eligible",
            AppError::NotResolved(_) => "not_resolved",
            AppError::AlreadyRated(_) => "already_rated",
            AppError::NotFound(..) => "not_found",
            AppError::Internal(_) => "internal_error",
        }
    }

    /// True for store/transport faults, false for business-rule violations.
    pub fn is_internal(&self) -> bool {
        matches!(self, AppError::Internal(_))
    }
}

// Storage ports speak anyhow; anything they raise is an infrastructure fault.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(format!("{err:#}"))
    }
}

/// A specialized Result type for helpdesk logic.
pub type Result<T> = std::result::Result<T, AppError>;
