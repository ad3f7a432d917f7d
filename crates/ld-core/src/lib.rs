//! lab-desk/crates/ld-core/src/lib.rs
//!
//! The ticket lifecycle and notification engine, plus the storage ports
//! plugins implement.

pub mod clock;
pub mod desk;
pub mod error;
pub mod feedback;
pub mod lifecycle;
pub mod locks;
pub mod models;
pub mod notifications;
pub mod policy;
pub mod stats;
pub mod traits;
pub mod urgency;

// Re-exporting for easier access in other crates
pub use clock::*;
pub use desk::*;
pub use error::*;
pub use feedback::FeedbackRecorder;
pub use lifecycle::LifecycleEngine;
pub use locks::TicketLocks;
pub use models::*;
pub use notifications::NotificationCenter;
pub use policy::*;
pub use stats::TicketSummary;
pub use traits::*;
pub use urgency::UrgencyMonitor;
