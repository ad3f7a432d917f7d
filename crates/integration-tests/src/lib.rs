//! Shared fixtures for the cross-crate behavioral tests under `tests/`.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use ld_core::clock::ManualClock;
use ld_core::desk::HelpDesk;
use ld_core::models::{Actor, NewTicket, Ticket};
use ld_core::policy::EnginePolicy;
use ld_core::traits::{NotificationStore, TicketStore};
use ld_db_sqlite::SqliteStore;
use ld_store_memory::MemoryStore;
use uuid::Uuid;

/// An engine over a fresh store with a hand-driven clock.
pub struct Harness {
    pub desk: HelpDesk,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn with_store<S>(store: Arc<S>, policy: EnginePolicy) -> Self
    where
        S: TicketStore + NotificationStore + 'static,
    {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap()));
        let desk = HelpDesk::with_clock(store.clone(), store, policy, clock.clone());
        Self { desk, clock }
    }

    pub fn memory() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()), EnginePolicy::default())
    }

    pub async fn sqlite() -> Self {
        let store = SqliteStore::new("sqlite::memory:").await.expect("in-memory sqlite");
        Self::with_store(Arc::new(store), EnginePolicy::default())
    }

    /// Files a Hardware ticket for `reporter`.
    pub async fn file(&self, reporter: &Actor, description: &str) -> Ticket {
        self.desk
            .lifecycle
            .create(reporter, "10.20.0.14", new_ticket("Hardware", description))
            .await
            .expect("ticket should be created")
    }
}

pub fn new_ticket(category: &str, description: &str) -> NewTicket {
    NewTicket {
        pc_label: Some("PC-14".into()),
        issue_category: category.into(),
        description: description.into(),
    }
}

pub fn reporter() -> Actor {
    Actor::reporter(Uuid::now_v7())
}

pub fn resolver() -> Actor {
    Actor::resolver(Uuid::now_v7())
}

pub fn observer() -> Actor {
    Actor::observer(Uuid::now_v7())
}
