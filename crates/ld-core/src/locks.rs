//! Per-ticket mutual exclusion.
//!
//! Every ticket mutation holds the ticket's guard across its
//! read-validate-write sequence, so of two racing attempts the second one
//! re-reads the committed state. Tickets are independent: there is no
//! cross-ticket ordering.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

type LockTable = DashMap<Uuid, Arc<Mutex<()>>>;

#[derive(Debug, Clone, Default)]
pub struct TicketLocks {
    inner: Arc<LockTable>,
}

/// Exclusive access to one ticket. Dropping it releases the ticket and
/// forgets its lock once nobody else holds or awaits it, so the table only
/// ever tracks tickets under contention.
#[derive(Debug)]
pub struct TicketGuard {
    guard: Option<OwnedMutexGuard<()>>,
    ticket_id: Uuid,
    table: Arc<LockTable>,
}

impl Drop for TicketGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Waiters hold a clone of the Arc, so a count of one means only the
        // table still refers to this lock.
        self.table
            .remove_if(&self.ticket_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl TicketLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to one ticket.
    pub async fn acquire(&self, ticket_id: Uuid) -> TicketGuard {
        // The shard guard must be dropped before awaiting.
        let lock = Arc::clone(&self.inner.entry(ticket_id).or_default());
        let guard = lock.lock_owned().await;
        TicketGuard { guard: Some(guard), ticket_id, table: Arc::clone(&self.inner) }
    }

    /// Number of tickets currently locked or awaited.
    pub fn tracked(&self) -> usize {
        self.inner.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_ticket_is_serialized() {
        let locks = TicketLocks::new();
        let id = Uuid::now_v7();

        let guard = locks.acquire(id).await;
        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(id).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_released_locks_are_forgotten() {
        let locks = TicketLocks::new();
        let id = Uuid::now_v7();

        let guard = locks.acquire(id).await;
        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(id).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        // still awaited, so the entry must survive the first release
        drop(guard);
        waiter.await.unwrap();
        assert_eq!(locks.tracked(), 0);

        for _ in 0..10 {
            drop(locks.acquire(Uuid::now_v7()).await);
        }
        assert_eq!(locks.tracked(), 0);
    }

    #[tokio::test]
    async fn test_different_tickets_do_not_block() {
        let locks = TicketLocks::new();
        let _a = locks.acquire(Uuid::now_v7()).await;
        let _b = locks.acquire(Uuid::now_v7()).await;
    }
}
