//! # ld-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `ld-core` domain models.

use std::str::FromStr;

use anyhow::Context;
use async_trait::async_trait;
use ld_core::models::{Notification, RecipientScope, Ticket};
use ld_core::traits::{NotificationStore, TicketStore};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use uuid::Uuid;

const SCHEMA: [&str; 5] = [
    "CREATE TABLE IF NOT EXISTS tickets (
        id             BLOB PRIMARY KEY,
        reporter_id    BLOB NOT NULL,
        pc_label       TEXT,
        source_address TEXT NOT NULL,
        issue_category TEXT NOT NULL,
        description    TEXT NOT NULL,
        status         TEXT NOT NULL,
        is_urgent      BOOLEAN NOT NULL DEFAULT 0,
        escalated_by   BLOB,
        escalated_at   TEXT,
        created_at     TEXT NOT NULL,
        resolved_at    TEXT,
        rating         INTEGER CHECK (rating BETWEEN 1 AND 5),
        feedback_text  TEXT
    )",
    "CREATE INDEX IF NOT EXISTS idx_tickets_reporter ON tickets (reporter_id)",
    "CREATE TABLE IF NOT EXISTS notifications (
        id         BLOB PRIMARY KEY,
        scope      TEXT NOT NULL,
        message    TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_notifications_scope ON notifications (scope)",
    // Per-recipient read/cleared state; a missing row means unread and visible.
    "CREATE TABLE IF NOT EXISTS notification_receipts (
        notification_id BLOB NOT NULL REFERENCES notifications (id) ON DELETE CASCADE,
        user_id         BLOB NOT NULL,
        is_read         BOOLEAN NOT NULL DEFAULT 0,
        dismissed       BOOLEAN NOT NULL DEFAULT 0,
        PRIMARY KEY (notification_id, user_id)
    )",
];

const TICKET_COLUMNS: &str = "id, reporter_id, pc_label, source_address, issue_category, description, \
     status, is_urgent, escalated_by, escalated_at, created_at, resolved_at, rating, feedback_text";

pub struct SqliteStore {
    pool: SqlitePool,
}

// Helpers for UUID conversion
fn uuid_to_blob(id: Uuid) -> Vec<u8> {
    id.as_bytes().to_vec()
}

fn blob_to_uuid(blob: &[u8]) -> anyhow::Result<Uuid> {
    Uuid::from_slice(blob).context("malformed uuid column")
}

fn parse_column<T: FromStr<Err = String>>(raw: &str) -> anyhow::Result<T> {
    raw.parse().map_err(anyhow::Error::msg)
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `url` and ensures the
    /// schema exists.
    ///
    /// # Developer Note
    /// An in-memory database lives only as long as its connection, so
    /// `sqlite::memory:` gets a single connection that is never recycled.
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("invalid database url '{url}'"))?
            .create_if_missing(true);

        let pool_options = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options.connect_with(options).await?;

        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }
        log::info!("sqlite store ready at {url}");

        Ok(Self { pool })
    }

    fn ticket_from_row(row: &SqliteRow) -> anyhow::Result<Ticket> {
        let escalated_by = row
            .try_get::<Option<Vec<u8>>, _>("escalated_by")?
            .map(|blob| blob_to_uuid(&blob))
            .transpose()?;
        let rating = row
            .try_get::<Option<i64>, _>("rating")?
            .map(u8::try_from)
            .transpose()
            .context("rating out of range")?;

        Ok(Ticket {
            id: blob_to_uuid(&row.try_get::<Vec<u8>, _>("id")?)?,
            reporter_id: blob_to_uuid(&row.try_get::<Vec<u8>, _>("reporter_id")?)?,
            pc_label: row.try_get("pc_label")?,
            source_address: row.try_get("source_address")?,
            issue_category: parse_column(&row.try_get::<String, _>("issue_category")?)?,
            description: row.try_get("description")?,
            status: parse_column(&row.try_get::<String, _>("status")?)?,
            is_urgent: row.try_get("is_urgent")?,
            escalated_by,
            escalated_at: row.try_get("escalated_at")?,
            created_at: row.try_get("created_at")?,
            resolved_at: row.try_get("resolved_at")?,
            rating,
            feedback_text: row.try_get("feedback_text")?,
        })
    }

    fn notification_from_row(row: &SqliteRow) -> anyhow::Result<Notification> {
        Ok(Notification {
            id: blob_to_uuid(&row.try_get::<Vec<u8>, _>("id")?)?,
            scope: parse_column::<RecipientScope>(&row.try_get::<String, _>("scope")?)?,
            message: row.try_get("message")?,
            read: row.try_get("read")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Appends `<column> IN (?, ?, ...)` for the given scopes.
fn push_scope_filter<'s>(
    qb: &mut QueryBuilder<'_, Sqlite>,
    column: &str,
    scopes: impl IntoIterator<Item = &'s RecipientScope>,
) {
    qb.push(column);
    qb.push(" IN (");
    let mut separated = qb.separated(", ");
    for scope in scopes {
        separated.push_bind(scope.key());
    }
    separated.push_unseparated(")");
}

/// Notifications joined with `recipient`'s receipt, cleared ones filtered
/// out. Callers append further `AND` conditions.
fn recipient_view(recipient: Uuid) -> QueryBuilder<'static, Sqlite> {
    let mut qb = QueryBuilder::new(
        "SELECT n.id, n.scope, n.message, n.created_at, COALESCE(r.is_read, 0) AS read \
         FROM notifications n LEFT JOIN notification_receipts r \
         ON r.notification_id = n.id AND r.user_id = ",
    );
    qb.push_bind(uuid_to_blob(recipient));
    qb.push(" WHERE COALESCE(r.dismissed, 0) = 0");
    qb
}

/// Which receipt flag a bulk operation raises.
#[derive(Clone, Copy)]
enum Receipt {
    Read,
    Dismissed,
}

/// Upserts `recipient`'s receipt for every notification in `scopes` they
/// can still see, raising `flag`. Marking read skips rows already read.
fn receipt_upsert<'s>(
    recipient: Uuid,
    scopes: impl IntoIterator<Item = &'s RecipientScope>,
    flag: Receipt,
) -> QueryBuilder<'static, Sqlite> {
    let (values, conflict) = match flag {
        Receipt::Read => ("1, 0", "is_read = 1"),
        Receipt::Dismissed => ("COALESCE(r.is_read, 0), 1", "dismissed = 1"),
    };

    let mut qb = QueryBuilder::new(
        "INSERT INTO notification_receipts (notification_id, user_id, is_read, dismissed) SELECT n.id, ",
    );
    qb.push_bind(uuid_to_blob(recipient));
    qb.push(format_args!(
        ", {values} FROM notifications n LEFT JOIN notification_receipts r \
         ON r.notification_id = n.id AND r.user_id = "
    ));
    qb.push_bind(uuid_to_blob(recipient));
    qb.push(" WHERE COALESCE(r.dismissed, 0) = 0");
    if let Receipt::Read = flag {
        qb.push(" AND COALESCE(r.is_read, 0) = 0");
    }
    qb.push(" AND ");
    push_scope_filter(&mut qb, "n.scope", scopes);
    // the WHERE above keeps SQLite from reading ON CONFLICT as a join constraint
    qb.push(format_args!(" ON CONFLICT (notification_id, user_id) DO UPDATE SET {conflict}"));
    qb
}

#[async_trait]
impl TicketStore for SqliteStore {
    async fn insert_ticket(&self, ticket: &Ticket) -> anyhow::Result<()> {
        sqlx::query(&format!(
            "INSERT INTO tickets ({TICKET_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(uuid_to_blob(ticket.id))
        .bind(uuid_to_blob(ticket.reporter_id))
        .bind(&ticket.pc_label)
        .bind(&ticket.source_address)
        .bind(ticket.issue_category.as_str())
        .bind(&ticket.description)
        .bind(ticket.status.as_str())
        .bind(ticket.is_urgent)
        .bind(ticket.escalated_by.map(uuid_to_blob))
        .bind(ticket.escalated_at)
        .bind(ticket.created_at)
        .bind(ticket.resolved_at)
        .bind(ticket.rating.map(i64::from))
        .bind(&ticket.feedback_text)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_ticket(&self, id: Uuid) -> anyhow::Result<Option<Ticket>> {
        let row = sqlx::query(&format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE id = ?"))
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::ticket_from_row).transpose()
    }

    /// Writes back every mutable column; identity, owner and creation
    /// fields are never touched.
    async fn update_ticket(&self, ticket: &Ticket) -> anyhow::Result<()> {
        let result = sqlx::query(
            "UPDATE tickets SET status = ?, is_urgent = ?, escalated_by = ?, escalated_at = ?, \
             resolved_at = ?, rating = ?, feedback_text = ? WHERE id = ?",
        )
        .bind(ticket.status.as_str())
        .bind(ticket.is_urgent)
        .bind(ticket.escalated_by.map(uuid_to_blob))
        .bind(ticket.escalated_at)
        .bind(ticket.resolved_at)
        .bind(ticket.rating.map(i64::from))
        .bind(&ticket.feedback_text)
        .bind(uuid_to_blob(ticket.id))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            anyhow::bail!("ticket {} does not exist", ticket.id);
        }
        Ok(())
    }

    async fn list_tickets(&self) -> anyhow::Result<Vec<Ticket>> {
        let rows = sqlx::query(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::ticket_from_row).collect()
    }

    async fn list_tickets_by_reporter(&self, reporter_id: Uuid) -> anyhow::Result<Vec<Ticket>> {
        let rows = sqlx::query(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE reporter_id = ? ORDER BY created_at DESC, id DESC"
        ))
        .bind(uuid_to_blob(reporter_id))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::ticket_from_row).collect()
    }
}

#[async_trait]
impl NotificationStore for SqliteStore {
    async fn insert_notification(&self, notification: &Notification) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO notifications (id, scope, message, created_at) VALUES (?, ?, ?, ?)")
            .bind(uuid_to_blob(notification.id))
            .bind(notification.scope.key())
            .bind(&notification.message)
            .bind(notification.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_notification(&self, id: Uuid, recipient: Uuid) -> anyhow::Result<Option<Notification>> {
        let mut qb = recipient_view(recipient);
        qb.push(" AND n.id = ");
        qb.push_bind(uuid_to_blob(id));

        let row = qb.build().fetch_optional(&self.pool).await?;
        row.as_ref().map(Self::notification_from_row).transpose()
    }

    async fn list_notifications(
        &self,
        recipient: Uuid,
        scopes: &[RecipientScope],
    ) -> anyhow::Result<Vec<Notification>> {
        if scopes.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb = recipient_view(recipient);
        qb.push(" AND ");
        push_scope_filter(&mut qb, "n.scope", scopes);
        qb.push(" ORDER BY n.created_at DESC, n.id DESC");

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(Self::notification_from_row).collect()
    }

    async fn set_read(&self, id: Uuid, recipient: Uuid) -> anyhow::Result<()> {
        let exists = sqlx::query("SELECT 1 FROM notifications WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await?
            .is_some();
        if !exists {
            anyhow::bail!("notification {id} does not exist");
        }

        sqlx::query(
            "INSERT INTO notification_receipts (notification_id, user_id, is_read) VALUES (?, ?, 1) \
             ON CONFLICT (notification_id, user_id) DO UPDATE SET is_read = 1",
        )
        .bind(uuid_to_blob(id))
        .bind(uuid_to_blob(recipient))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mark_all_read(&self, recipient: Uuid, scopes: &[RecipientScope]) -> anyhow::Result<u64> {
        if scopes.is_empty() {
            return Ok(0);
        }
        let mut qb = receipt_upsert(recipient, scopes, Receipt::Read);
        Ok(qb.build().execute(&self.pool).await?.rows_affected())
    }

    /// Direct messages are deleted; broadcasts get a dismissal receipt.
    async fn clear_all(&self, recipient: Uuid, scopes: &[RecipientScope]) -> anyhow::Result<u64> {
        let (direct, broadcast): (Vec<&RecipientScope>, Vec<&RecipientScope>) =
            scopes.iter().partition(|s| matches!(s, RecipientScope::User(_)));
        let mut tx = self.pool.begin().await?;
        let mut removed = 0;

        if !direct.is_empty() {
            let mut qb = QueryBuilder::<Sqlite>::new(
                "DELETE FROM notification_receipts WHERE notification_id IN (SELECT id FROM notifications WHERE ",
            );
            push_scope_filter(&mut qb, "scope", direct.iter().copied());
            qb.push(")");
            qb.build().execute(&mut *tx).await?;

            let mut qb = QueryBuilder::<Sqlite>::new("DELETE FROM notifications WHERE ");
            push_scope_filter(&mut qb, "scope", direct.iter().copied());
            removed += qb.build().execute(&mut *tx).await?.rows_affected();
        }
        if !broadcast.is_empty() {
            let mut qb = receipt_upsert(recipient, broadcast.iter().copied(), Receipt::Dismissed);
            removed += qb.build().execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;
        Ok(removed)
    }
}
