use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{postgres::PgRow, PgPool, Row};

use crate::error::Result;
use crate::models::message::DueMessage;

/// The two store operations the delivery side is allowed to perform. The
/// API layer writes the same table through `MessageService`; the scheduler
/// only ever reads eligible rows and flips the delivered flag.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Messages eligible for delivery at `now`: undelivered, due, and
    /// addressed to a recipient. Ordered by ascending id.
    async fn due_messages(&self, now: NaiveDateTime) -> Result<Vec<DueMessage>>;

    /// Field-level update of the delivered flag for one row. An id that no
    /// longer exists updates nothing and is not an error.
    async fn set_delivered(&self, id: i64, delivered: bool) -> Result<()>;
}

#[derive(Clone)]
pub struct PgMessageStore {
    pool: PgPool,
}

impl PgMessageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageStore for PgMessageStore {
    async fn due_messages(&self, now: NaiveDateTime) -> Result<Vec<DueMessage>> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, content, recipient_email, delivery_date, is_delivered
            FROM messages
            WHERE is_delivered = FALSE
              AND delivery_date <= $1
              AND recipient_email IS NOT NULL
            ORDER BY id ASC
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        // Rows are decoded one at a time so a single corrupt row is logged
        // and skipped instead of aborting the whole selection.
        let mut due = Vec::with_capacity(rows.len());
        for row in &rows {
            match snapshot_from_row(row) {
                Ok(msg) => due.push(msg),
                Err(e) => {
                    let id: Option<i64> = row.try_get("id").ok();
                    tracing::error!(
                        message_id = ?id,
                        error = %e,
                        "Skipping message row that failed to decode"
                    );
                }
            }
        }
        Ok(due)
    }

    async fn set_delivered(&self, id: i64, delivered: bool) -> Result<()> {
        let result =
            sqlx::query(r#"UPDATE messages SET is_delivered = $2, updated_at = NOW() WHERE id = $1"#)
                .bind(id)
                .bind(delivered)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            tracing::warn!(
                message_id = id,
                "Delivered-flag update matched no row, message was likely deleted"
            );
        }
        Ok(())
    }
}

fn snapshot_from_row(row: &PgRow) -> std::result::Result<DueMessage, sqlx::Error> {
    Ok(DueMessage {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        recipient_email: row.try_get("recipient_email")?,
        delivery_date: row.try_get("delivery_date")?,
        is_delivered: row.try_get("is_delivered")?,
    })
}
