use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::message_dto::{CreateMessagePayload, UpdateMessagePayload};
use crate::error::{Error, Result};
use crate::models::message::Message;
use crate::utils::time::parse_timestamp;

/// API-side writer for the messages table. Owner-scoped: every query is
/// keyed by (id, user_id). The delivered flag is out of reach here; only
/// the delivery engine writes it through `MessageStore`.
#[derive(Clone)]
pub struct MessageService {
    pool: PgPool,
}

impl MessageService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user_id: Uuid, payload: CreateMessagePayload) -> Result<Message> {
        let delivery_date = parse_timestamp(&payload.delivery_date)
            .map_err(|e| Error::BadRequest(e.to_string()))?;
        let media_urls = match &payload.media_urls {
            Some(urls) => Some(serde_json::to_value(urls)?),
            None => None,
        };

        let message = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages
                (user_id, title, content, media_urls, delivery_date, delivery_method,
                 recipient_email, recipient_phone, generation_settings)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&payload.title)
        .bind(&payload.content)
        .bind(&media_urls)
        .bind(delivery_date)
        .bind(&payload.delivery_method)
        .bind(payload.recipient_email.as_deref())
        .bind(payload.recipient_phone.as_deref())
        .bind(&payload.generation_settings)
        .fetch_one(&self.pool)
        .await?;

        Ok(message)
    }

    pub async fn list_for_user(&self, user_id: Uuid, skip: i64, limit: i64) -> Result<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT * FROM messages
            WHERE user_id = $1
            ORDER BY id ASC
            OFFSET $2 LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(skip)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    pub async fn get_for_user(&self, id: i64, user_id: Uuid) -> Result<Message> {
        let message = sqlx::query_as::<_, Message>(
            r#"SELECT * FROM messages WHERE id = $1 AND user_id = $2"#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        message.ok_or_else(|| Error::NotFound("Message not found".to_string()))
    }

    pub async fn update_for_user(
        &self,
        id: i64,
        user_id: Uuid,
        payload: UpdateMessagePayload,
    ) -> Result<Message> {
        let delivery_date = match payload.delivery_date.as_deref() {
            Some(raw) => Some(parse_timestamp(raw).map_err(|e| Error::BadRequest(e.to_string()))?),
            None => None,
        };
        let media_urls = match &payload.media_urls {
            Some(urls) => Some(serde_json::to_value(urls)?),
            None => None,
        };

        let message = sqlx::query_as::<_, Message>(
            r#"
            UPDATE messages
            SET title = COALESCE($3, title),
                content = COALESCE($4, content),
                media_urls = COALESCE($5, media_urls),
                delivery_date = COALESCE($6, delivery_date),
                delivery_method = COALESCE($7, delivery_method),
                recipient_email = COALESCE($8, recipient_email),
                recipient_phone = COALESCE($9, recipient_phone),
                generation_settings = COALESCE($10, generation_settings),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(payload.title.as_deref())
        .bind(payload.content.as_deref())
        .bind(&media_urls)
        .bind(delivery_date)
        .bind(payload.delivery_method.as_deref())
        .bind(payload.recipient_email.as_deref())
        .bind(payload.recipient_phone.as_deref())
        .bind(&payload.generation_settings)
        .fetch_optional(&self.pool)
        .await?;

        message.ok_or_else(|| Error::NotFound("Message not found".to_string()))
    }

    pub async fn delete_for_user(&self, id: i64, user_id: Uuid) -> Result<()> {
        let result = sqlx::query(r#"DELETE FROM messages WHERE id = $1 AND user_id = $2"#)
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Message not found".to_string()));
        }
        Ok(())
    }
}
