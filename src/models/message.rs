use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: i64,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub media_urls: Option<JsonValue>,
    pub delivery_date: NaiveDateTime,
    pub delivery_method: String,
    pub recipient_email: Option<String>,
    pub recipient_phone: Option<String>,
    pub generation_settings: Option<JsonValue>,
    pub is_delivered: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Point-in-time projection of a deliverable message handed from the
/// due-message query to the delivery engine. Not the live row: the engine
/// re-applies its state change by id and tolerates the row having been
/// edited or deleted in the meantime.
#[derive(Debug, Clone, PartialEq)]
pub struct DueMessage {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub recipient_email: Option<String>,
    pub delivery_date: NaiveDateTime,
    pub is_delivered: bool,
}
