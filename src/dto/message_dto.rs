use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::message::Message;

fn default_delivery_method() -> String {
    "email".to_string()
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateMessagePayload {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1))]
    pub content: String,
    pub media_urls: Option<Vec<String>>,
    /// RFC 3339 or `Y-m-d H:M:S`; stored as naive UTC.
    pub delivery_date: String,
    #[serde(default = "default_delivery_method")]
    pub delivery_method: String,
    #[validate(email)]
    pub recipient_email: Option<String>,
    pub recipient_phone: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub generation_settings: Option<JsonValue>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateMessagePayload {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub content: Option<String>,
    pub media_urls: Option<Vec<String>>,
    pub delivery_date: Option<String>,
    pub delivery_method: Option<String>,
    #[validate(email)]
    pub recipient_email: Option<String>,
    pub recipient_phone: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub generation_settings: Option<JsonValue>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub id: i64,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    #[schema(value_type = Option<Object>)]
    pub media_urls: Option<JsonValue>,
    pub delivery_date: NaiveDateTime,
    pub delivery_method: String,
    pub recipient_email: Option<String>,
    pub recipient_phone: Option<String>,
    pub is_delivered: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Message> for MessageResponse {
    fn from(m: Message) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            title: m.title,
            content: m.content,
            media_urls: m.media_urls,
            delivery_date: m.delivery_date,
            delivery_method: m.delivery_method,
            recipient_email: m.recipient_email,
            recipient_phone: m.recipient_phone,
            is_delivered: m.is_delivered,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub url: String,
}
