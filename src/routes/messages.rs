use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::get_config,
    dto::message_dto::{
        CreateMessagePayload, MessageResponse, UpdateMessagePayload, UploadResponse,
    },
    error::{Error, Result},
    middleware::auth::Claims,
    models::message::Message,
    services::email_service,
    AppState,
};

fn current_user_id(claims: &Claims) -> Result<Uuid> {
    Uuid::parse_str(&claims.sub)
        .map_err(|_| Error::Unauthorized("Token subject is not a valid user id".to_string()))
}

fn default_limit() -> i64 {
    100
}

#[derive(Debug, Deserialize)]
pub struct MessageListQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

/// Fire-and-forget "message scheduled" notice, sent when confirmations are
/// enabled and the message has a recipient.
fn notify_scheduled(state: &AppState, message: &Message) {
    if !get_config().send_confirmation_emails {
        return;
    }
    let Some(recipient) = message.recipient_email.clone() else {
        return;
    };
    let email = email_service::scheduled_email(&recipient, &message.title, message.delivery_date);
    let mailer = state.mailer.clone();
    let message_id = message.id;
    tokio::spawn(async move {
        if !mailer
            .send(&recipient, &email.subject, &email.text, &email.html)
            .await
        {
            tracing::warn!(message_id, "Scheduled-delivery notice could not be sent");
        }
    });
}

#[utoipa::path(
    get,
    path = "/api/messages",
    responses(
        (status = 200, description = "Messages owned by the current user", body = [MessageResponse])
    )
)]
#[axum::debug_handler]
pub async fn list_messages(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<MessageListQuery>,
) -> Result<impl IntoResponse> {
    let messages = state
        .message_service
        .list_for_user(current_user_id(&claims)?, query.skip, query.limit)
        .await?;
    let body: Vec<MessageResponse> = messages.into_iter().map(MessageResponse::from).collect();
    Ok(Json(body))
}

#[utoipa::path(
    post,
    path = "/api/messages",
    request_body = CreateMessagePayload,
    responses(
        (status = 201, description = "Message created", body = MessageResponse),
        (status = 400, description = "Invalid payload")
    )
)]
#[axum::debug_handler]
pub async fn create_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateMessagePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let message = state
        .message_service
        .create(current_user_id(&claims)?, payload)
        .await?;
    notify_scheduled(&state, &message);
    Ok((StatusCode::CREATED, Json(MessageResponse::from(message))))
}

#[utoipa::path(
    get,
    path = "/api/messages/{id}",
    params(("id" = i64, Path, description = "Message ID")),
    responses(
        (status = 200, description = "The message", body = MessageResponse),
        (status = 404, description = "Message not found")
    )
)]
#[axum::debug_handler]
pub async fn get_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let message = state
        .message_service
        .get_for_user(id, current_user_id(&claims)?)
        .await?;
    Ok(Json(MessageResponse::from(message)))
}

#[utoipa::path(
    put,
    path = "/api/messages/{id}",
    params(("id" = i64, Path, description = "Message ID")),
    request_body = UpdateMessagePayload,
    responses(
        (status = 200, description = "Message updated", body = MessageResponse),
        (status = 404, description = "Message not found")
    )
)]
#[axum::debug_handler]
pub async fn update_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateMessagePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let rescheduled = payload.delivery_date.is_some();
    let message = state
        .message_service
        .update_for_user(id, current_user_id(&claims)?, payload)
        .await?;
    if rescheduled {
        notify_scheduled(&state, &message);
    }
    Ok(Json(MessageResponse::from(message)))
}

#[utoipa::path(
    delete,
    path = "/api/messages/{id}",
    params(("id" = i64, Path, description = "Message ID")),
    responses(
        (status = 200, description = "Message deleted"),
        (status = 404, description = "Message not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state
        .message_service
        .delete_for_user(id, current_user_id(&claims)?)
        .await?;
    Ok(Json(serde_json::json!({ "status": "success" })))
}

fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[axum::debug_handler]
pub async fn upload_media(
    State(_state): State<AppState>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    current_user_id(&claims)?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let original = field.file_name().unwrap_or("upload.bin").to_string();
        let data = field.bytes().await?;

        let uploads_dir = &get_config().uploads_dir;
        tokio::fs::create_dir_all(uploads_dir).await?;
        let stored = format!("{}_{}", Uuid::new_v4(), sanitize_filename(&original));
        let path = std::path::Path::new(uploads_dir).join(&stored);
        tokio::fs::write(&path, &data).await?;

        return Ok((
            StatusCode::CREATED,
            Json(UploadResponse {
                url: format!("/uploads/{}", stored),
            }),
        ));
    }

    Err(Error::BadRequest(
        "Multipart upload must contain a 'file' field".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_filename_keeps_safe_chars() {
        assert_eq!(sanitize_filename("voice note (1).mp3"), "voice_note__1_.mp3");
        assert_eq!(sanitize_filename("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_filename("photo.jpg"), "photo.jpg");
    }
}
