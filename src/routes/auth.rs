use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::{
    config::get_config,
    dto::auth_dto::{LoginPayload, RegisterPayload, TokenResponse},
    dto::user_dto::UserResponse,
    error::Result,
    utils::token::create_access_token,
    AppState,
};

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user = state.user_service.register(payload).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user = state
        .user_service
        .authenticate(&payload.email, &payload.password)
        .await?;
    let token = create_access_token(
        get_config().jwt_secret.as_bytes(),
        &user.id.to_string(),
        user.is_superuser,
    )?;
    Ok(Json(TokenResponse::bearer(token)))
}
