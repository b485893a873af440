use axum::{
    extract::State,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::user_dto::{PersonalityPayload, UpdateProfilePayload, UserResponse},
    error::{Error, Result},
    middleware::auth::Claims,
    AppState,
};

fn current_user_id(claims: &Claims) -> Result<Uuid> {
    Uuid::parse_str(&claims.sub)
        .map_err(|_| Error::Unauthorized("Token subject is not a valid user id".to_string()))
}

#[axum::debug_handler]
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let user = state.user_service.get(current_user_id(&claims)?).await?;
    Ok(Json(UserResponse::from(user)))
}

#[axum::debug_handler]
pub async fn update_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateProfilePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user = state
        .user_service
        .update_profile(current_user_id(&claims)?, payload)
        .await?;
    Ok(Json(UserResponse::from(user)))
}

#[axum::debug_handler]
pub async fn generate_personality(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<PersonalityPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user_id = current_user_id(&claims)?;
    let profile = state
        .ai_service
        .generate_personality_profile(&payload.writing_samples)
        .await?;
    let user = state
        .user_service
        .set_personality_profile(user_id, &payload.writing_samples, profile)
        .await?;
    Ok(Json(UserResponse::from(user)))
}
