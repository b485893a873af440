use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use subtle::ConstantTimeEq;
use validator::Validate;

use crate::{
    config::get_config,
    error::{Error, Result},
    services::email_service,
    AppState,
};

fn verify_admin_key(headers: &HeaderMap) -> Result<()> {
    let provided = headers
        .get("x-admin-key")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| Error::Unauthorized("Missing admin key".to_string()))?;
    let expected = &get_config().admin_api_key;

    let matches: bool = provided.as_bytes().ct_eq(expected.as_bytes()).into();
    if !matches {
        return Err(Error::Unauthorized("Invalid admin key".to_string()));
    }
    Ok(())
}

/// Run one synchronous delivery cycle, outside the scheduler's cadence.
/// Used to push overdue messages out without waiting for the next tick.
#[axum::debug_handler]
pub async fn deliver_pending(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    verify_admin_key(&headers)?;
    let outcome = state.delivery_service.run_cycle().await?;
    tracing::info!(
        eligible = outcome.eligible,
        delivered = outcome.delivered,
        failed = outcome.failed,
        "Manual delivery cycle complete"
    );
    Ok(Json(outcome))
}

#[derive(Debug, Deserialize, Validate)]
pub struct TestEmailPayload {
    #[validate(email)]
    pub email_to: String,
}

#[axum::debug_handler]
pub async fn send_test_email(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<TestEmailPayload>,
) -> Result<impl IntoResponse> {
    verify_admin_key(&headers)?;
    payload.validate()?;

    let email = email_service::test_email();
    let sent = state
        .mailer
        .send(&payload.email_to, &email.subject, &email.text, &email.html)
        .await;
    if !sent {
        return Err(Error::Internal("Failed to send test email".to_string()));
    }
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "message": "Test email sent successfully" })),
    ))
}
