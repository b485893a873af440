use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::auth_dto::RegisterPayload;
use crate::dto::user_dto::UpdateProfilePayload;
use crate::error::{Error, Result};
use crate::models::user::User;
use crate::utils::crypto;

#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn register(&self, payload: RegisterPayload) -> Result<User> {
        let existing: Option<Uuid> =
            sqlx::query_scalar(r#"SELECT id FROM users WHERE email = $1"#)
                .bind(&payload.email)
                .fetch_optional(&self.pool)
                .await?;
        if existing.is_some() {
            return Err(Error::Conflict(
                "A user with this email already exists".to_string(),
            ));
        }

        let hashed = crypto::hash_password(&payload.password)?;
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, hashed_password, full_name)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&payload.email)
        .bind(&hashed)
        .bind(&payload.full_name)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User> {
        let user = sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE email = $1"#)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        let Some(user) = user else {
            return Err(Error::Unauthorized("Invalid email or password".to_string()));
        };
        if !user.is_active {
            return Err(Error::Unauthorized("Account is deactivated".to_string()));
        }
        if !crypto::verify_password(password, &user.hashed_password)? {
            return Err(Error::Unauthorized("Invalid email or password".to_string()));
        }
        Ok(user)
    }

    pub async fn get(&self, id: Uuid) -> Result<User> {
        let user = sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        user.ok_or_else(|| Error::NotFound("User not found".to_string()))
    }

    pub async fn update_profile(&self, id: Uuid, payload: UpdateProfilePayload) -> Result<User> {
        let hashed = match payload.password.as_deref() {
            Some(plain) => Some(crypto::hash_password(plain)?),
            None => None,
        };

        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET full_name = COALESCE($2, full_name),
                hashed_password = COALESCE($3, hashed_password),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(payload.full_name.as_deref())
        .bind(hashed.as_deref())
        .fetch_optional(&self.pool)
        .await?;

        user.ok_or_else(|| Error::NotFound("User not found".to_string()))
    }

    pub async fn set_personality_profile(
        &self,
        id: Uuid,
        writing_samples: &[String],
        profile: JsonValue,
    ) -> Result<User> {
        let samples = serde_json::to_value(writing_samples)?;
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET personality_profile = $2,
                writing_samples = $3,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&profile)
        .bind(&samples)
        .fetch_optional(&self.pool)
        .await?;

        user.ok_or_else(|| Error::NotFound("User not found".to_string()))
    }
}
