use jsonwebtoken::{encode, EncodingKey, Header};

use crate::error::{Error, Result};
use crate::middleware::auth::Claims;

const ACCESS_TOKEN_TTL_SECS: i64 = 60 * 60 * 24 * 8;

pub fn create_access_token(secret: &[u8], user_id: &str, is_superuser: bool) -> Result<String> {
    let exp = (chrono::Utc::now().timestamp() + ACCESS_TOKEN_TTL_SECS) as usize;
    let claims = Claims {
        sub: user_id.to_string(),
        exp,
        role: if is_superuser {
            Some("admin".to_string())
        } else {
            None
        },
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| Error::Internal(format!("Failed to issue token: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

    #[test]
    fn issued_token_decodes_with_same_secret() {
        let token = create_access_token(b"test-secret", "user-123", true).unwrap();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        let data = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"test-secret"),
            &validation,
        )
        .unwrap();
        assert_eq!(data.claims.sub, "user-123");
        assert_eq!(data.claims.role.as_deref(), Some("admin"));
    }

    #[test]
    fn token_does_not_decode_with_wrong_secret() {
        let token = create_access_token(b"test-secret", "user-123", false).unwrap();
        let validation = Validation::new(Algorithm::HS256);
        assert!(decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"other-secret"),
            &validation
        )
        .is_err());
    }
}
