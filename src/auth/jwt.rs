use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{ApiError, ApiResult};
use crate::models::Claims;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

pub const ERROR_TOKEN_INVALID: &str = "Not authorised - Token is invalid";
pub const ERROR_TOKEN_NOT_FOUND: &str = "Not authorised - Token not found";

fn now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize
}

/// Signs a short-lived bearer token for an authenticated user. The `jti`
/// makes every issued token distinct even within the same second.
pub fn issue_token(
    user_id: u64,
    email: &str,
    role: u8,
    secret: &str,
    ttl: usize,
) -> ApiResult<String> {
    let claims = Claims {
        user_id,
        sub: email.to_string(),
        role,
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::internal(format!("Failed to sign token: {e}")))
}

/// Decodes and validates a bearer token. Expiry is checked by the default
/// validation; any failure collapses into the same 401 so callers never
/// learn why a token was rejected.
pub fn verify_token(token: &str, secret: &str) -> ApiResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::unauthorized(ERROR_TOKEN_INVALID))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::ResponseError;
    use actix_web::http::StatusCode;

    const SECRET: &str = "test-secret";

    #[test]
    fn token_round_trip_preserves_the_claims() {
        let token = issue_token(7, "grace@example.com", 3, SECRET, 900).unwrap();
        let claims = verify_token(&token, SECRET).unwrap();

        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.sub, "grace@example.com");
        assert_eq!(claims.role, 3);
        assert!(!claims.jti.is_empty());
        assert!(claims.exp > now());
    }

    #[test]
    fn every_issued_token_is_distinct() {
        let a = issue_token(7, "grace@example.com", 3, SECRET, 900).unwrap();
        let b = issue_token(7, "grace@example.com", 3, SECRET, 900).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn wrong_secret_is_rejected_with_401() {
        let token = issue_token(7, "grace@example.com", 3, SECRET, 900).unwrap();
        let err = verify_token(&token, "other-secret").unwrap_err();

        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.public_message(), ERROR_TOKEN_INVALID);
    }

    #[test]
    fn tampered_tokens_are_rejected() {
        let token = issue_token(7, "grace@example.com", 3, SECRET, 900).unwrap();

        // Flip a character inside the payload segment.
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        let mut payload: Vec<char> = parts[1].chars().collect();
        let i = payload.len() / 2;
        payload[i] = if payload[i] == 'A' { 'B' } else { 'A' };
        parts[1] = payload.into_iter().collect();

        assert!(verify_token(&parts.join("."), SECRET).is_err());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        // Well past the default 60s leeway.
        let claims = Claims {
            user_id: 7,
            sub: "grace@example.com".to_string(),
            role: 3,
            exp: now() - 3600,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        let err = verify_token(&token, SECRET).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }
}
