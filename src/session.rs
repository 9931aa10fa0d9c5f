use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::User;

pub const SESSION_TTL_HOURS: i64 = 24;

/// Logged-in identity handed to every scoped operation.
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub id: String,
    pub user: User,
}

impl Session {
    pub fn user_id(&self) -> &str {
        &self.user.id
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    /// Session id; revoked on logout.
    pub sid: String,
    pub email: String,
    pub exp: i64,
    pub iat: i64,
}

/// HS256 signer/verifier for session tokens.
#[derive(Clone)]
pub struct TokenSigner {
    secret: String,
}

impl TokenSigner {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn issue(&self, session: &Session) -> AppResult<(String, DateTime<Utc>)> {
        let now = Utc::now();
        let exp = now + chrono::Duration::hours(SESSION_TTL_HOURS);
        let claims = Claims {
            sub: session.user.id.clone(),
            sid: session.id.clone(),
            email: session.user.email.clone(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("JWT error: {}", e)))?;
        Ok((token, exp))
    }

    /// Any decoding failure (bad signature, expiry, garbage) is `Unauthenticated`.
    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| AppError::Unauthenticated)
    }
}
