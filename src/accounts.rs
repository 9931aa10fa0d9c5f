use std::collections::HashMap;
use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Role, User, UserRecord};
use crate::session::{Session, TokenSigner};
use crate::storage::UserStore;

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub session: Session,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Registration, login and session lifecycle.
///
/// Active session ids live in memory; restarting the process logs everyone out.
pub struct AccountService {
    users: Arc<dyn UserStore>,
    signer: TokenSigner,
    sessions: RwLock<HashMap<String, String>>,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl AccountService {
    pub fn new(users: Arc<dyn UserStore>, signer: TokenSigner) -> Self {
        Self {
            users,
            signer,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> AppResult<User> {
        let name = name.trim();
        let email = normalize_email(email);
        if name.is_empty() {
            return Err(AppError::InvalidInput("name is required".to_string()));
        }
        if !email.contains('@') {
            return Err(AppError::InvalidInput("a valid email is required".to_string()));
        }
        if password.is_empty() {
            return Err(AppError::InvalidInput("password is required".to_string()));
        }
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::DuplicateEmail);
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?
            .to_string();

        let user = User {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            email,
            role: Role::Consumer,
            location: None,
            created_at: Utc::now(),
        };
        self.users
            .insert(UserRecord {
                user: user.clone(),
                password_hash,
            })
            .await?;

        tracing::info!("Registered user {}", user.id);
        Ok(user)
    }

    /// Unknown email and wrong password fail identically.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<LoginOutcome> {
        let record = self
            .users
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let parsed_hash = PasswordHash::new(&record.password_hash)
            .map_err(|_| AppError::Internal("Invalid password hash in store".to_string()))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| AppError::InvalidCredentials)?;

        let session = Session {
            id: Uuid::new_v4().to_string(),
            user: record.user,
        };
        let (token, expires_at) = self.signer.issue(&session)?;
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session.user.id.clone());

        tracing::info!("User {} logged in", session.user.id);
        Ok(LoginOutcome {
            session,
            token,
            expires_at,
        })
    }

    /// Resolves a bearer token to its live session.
    pub async fn current_user(&self, token: &str) -> AppResult<Session> {
        let claims = self.signer.verify(token)?;
        let active = self
            .sessions
            .read()
            .await
            .get(&claims.sid)
            .is_some_and(|user_id| *user_id == claims.sub);
        if !active {
            return Err(AppError::Unauthenticated);
        }
        let record = self
            .users
            .find_by_id(&claims.sub)
            .await?
            .ok_or(AppError::Unauthenticated)?;
        Ok(Session {
            id: claims.sid,
            user: record.user,
        })
    }

    /// Revokes the session. Repeated calls are a no-op.
    pub async fn logout(&self, session: &Session) {
        if self.sessions.write().await.remove(&session.id).is_some() {
            tracing::info!("User {} logged out", session.user.id);
        }
    }
}
