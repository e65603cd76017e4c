use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{AuthIdentity, PasswordError, PasswordHasher, TokenError, TokenIssuer};
use crate::database::models::{NewUser, PublicUser, User};
use crate::database::{CredentialStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("email already registered")]
    DuplicateEmail,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("token error: {0}")]
    Token(TokenError),

    #[error("password error: {0}")]
    Password(#[from] PasswordError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: PublicUser,
}

pub struct AuthService {
    users: Arc<dyn CredentialStore>,
    tokens: TokenIssuer,
    hasher: PasswordHasher,
}

impl AuthService {
    pub fn new(users: Arc<dyn CredentialStore>, tokens: TokenIssuer, hasher: PasswordHasher) -> Self {
        Self {
            users,
            tokens,
            hasher,
        }
    }

    /// Create an account. The email is checked before hashing so a duplicate
    /// never reaches the store, and a racing insert is caught by its unique key.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<User, AuthError> {
        let name = require("name", name)?;
        let email = require("email", email)?;
        if password.is_empty() {
            return Err(AuthError::InvalidInput("password is required".to_string()));
        }

        if self.users.find_by_email(email).await?.is_some() {
            warn!("Registration rejected, email already registered");
            return Err(AuthError::DuplicateEmail);
        }

        let password_hash = self.hasher.hash(password).await?;
        let user = self
            .users
            .create(NewUser {
                name: name.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await
            .map_err(|e| match e {
                StoreError::UniqueViolation(_) => AuthError::DuplicateEmail,
                other => AuthError::Store(other),
            })?;

        info!("Registered user {}", user.id);
        Ok(user)
    }

    /// Unknown email and wrong password are indistinguishable to the caller,
    /// in both the error returned and the Argon2 work spent.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, AuthError> {
        let email = email.trim();
        let Some(user) = self.users.find_by_email(email).await? else {
            self.hasher.verify_missing(password).await;
            warn!("Login rejected for unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !self.hasher.verify(password, &user.password_hash).await {
            warn!("Login rejected for user {}: wrong password", user.id);
            return Err(AuthError::InvalidCredentials);
        }

        let issued = self.tokens.issue(&user).map_err(AuthError::Token)?;
        info!("User {} logged in", user.id);

        Ok(LoginResponse {
            token: issued.token,
            expires_at: issued.expires_at,
            user: PublicUser::from(user),
        })
    }

    pub fn verify_token(&self, token: &str) -> Result<AuthIdentity, AuthError> {
        self.tokens
            .identity(token)
            .map_err(|e| AuthError::Unauthorized(e.to_string()))
    }

    /// Token to live account; backs `GET /auth/me`.
    pub async fn resolve_identity(&self, token: &str) -> Result<User, AuthError> {
        let identity = self.verify_token(token)?;
        self.current_user(&identity).await
    }

    pub async fn current_user(&self, identity: &AuthIdentity) -> Result<User, AuthError> {
        self.users
            .find_by_id(identity.user_id)
            .await?
            .ok_or_else(|| AuthError::Unauthorized("user no longer exists".to_string()))
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        if new_password.is_empty() {
            return Err(AuthError::InvalidInput("new password is required".to_string()));
        }

        let mut user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AuthError::Unauthorized("user no longer exists".to_string()))?;

        if !self.hasher.verify(current_password, &user.password_hash).await {
            warn!("Password change rejected for user {}", user_id);
            return Err(AuthError::InvalidCredentials);
        }

        user.password_hash = self.hasher.hash(new_password).await?;
        self.users.update(&user).await?;

        info!("Password changed for user {}", user_id);
        Ok(())
    }
}

fn require<'a>(field: &str, value: &'a str) -> Result<&'a str, AuthError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AuthError::InvalidInput(format!("{field} is required")));
    }
    Ok(trimmed)
}
