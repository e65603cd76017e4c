pub mod password;
pub mod token;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::models::User;

pub use password::{PasswordError, PasswordHasher};
pub use token::{IssuedToken, TokenError, TokenIssuer};

/// JWT payload. `sub` carries the user id as a string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl Claims {
    pub fn new(user: &User, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: user.id.to_string(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            email: Some(user.email.clone()),
            role: None,
        }
    }
}

/// Caller identity established from a verified token, lives for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthIdentity {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub role: Option<String>,
}

impl TryFrom<Claims> for AuthIdentity {
    type Error = TokenError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let user_id = Uuid::parse_str(claims.sub.trim())
            .map_err(|_| TokenError::InvalidSubject(claims.sub.clone()))?;

        Ok(Self {
            user_id,
            email: claims.email,
            role: claims.role,
        })
    }
}
