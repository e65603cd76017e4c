use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use super::{AuthIdentity, Claims};
use crate::database::models::User;

/// The only accepted signing scheme; anything else in the header is rejected.
const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("JWT secret not configured")]
    InvalidSecret,

    #[error("JWT generation error: {0}")]
    Generation(jsonwebtoken::errors::Error),

    #[error("token has expired")]
    Expired,

    #[error("invalid token: {0}")]
    Invalid(jsonwebtoken::errors::Error),

    #[error("invalid subject claim '{0}'")]
    InvalidSubject(String),
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// HS256 signer/verifier holding the server secret.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl_hours: u64) -> Result<Self, TokenError> {
        if secret.trim().is_empty() {
            return Err(TokenError::InvalidSecret);
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours as i64),
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user: &User) -> Result<IssuedToken, TokenError> {
        let claims = Claims::new(user, self.ttl);
        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .unwrap_or_else(|| Utc::now() + self.ttl);

        let token = encode(&Header::new(ALGORITHM), &claims, &self.encoding)
            .map_err(TokenError::Generation)?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Checks signature, algorithm, expiry and claim shape.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(ALGORITHM);
        validation.set_required_spec_claims(&["exp", "sub"]);

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e),
            })
    }

    pub fn identity(&self, token: &str) -> Result<AuthIdentity, TokenError> {
        AuthIdentity::try_from(self.verify(token)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const SECRET: &str = "test-secret";

    fn user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "hash".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn sign(claims: &serde_json::Value, algorithm: Algorithm, secret: &str) -> String {
        encode(
            &Header::new(algorithm),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn rejects_empty_secret() {
        assert!(matches!(TokenIssuer::new("  ", 24), Err(TokenError::InvalidSecret)));
    }

    #[test]
    fn issued_token_carries_subject_and_day_long_expiry() {
        let issuer = TokenIssuer::new(SECRET, 24).unwrap();
        let user = user();
        let issued = issuer.issue(&user).unwrap();

        let claims = issuer.verify(&issued.token).unwrap();
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.email.as_deref(), Some("alice@example.com"));

        let expected = Utc::now().timestamp() + 24 * 3600;
        assert!((claims.exp - expected).abs() <= 5);
        assert_eq!(issued.expires_at.timestamp(), claims.exp);

        let identity = issuer.identity(&issued.token).unwrap();
        assert_eq!(identity.user_id, user.id);
    }

    #[test]
    fn rejects_expired_token() {
        let issuer = TokenIssuer::new(SECRET, 24).unwrap();
        let past = Utc::now().timestamp() - 3600;
        let token = sign(
            &serde_json::json!({ "sub": Uuid::new_v4().to_string(), "exp": past, "iat": past - 10 }),
            Algorithm::HS256,
            SECRET,
        );
        assert!(matches!(issuer.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn rejects_other_algorithms() {
        let issuer = TokenIssuer::new(SECRET, 24).unwrap();
        let exp = Utc::now().timestamp() + 3600;
        let token = sign(
            &serde_json::json!({ "sub": Uuid::new_v4().to_string(), "exp": exp, "iat": exp - 10 }),
            Algorithm::HS512,
            SECRET,
        );
        assert!(matches!(issuer.verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn rejects_foreign_secret() {
        let issuer = TokenIssuer::new(SECRET, 24).unwrap();
        let other = TokenIssuer::new("another-secret", 24).unwrap();
        let issued = other.issue(&user()).unwrap();
        assert!(matches!(issuer.verify(&issued.token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn rejects_unexpected_claim_shape() {
        let issuer = TokenIssuer::new(SECRET, 24).unwrap();
        let exp = Utc::now().timestamp() + 3600;

        let missing_sub = sign(&serde_json::json!({ "exp": exp, "iat": exp }), Algorithm::HS256, SECRET);
        assert!(matches!(issuer.verify(&missing_sub), Err(TokenError::Invalid(_))));

        let numeric_sub = sign(
            &serde_json::json!({ "sub": 7, "exp": exp, "iat": exp }),
            Algorithm::HS256,
            SECRET,
        );
        assert!(matches!(issuer.verify(&numeric_sub), Err(TokenError::Invalid(_))));

        let bad_uuid = sign(
            &serde_json::json!({ "sub": "not-a-uuid", "exp": exp, "iat": exp }),
            Algorithm::HS256,
            SECRET,
        );
        assert!(matches!(issuer.identity(&bad_uuid), Err(TokenError::InvalidSubject(_))));
    }

    #[test]
    fn rejects_garbage() {
        let issuer = TokenIssuer::new(SECRET, 24).unwrap();
        assert!(matches!(issuer.verify("not.a.jwt"), Err(TokenError::Invalid(_))));
    }
}
