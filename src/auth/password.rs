use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString},
    Algorithm, Argon2, Params, Version,
};
use std::sync::Arc;
#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("invalid argon2 parameters: {0}")]
    InvalidParams(String),

    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// Argon2id hasher producing PHC strings. Hashing and verification run on the
/// blocking pool.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    /// Hash with the configured cost, verified against when no account matches.
    decoy: Arc<str>,
    #[cfg(test)]
    verifications: Arc<AtomicUsize>,
}

impl PasswordHasher {
    pub fn new(memory_kib: u32, iterations: u32) -> Result<Self, PasswordError> {
        let params = Params::new(memory_kib, iterations, 1, None)
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let decoy = hash_blocking(&argon2, "cards-api-decoy")?;

        Ok(Self {
            argon2,
            decoy: decoy.into(),
            #[cfg(test)]
            verifications: Arc::default(),
        })
    }

    pub async fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let argon2 = self.argon2.clone();
        let password = password.to_owned();

        tokio::task::spawn_blocking(move || hash_blocking(&argon2, &password))
            .await
            .map_err(|e| PasswordError::Hash(e.to_string()))?
    }

    /// False for a mismatch and for a stored value that is not a PHC string.
    pub async fn verify(&self, password: &str, stored: &str) -> bool {
        #[cfg(test)]
        self.verifications.fetch_add(1, Ordering::Relaxed);

        let argon2 = self.argon2.clone();
        let password = password.to_owned();
        let stored = stored.to_owned();

        match tokio::task::spawn_blocking(move || verify_blocking(&argon2, &password, &stored)).await {
            Ok(matched) => matched,
            Err(e) => {
                warn!("Password verification task failed: {}", e);
                false
            }
        }
    }

    /// Spend one verification's worth of work for a login with no matching
    /// account. Always false.
    pub async fn verify_missing(&self, password: &str) -> bool {
        let decoy = Arc::clone(&self.decoy);
        self.verify(password, &decoy).await;
        false
    }

    #[cfg(test)]
    pub(crate) fn verifications(&self) -> usize {
        self.verifications.load(Ordering::Relaxed)
    }
}

fn hash_blocking(argon2: &Argon2<'_>, password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

fn verify_blocking(argon2: &Argon2<'_>, password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => argon2.verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(_) => false,
    }
}
