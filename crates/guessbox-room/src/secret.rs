//! Room secrets: salted Argon2id hashes of room passwords.
//!
//! Hashing and verification are CPU-bound, so the async entry points
//! run them on Tokio's blocking pool.

use std::fmt;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};

use crate::{RoomError, SecretCost};

/// A room's shared secret, stored as an Argon2id PHC string.
///
/// The plaintext password is never kept. `Debug` prints a placeholder.
#[derive(Clone)]
pub struct RoomSecret {
    phc: String,
}

impl RoomSecret {
    /// Hashes `password` with a fresh random salt.
    pub fn hash(password: &str, cost: SecretCost) -> Result<Self, RoomError> {
        let params = Params::new(cost.memory_kib, cost.iterations, 1, None)
            .map_err(|e| RoomError::Secret(e.to_string()))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let salt = SaltString::generate(&mut OsRng);
        let phc = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| RoomError::Secret(e.to_string()))?
            .to_string();
        Ok(Self { phc })
    }

    /// Checks `password` against the stored hash.
    ///
    /// Cost parameters are read back from the PHC string, so a secret
    /// verifies the same way whatever cost the hub uses now. Digest
    /// comparison is constant-time.
    pub fn verify(&self, password: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(&self.phc) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    /// [`hash`](Self::hash) on the blocking pool.
    pub async fn hash_blocking(
        password: String,
        cost: SecretCost,
    ) -> Result<Self, RoomError> {
        tokio::task::spawn_blocking(move || Self::hash(&password, cost))
            .await
            .map_err(|e| RoomError::Secret(e.to_string()))?
    }

    /// [`verify`](Self::verify) on the blocking pool.
    pub async fn verify_blocking(
        &self,
        password: String,
    ) -> Result<bool, RoomError> {
        let secret = self.clone();
        tokio::task::spawn_blocking(move || secret.verify(&password))
            .await
            .map_err(|e| RoomError::Secret(e.to_string()))
    }

    /// The PHC string, e.g. `$argon2id$v=19$m=8,t=1,p=1$...`.
    pub fn as_phc(&self) -> &str {
        &self.phc
    }
}

impl fmt::Debug for RoomSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RoomSecret(..)")
    }
}
