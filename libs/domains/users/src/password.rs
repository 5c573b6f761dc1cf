use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use core_config::AuthConfig;

use crate::error::{UserError, UserResult};

/// One-way adaptive password hashing.
///
/// Both operations are CPU-bound and deliberately slow; callers on an async
/// runtime should run them on a blocking thread.
pub trait PasswordHasher: Send + Sync + 'static {
    /// Hash `plaintext` with a fresh random salt
    fn hash(&self, plaintext: &str) -> UserResult<String>;

    /// Check `plaintext` against a stored hash. Malformed hashes never verify.
    fn verify(&self, hash: &str, plaintext: &str) -> bool;
}

/// Argon2id hasher producing PHC strings (`$argon2id$v=19$m=...`)
#[derive(Debug, Clone, Default)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    /// Build a hasher with an explicit work factor
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> UserResult<Self> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| UserError::PasswordHash(e.to_string()))?;

        Ok(Self { params })
    }

    pub fn from_config(config: &AuthConfig) -> UserResult<Self> {
        Self::new(
            config.argon2_memory_kib,
            config.argon2_iterations,
            config.argon2_parallelism,
        )
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> UserResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| UserError::PasswordHash(e.to_string()))
    }

    fn verify(&self, hash: &str, plaintext: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash is malformed");
                return false;
            }
        };

        // cost parameters are read from the PHC string, not from self.params
        self.argon2()
            .verify_password(plaintext.as_bytes(), &parsed_hash)
            .is_ok()
    }
}
