use std::time::Duration;

use crate::{env_parse, ConfigError, FromEnv};

/// Settings for the registration and authentication service.
///
/// The argon2 defaults follow the OWASP minimum for argon2id
/// (19 MiB, 2 iterations, 1 lane).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthConfig {
    /// Argon2 memory cost in KiB
    pub argon2_memory_kib: u32,
    /// Argon2 time cost (number of passes)
    pub argon2_iterations: u32,
    /// Argon2 degree of parallelism
    pub argon2_parallelism: u32,
    /// Deadline applied to each repository call, `0` disables it
    pub operation_timeout_ms: u64,
}

impl AuthConfig {
    pub fn operation_timeout(&self) -> Option<Duration> {
        (self.operation_timeout_ms > 0).then(|| Duration::from_millis(self.operation_timeout_ms))
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            argon2_memory_kib: 19_456,
            argon2_iterations: 2,
            argon2_parallelism: 1,
            operation_timeout_ms: 0,
        }
    }
}

impl FromEnv for AuthConfig {
    /// Environment variables:
    /// - `AUTH_ARGON2_MEMORY_KIB` (default: 19456)
    /// - `AUTH_ARGON2_ITERATIONS` (default: 2)
    /// - `AUTH_ARGON2_PARALLELISM` (default: 1)
    /// - `AUTH_OPERATION_TIMEOUT_MS` (default: 0, no deadline)
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            argon2_memory_kib: env_parse("AUTH_ARGON2_MEMORY_KIB", "19456")?,
            argon2_iterations: env_parse("AUTH_ARGON2_ITERATIONS", "2")?,
            argon2_parallelism: env_parse("AUTH_ARGON2_PARALLELISM", "1")?,
            operation_timeout_ms: env_parse("AUTH_OPERATION_TIMEOUT_MS", "0")?,
        })
    }
}
