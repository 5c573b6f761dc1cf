use core_config::AuthConfig;
use database::QueryResult;
use futures::TryStreamExt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::{UserError, UserResult};
use crate::models::{normalize_email, NewUser, User};
use crate::password::{Argon2Hasher, PasswordHasher};
use crate::repository::UserRepository;
use crate::validation;

/// Registration and authentication.
///
/// Holds no mutable state of its own, so clones can be shared freely across
/// request handlers. Uniqueness of emails under concurrent registration is
/// ultimately enforced by the repository's unique constraint, which this
/// service reports as [`UserError::DuplicateEmail`].
pub struct RegAuthService<R: UserRepository, H: PasswordHasher = Argon2Hasher> {
    repository: Arc<R>,
    hasher: Arc<H>,
    operation_timeout: Option<Duration>,
}

impl<R: UserRepository, H: PasswordHasher> Clone for RegAuthService<R, H> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            hasher: Arc::clone(&self.hasher),
            operation_timeout: self.operation_timeout,
        }
    }
}

impl<R: UserRepository> RegAuthService<R> {
    /// Service with the default argon2id work factor and no deadline
    pub fn new(repository: R) -> Self {
        Self::with_hasher(repository, Argon2Hasher::default())
    }

    pub fn from_config(repository: R, config: &AuthConfig) -> UserResult<Self> {
        let hasher = Argon2Hasher::from_config(config)?;
        Ok(Self::with_hasher(repository, hasher).with_operation_timeout(config.operation_timeout()))
    }
}

impl<R: UserRepository, H: PasswordHasher> RegAuthService<R, H> {
    pub fn with_hasher(repository: R, hasher: H) -> Self {
        Self {
            repository: Arc::new(repository),
            hasher: Arc::new(hasher),
            operation_timeout: None,
        }
    }

    /// Bound every repository call; `None` waits indefinitely
    pub fn with_operation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.operation_timeout = timeout;
        self
    }

    pub fn validate_email(&self, email: &str) -> bool {
        validation::is_valid_email(email)
    }

    pub fn validate_password(&self, password: &str) -> bool {
        validation::is_valid_password(password)
    }

    /// Whether an account already exists for `email` (case-insensitive)
    #[instrument(skip(self))]
    pub async fn is_duplicate_registration(&self, email: &str) -> UserResult<bool> {
        let email = normalize_email(email);

        match self.bounded(self.repository.find_by_email(&email)).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Check a login attempt.
    ///
    /// - `Ok(Some(user))` when the password matches
    /// - `Ok(None)` when it does not
    /// - `Err(e)` with `e.is_not_found()` when no such account exists
    ///
    /// A hash of the same cost is computed for unknown accounts so both
    /// negative outcomes take comparable time.
    #[instrument(skip(self, password))]
    pub async fn is_credential_valid(&self, email: &str, password: &str) -> UserResult<Option<User>> {
        let email = normalize_email(email);
        let password = password.to_owned();

        let user = match self.bounded(self.repository.find_by_email(&email)).await {
            Ok(user) => user,
            Err(e) if e.is_not_found() => {
                // dummy hash so unknown accounts cost the same as a mismatch
                self.blocking(move |hasher| {
                    let _dummy = hasher.hash(&password);
                })
                .await?;
                debug!("Login attempt for unknown account");
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        let hash = user.password_hash.clone();
        let matches = self
            .blocking(move |hasher| hasher.verify(&hash, &password))
            .await?;

        if matches {
            Ok(Some(user))
        } else {
            debug!(user_id = %user.id, "Password mismatch");
            Ok(None)
        }
    }

    /// Normalize, validate, hash and persist a new user.
    ///
    /// Does not look for an existing account first; see [`Self::register`].
    #[instrument(skip(self, new_user), fields(email = %new_user.email))]
    pub async fn store_user(&self, mut new_user: NewUser) -> UserResult<Uuid> {
        new_user.email = normalize_email(&new_user.email);
        self.check_input(&new_user)?;

        let password = std::mem::take(&mut new_user.password);
        let password_hash = self
            .blocking(move |hasher| hasher.hash(&password))
            .await??;

        let user = new_user.into_user(Uuid::new_v4(), password_hash);
        let email = user.email.clone();

        match self.bounded(self.repository.store(user)).await {
            Ok(id) => {
                info!(user_id = %id, "Stored new user");
                Ok(id)
            }
            Err(UserError::Query(e)) if e.is_unique_violation() => {
                Err(UserError::DuplicateEmail(email))
            }
            Err(e) => {
                warn!(error = %e, "Failed to store user");
                Err(e)
            }
        }
    }

    /// Validate, reject known emails, then store.
    #[instrument(skip(self, new_user), fields(email = %new_user.email))]
    pub async fn register(&self, mut new_user: NewUser) -> UserResult<Uuid> {
        new_user.email = normalize_email(&new_user.email);
        self.check_input(&new_user)?;

        if self.is_duplicate_registration(&new_user.email).await? {
            return Err(UserError::DuplicateEmail(new_user.email));
        }

        self.store_user(new_user).await
    }

    /// Get a user by ID
    #[instrument(skip(self))]
    pub async fn get_user(&self, id: Uuid) -> UserResult<User> {
        self.bounded(self.repository.find(id)).await
    }

    /// Collect every stored user
    pub async fn list_users(&self) -> UserResult<Vec<User>> {
        self.bounded(async {
            let users = self.repository.find_all().await?;
            users.try_collect().await
        })
        .await
    }

    /// Persist changes to an existing user. The password hash is stored as is.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn update_user(&self, mut user: User) -> UserResult<()> {
        user.email = normalize_email(&user.email);
        if !self.validate_email(&user.email) {
            return Err(UserError::InvalidEmail);
        }

        let email = user.email.clone();
        match self.bounded(self.repository.update(user)).await {
            Err(UserError::Query(e)) if e.is_unique_violation() => {
                Err(UserError::DuplicateEmail(email))
            }
            other => other,
        }
    }

    fn check_input(&self, new_user: &NewUser) -> UserResult<()> {
        if !self.validate_email(&new_user.email) {
            return Err(UserError::InvalidEmail);
        }
        if !self.validate_password(&new_user.password) {
            return Err(UserError::InvalidPassword);
        }
        Ok(())
    }

    async fn bounded<T, F>(&self, query: F) -> UserResult<T>
    where
        F: Future<Output = QueryResult<T>>,
    {
        match self.operation_timeout {
            Some(limit) => tokio::time::timeout(limit, query)
                .await
                .map_err(|_| UserError::Timeout(limit))?
                .map_err(UserError::from),
            None => query.await.map_err(UserError::from),
        }
    }

    /// Run hashing work off the async executor
    async fn blocking<T, F>(&self, work: F) -> UserResult<T>
    where
        F: FnOnce(&H) -> T + Send + 'static,
        T: Send + 'static,
    {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || work(&hasher))
            .await
            .map_err(|e| UserError::Internal(format!("password hashing task failed: {}", e)))
    }
}
