use async_trait::async_trait;
use database::{EntityKind, QueryError, QueryErrorKind, QueryResult};
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::User;

/// Lazy, finite, one-shot sequence of users
pub type UserStream = BoxStream<'static, QueryResult<User>>;

/// Repository trait for User persistence
///
/// Lookups fail with a not-found [`QueryError`] when nothing matches; every
/// other failure is systemic. Emails are expected to be normalized by the caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Get a user by ID
    async fn find(&self, id: Uuid) -> QueryResult<User>;

    /// Get a user by (normalized) email
    async fn find_by_email(&self, email: &str) -> QueryResult<User>;

    /// Stream every stored user
    async fn find_all(&self) -> QueryResult<UserStream>;

    /// Overwrite an existing user
    async fn update(&self, user: User) -> QueryResult<()>;

    /// Create a user, returning its identifier
    async fn store(&self, user: User) -> QueryResult<Uuid>;
}

const FIND_USER_BY_ID: &str = "find_user_by_id";
const FIND_USER_BY_EMAIL: &str = "find_user_by_email";
const UPDATE_USER: &str = "update_user";
const STORE_USER: &str = "store_user";

/// In-memory implementation of UserRepository (for development/testing)
///
/// Enforces the same unique-email constraint as the `users` table.
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

fn email_taken(users: &HashMap<Uuid, User>, email: &str, except: Option<Uuid>) -> bool {
    users
        .values()
        .any(|u| Some(u.id) != except && u.email.eq_ignore_ascii_case(email))
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find(&self, id: Uuid) -> QueryResult<User> {
        let users = self.users.read().await;
        users.get(&id).cloned().ok_or_else(|| {
            QueryError::not_found(FIND_USER_BY_ID, EntityKind::User, "no rows in result set")
        })
    }

    async fn find_by_email(&self, email: &str) -> QueryResult<User> {
        let users = self.users.read().await;
        users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned()
            .ok_or_else(|| {
                QueryError::not_found(FIND_USER_BY_EMAIL, EntityKind::User, "no rows in result set")
            })
    }

    async fn find_all(&self) -> QueryResult<UserStream> {
        let mut snapshot: Vec<User> = self.users.read().await.values().cloned().collect();
        snapshot.sort_by(|a, b| a.email.cmp(&b.email));

        Ok(stream::iter(snapshot.into_iter().map(Ok)).boxed())
    }

    async fn update(&self, user: User) -> QueryResult<()> {
        let mut users = self.users.write().await;

        if !users.contains_key(&user.id) {
            return Err(QueryError::new(
                UPDATE_USER,
                QueryErrorKind::UpdateFailed,
                "0 rows affected",
            ));
        }

        if email_taken(&users, &user.email, Some(user.id)) {
            return Err(QueryError::new(
                UPDATE_USER,
                QueryErrorKind::UniqueViolation,
                format!("email {} already exists", user.email),
            ));
        }

        tracing::info!(user_id = %user.id, "Updated user");
        users.insert(user.id, user);
        Ok(())
    }

    async fn store(&self, user: User) -> QueryResult<Uuid> {
        let mut users = self.users.write().await;

        if users.contains_key(&user.id) || email_taken(&users, &user.email, None) {
            return Err(QueryError::new(
                STORE_USER,
                QueryErrorKind::UniqueViolation,
                format!("user {} / {} already exists", user.id, user.email),
            ));
        }

        let id = user.id;
        users.insert(id, user);

        tracing::info!(user_id = %id, "Created user");
        Ok(id)
    }
}
