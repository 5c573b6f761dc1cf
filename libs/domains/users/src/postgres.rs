use async_trait::async_trait;
use database::postgres::{query_error, unique_query_error};
use database::{EntityKind, QueryError, QueryErrorKind, QueryResult};
use futures::StreamExt;
use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, FromQueryResult, Statement};
use uuid::Uuid;

use crate::models::User;
use crate::repository::{UserRepository, UserStream};

/// Unique constraint on `users.email`. Only its violations are reported as
/// duplicate registrations.
pub const USERS_EMAIL_KEY: &str = "users_email_key";

/// Table backing [`PostgresUserRepository`]. The unique index on `email`
/// settles concurrent registrations for the same address.
pub const USERS_SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id            UUID PRIMARY KEY,
        email         TEXT NOT NULL CONSTRAINT users_email_key UNIQUE,
        password_hash TEXT NOT NULL,
        first_name    TEXT NOT NULL DEFAULT '',
        last_name     TEXT NOT NULL DEFAULT '',
        username      TEXT NOT NULL DEFAULT ''
    )
"#;

const FIND_BY_ID_SQL: &str =
    "SELECT id, email, password_hash, first_name, last_name, username FROM users WHERE id = $1";

const FIND_BY_EMAIL_SQL: &str =
    "SELECT id, email, password_hash, first_name, last_name, username FROM users WHERE email = $1";

const FIND_ALL_SQL: &str =
    "SELECT id, email, password_hash, first_name, last_name, username FROM users ORDER BY email";

const UPDATE_SQL: &str = r#"
    UPDATE users
    SET email = $2, password_hash = $3, first_name = $4, last_name = $5, username = $6
    WHERE id = $1
"#;

const INSERT_SQL: &str = r#"
    INSERT INTO users (id, email, password_hash, first_name, last_name, username)
    VALUES ($1, $2, $3, $4, $5, $6)
"#;

/// PostgreSQL implementation of UserRepository using SeaORM
#[derive(Clone)]
pub struct PostgresUserRepository {
    db: DatabaseConnection,
}

impl PostgresUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create the `users` table if it does not exist yet
    pub async fn create_schema(&self) -> QueryResult<()> {
        self.db
            .execute_unprepared(USERS_SCHEMA)
            .await
            .map_err(|e| query_error(USERS_SCHEMA, EntityKind::User, e))?;

        Ok(())
    }

    async fn find_one(&self, sql: &'static str, value: sea_orm::Value) -> QueryResult<User> {
        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, sql, [value]);

        UserRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(|e| query_error(sql, EntityKind::User, e))?
            .map(User::from)
            .ok_or_else(|| QueryError::not_found(sql, EntityKind::User, "no rows in result set"))
    }
}

#[derive(Debug, FromQueryResult)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    username: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            first_name: row.first_name,
            last_name: row.last_name,
            username: row.username,
        }
    }
}

fn user_values(user: User) -> [sea_orm::Value; 6] {
    [
        user.id.into(),
        user.email.into(),
        user.password_hash.into(),
        user.first_name.into(),
        user.last_name.into(),
        user.username.into(),
    ]
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find(&self, id: Uuid) -> QueryResult<User> {
        self.find_one(FIND_BY_ID_SQL, id.into()).await
    }

    async fn find_by_email(&self, email: &str) -> QueryResult<User> {
        self.find_one(FIND_BY_EMAIL_SQL, email.into()).await
    }

    async fn find_all(&self) -> QueryResult<UserStream> {
        let db = self.db.clone();

        // rows are fetched as the caller polls; dropping the stream releases the cursor
        let users = async_stream::stream! {
            let stmt = Statement::from_string(DbBackend::Postgres, FIND_ALL_SQL);
            let mut rows = match UserRow::find_by_statement(stmt).stream(&db).await {
                Ok(rows) => rows,
                Err(e) => {
                    yield Err(query_error(FIND_ALL_SQL, EntityKind::User, e));
                    return;
                }
            };

            while let Some(row) = rows.next().await {
                yield row
                    .map(User::from)
                    .map_err(|e| query_error(FIND_ALL_SQL, EntityKind::User, e));
            }
        };

        Ok(users.boxed())
    }

    async fn update(&self, user: User) -> QueryResult<()> {
        let id = user.id;
        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, UPDATE_SQL, user_values(user));

        let result = self
            .db
            .execute_raw(stmt)
            .await
            .map_err(|e| unique_query_error(UPDATE_SQL, EntityKind::User, USERS_EMAIL_KEY, e))?;

        if result.rows_affected() == 0 {
            return Err(QueryError::new(
                UPDATE_SQL,
                QueryErrorKind::UpdateFailed,
                format!("no user with id {}", id),
            ));
        }

        tracing::info!(user_id = %id, "Updated user");
        Ok(())
    }

    async fn store(&self, user: User) -> QueryResult<Uuid> {
        let id = user.id;
        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, INSERT_SQL, user_values(user));

        let result = self
            .db
            .execute_raw(stmt)
            .await
            .map_err(|e| unique_query_error(INSERT_SQL, EntityKind::User, USERS_EMAIL_KEY, e))?;

        if result.rows_affected() == 0 {
            return Err(QueryError::new(
                INSERT_SQL,
                QueryErrorKind::InsertFailed,
                "0 rows affected",
            ));
        }

        tracing::info!(user_id = %id, "Created user");
        Ok(id)
    }
}
