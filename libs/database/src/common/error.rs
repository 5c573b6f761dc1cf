/// Error raised while establishing a database connection
///
/// Query-level failures use [`QueryError`](super::QueryError) instead.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// PostgreSQL-specific errors (SeaORM)
    #[cfg(feature = "postgres")]
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sea_orm::DbErr),

    /// Configuration error
    #[cfg(feature = "config")]
    #[error("Configuration error: {0}")]
    Config(#[from] core_config::ConfigError),

    /// Connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
}

/// Result type alias for connection management
pub type DatabaseResult<T> = Result<T, DatabaseError>;
