//! Classified query failures
//!
//! Storage adapters never hand technology-specific errors to the domain layer.
//! Every failed query is wrapped into a [`QueryError`] that carries:
//!
//! - the logical query that ran,
//! - a [`QueryErrorKind`] from a closed taxonomy callers can match on,
//! - the original error message (and optionally the original error as `source`),
//! - the call site that produced the error.
//!
//! `{}` renders the compact form, `{:#}` adds the call site.
//!
//! ```
//! use database::{EntityKind, QueryError, QueryErrorKind};
//!
//! let err = QueryError::not_found("find_user_by_email", EntityKind::User, "no rows in result set");
//! assert!(err.is_not_found());
//! assert_eq!(err.kind(), QueryErrorKind::NotFound(EntityKind::User));
//! assert!(err.to_string().contains("no user found"));
//! ```

use std::error::Error as StdError;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// Entity a lookup was keyed on, used to qualify not-found results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    Todo,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::User => write!(f, "user"),
            EntityKind::Todo => write!(f, "todo"),
        }
    }
}

/// Classification of a failed query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryErrorKind {
    /// No row matched the lookup key
    NotFound(EntityKind),
    /// Insert reported success but affected no rows
    InsertFailed,
    /// Update affected no rows
    UpdateFailed,
    /// Delete affected no rows
    DeleteFailed,
    /// A cursor was read past its last row
    NoMoreRows,
    /// A unique constraint rejected the write
    UniqueViolation,
    /// Anything else: connectivity, pool exhaustion, other constraints, ...
    Systemic,
}

impl fmt::Display for QueryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryErrorKind::NotFound(entity) => write!(f, "no {} found", entity),
            QueryErrorKind::InsertFailed => write!(f, "insert command operation"),
            QueryErrorKind::UpdateFailed => write!(f, "update command operation"),
            QueryErrorKind::DeleteFailed => write!(f, "delete command operation"),
            QueryErrorKind::NoMoreRows => write!(f, "no more rows available"),
            QueryErrorKind::UniqueViolation => write!(f, "unique constraint violation"),
            QueryErrorKind::Systemic => write!(f, "storage failure"),
        }
    }
}

/// A failed query, classified and annotated
#[derive(Debug, Clone)]
pub struct QueryError {
    query: String,
    kind: QueryErrorKind,
    message: String,
    location: &'static Location<'static>,
    source: Option<Arc<dyn StdError + Send + Sync + 'static>>,
}

impl QueryError {
    /// Wrap a failure of `query`, recording the caller as provenance
    #[track_caller]
    pub fn new(query: impl Into<String>, kind: QueryErrorKind, message: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            kind,
            message: message.into(),
            location: Location::caller(),
            source: None,
        }
    }

    #[track_caller]
    pub fn not_found(query: impl Into<String>, entity: EntityKind, message: impl Into<String>) -> Self {
        Self::new(query, QueryErrorKind::NotFound(entity), message)
    }

    #[track_caller]
    pub fn systemic(query: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(query, QueryErrorKind::Systemic, message)
    }

    /// Attach the original error, exposed through [`StdError::source`]
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.source = Some(Arc::new(source));
        self
    }

    pub fn kind(&self) -> QueryErrorKind {
        self.kind
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// The underlying error message as reported by the storage driver
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, QueryErrorKind::NotFound(_))
    }

    pub fn is_unique_violation(&self) -> bool {
        self.kind == QueryErrorKind::UniqueViolation
    }

    pub fn is_systemic(&self) -> bool {
        self.kind == QueryErrorKind::Systemic
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "error executing query {:?}: [{}] - underlying error [{}]",
            self.query, self.kind, self.message
        )?;

        if f.alternate() {
            write!(
                f,
                "\n    at {}:{}:{}",
                self.location.file(),
                self.location.line(),
                self.location.column()
            )?;
        }

        Ok(())
    }
}

impl StdError for QueryError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

/// Result type alias for repository queries
pub type QueryResult<T> = Result<T, QueryError>;
