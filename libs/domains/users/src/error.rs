use database::{QueryError, QueryErrorKind};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Password must be between 8 and 256 characters")]
    InvalidPassword,

    #[error("User with email '{0}' already exists")]
    DuplicateEmail(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl UserError {
    /// True when the repository found no matching user
    pub fn is_not_found(&self) -> bool {
        matches!(self, UserError::Query(e) if e.is_not_found())
    }

    /// True for input problems the caller can fix
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            UserError::InvalidEmail | UserError::InvalidPassword | UserError::DuplicateEmail(_)
        )
    }

    /// Classification of a storage failure, if this is one
    pub fn query_kind(&self) -> Option<QueryErrorKind> {
        match self {
            UserError::Query(e) => Some(e.kind()),
            _ => None,
        }
    }
}

pub type UserResult<T> = Result<T, UserError>;
