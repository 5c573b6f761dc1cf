use sea_orm::{DbErr, SqlErr};

use crate::common::{EntityKind, QueryError, QueryErrorKind};

/// Map a SeaORM error onto the query error taxonomy
///
/// Only "no record" and unique-constraint failures are reinterpreted;
/// everything else is opaque and systemic.
pub fn classify(err: &DbErr, entity: EntityKind) -> QueryErrorKind {
    if let DbErr::RecordNotFound(_) = err {
        return QueryErrorKind::NotFound(entity);
    }

    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => QueryErrorKind::UniqueViolation,
        _ => QueryErrorKind::Systemic,
    }
}

/// Like [`classify`], but only a violation of the named unique `constraint`
/// counts as `UniqueViolation`. Any other key collision is systemic.
pub fn classify_unique(err: &DbErr, entity: EntityKind, constraint: &str) -> QueryErrorKind {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(message)) if names_constraint(&message, constraint) => {
            QueryErrorKind::UniqueViolation
        }
        _ => match classify(err, entity) {
            QueryErrorKind::UniqueViolation => QueryErrorKind::Systemic,
            kind => kind,
        },
    }
}

// postgres quotes the constraint name: `violates unique constraint "users_email_key"`
fn names_constraint(message: &str, constraint: &str) -> bool {
    message.contains(&format!("\"{}\"", constraint))
}

/// Wrap a SeaORM error raised by `query`, keeping the original as `source`
#[track_caller]
pub fn query_error(query: &str, entity: EntityKind, err: DbErr) -> QueryError {
    let kind = classify(&err, entity);
    QueryError::new(query, kind, err.to_string()).with_source(err)
}

/// [`query_error`] for writes guarded by a single expected unique constraint
#[track_caller]
pub fn unique_query_error(query: &str, entity: EntityKind, constraint: &str, err: DbErr) -> QueryError {
    let kind = classify_unique(&err, entity, constraint);
    QueryError::new(query, kind, err.to_string()).with_source(err)
}
