//! Storage-agnostic error types shared by every adapter

pub mod error;
pub mod query_error;

pub use error::{DatabaseError, DatabaseResult};
pub use query_error::{EntityKind, QueryError, QueryErrorKind, QueryResult};
