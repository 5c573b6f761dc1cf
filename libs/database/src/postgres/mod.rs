//! PostgreSQL connection and error translation helpers

mod connector;
mod errors;

pub use connector::connect;
#[cfg(feature = "config")]
pub use connector::{connect_from_config, connect_from_env};
pub use errors::{classify, classify_unique, query_error, unique_query_error};

// Re-export SeaORM types for convenience
pub use sea_orm::{DatabaseConnection, DbErr};
