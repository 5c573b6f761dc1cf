//! Users Domain
//!
//! Registration and credential checks for the task tracker's accounts.
//!
//! # Features
//!
//! - Email and password validation
//! - Duplicate registration checks (case-insensitive)
//! - Password hashing with Argon2id
//! - Credential verification
//! - Storage behind a repository trait, in memory or PostgreSQL
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │   Service   │  ← Validation, hashing, registration, login checks
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Data access (trait + in-memory / postgres)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← User, NewUser
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_users::{InMemoryUserRepository, NewUser, RegAuthService};
//!
//! # async fn run() -> domain_users::UserResult<()> {
//! let service = RegAuthService::new(InMemoryUserRepository::new());
//!
//! let id = service
//!     .register(NewUser::new("ankur@example.com", "correct horse"))
//!     .await?;
//!
//! let user = service
//!     .is_credential_valid("Ankur@Example.com", "correct horse")
//!     .await?;
//! assert_eq!(user.map(|u| u.id), Some(id));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod models;
pub mod password;
pub mod postgres;
pub mod repository;
pub mod service;
pub mod validation;

// Re-export commonly used types
pub use error::{UserError, UserResult};
pub use models::{normalize_email, NewUser, User};
pub use password::{Argon2Hasher, PasswordHasher};
pub use postgres::PostgresUserRepository;
pub use repository::{InMemoryUserRepository, UserRepository, UserStream};
pub use service::RegAuthService;
