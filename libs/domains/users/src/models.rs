use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// User entity - matches the `users` table
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier, assigned once when the user is first stored
    pub id: Uuid,
    /// Login handle, always stored lower-cased (unique)
    pub email: String,
    /// Argon2 password hash (never exposed in API responses)
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    /// Display handle, not used for lookup
    pub username: String,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("username", &self.username)
            .finish()
    }
}

/// A user that has not been stored yet: no identifier, plaintext password
#[derive(Clone, Default, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub username: String,
}

impl NewUser {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = first_name.into();
        self.last_name = last_name.into();
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    /// Complete the record: the caller supplies the id and the password hash,
    /// the plaintext password is dropped here
    pub(crate) fn into_user(self, id: Uuid, password_hash: String) -> User {
        User {
            id,
            email: self.email,
            password_hash,
            first_name: self.first_name,
            last_name: self.last_name,
            username: self.username,
        }
    }
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("username", &self.username)
            .finish()
    }
}

/// Lower-case an email for comparison and storage
pub fn normalize_email(email: &str) -> String {
    email.to_lowercase()
}
