//! Input checks applied before anything is written.

use regex::Regex;
use std::sync::LazyLock;

pub const MAX_EMAIL_LEN: usize = 64;
pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 256;

// local@domain, with at least one dot in the domain and no label starting or
// ending with a hyphen
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$",
    )
    .unwrap()
});

/// `local@domain.tld` shape, at most 64 characters. No DNS lookups.
pub fn is_valid_email(email: &str) -> bool {
    email.chars().count() <= MAX_EMAIL_LEN && EMAIL.is_match(email)
}

/// Between 8 and 256 characters, inclusive.
pub fn is_valid_password(password: &str) -> bool {
    (MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&password.chars().count())
}
