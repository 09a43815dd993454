use crate::error::IdentityError;

/// Longest accepted username, in bytes.
pub const MAX_USERNAME_LEN: usize = 64;

/// Object-store key of a user's enrollment sample.
pub fn sample_key(username: &str) -> String {
    format!("{username}.wav")
}

/// Object-store key of a user's profile.
pub fn profile_key(username: &str) -> String {
    format!("{username}.json")
}

/// Checks that `username` is usable as an identity and as an object key.
///
/// Usernames are case-sensitive and are not trimmed.
pub fn validate_username(username: &str) -> Result<(), IdentityError> {
    let reason = if username.is_empty() {
        "empty"
    } else if username.len() > MAX_USERNAME_LEN {
        "longer than 64 bytes"
    } else if username.starts_with('.') {
        "starts with '.'"
    } else if username.contains(['/', '\\', '\0']) {
        "contains a path separator or NUL"
    } else if username.chars().any(char::is_control) {
        "contains a control character"
    } else {
        return Ok(());
    };
    Err(IdentityError::InvalidUsername {
        username: username.to_string(),
        reason,
    })
}
