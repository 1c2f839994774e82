use crate::error::ApiError;

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Username format rules applied at registration.
pub fn validate_username(username: &str) -> Result<(), ApiError> {
    if username.len() < 3 {
        return Err(ApiError::bad_request("Username must be at least 3 characters"));
    }
    if username.len() > 50 {
        return Err(ApiError::bad_request("Username must be less than 50 characters"));
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ApiError::bad_request(
            "Username can only contain letters, numbers, underscore, and hyphen",
        ));
    }
    // length checked above, so a first char exists
    if !username.chars().next().is_some_and(|c| c.is_alphanumeric()) {
        return Err(ApiError::bad_request("Username must start with a letter or number"));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST).map_err(|e| {
        tracing::error!("password hashing failed: {}", e);
        ApiError::internal_server_error("An error occurred while processing your request")
    })
}

/// A hash that fails to parse counts as a non-match, not a server fault.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_reasonable_usernames() {
        for name in ["demo", "user_1", "a-b-c", "3rdAccount"] {
            assert!(validate_username(name).is_ok(), "rejected {}", name);
        }
    }

    #[test]
    fn rejects_bad_usernames() {
        for name in ["", "ab", "_leading", "-dash", "has space", "emoji🦀"] {
            assert!(validate_username(name).is_err(), "accepted {:?}", name);
        }
    }

    #[test]
    fn hash_and_verify_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
    }

    #[test]
    fn unparseable_hash_is_a_non_match() {
        assert!(!verify_password("anything", "not-a-bcrypt-hash"));
    }
}
