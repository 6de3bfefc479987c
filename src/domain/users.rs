use crate::domain::error::DomainError;

pub const MAX_USERNAME_CHARS: usize = 64;
pub const MIN_PASSWORD_CHARS: usize = 6;

/// Validate a username and return its trimmed form.
pub fn normalize_username(raw: &str) -> Result<String, DomainError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("Username is required"));
    }
    if trimmed.chars().count() > MAX_USERNAME_CHARS {
        return Err(DomainError::validation(format!(
            "Username must be at most {MAX_USERNAME_CHARS} characters"
        )));
    }
    if trimmed.chars().any(char::is_whitespace) {
        return Err(DomainError::validation(
            "Username must not contain whitespace",
        ));
    }
    Ok(trimmed.to_string())
}

pub fn validate_new_password(password: &str) -> Result<(), DomainError> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(DomainError::validation(format!(
            "New password must be at least {MIN_PASSWORD_CHARS} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usernames_are_trimmed() {
        assert_eq!(normalize_username("  alice ").expect("valid"), "alice");
    }

    #[test]
    fn usernames_reject_inner_whitespace_and_overlong_values() {
        assert!(normalize_username("alice smith").is_err());
        assert!(normalize_username(&"a".repeat(65)).is_err());
        assert!(normalize_username(&"a".repeat(64)).is_ok());
        assert!(normalize_username("   ").is_err());
    }

    #[test]
    fn passwords_need_six_characters() {
        assert!(validate_new_password("12345").is_err());
        assert!(validate_new_password("123456").is_ok());
    }
}
