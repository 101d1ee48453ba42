//! Account field validation.

use validator::ValidateEmail;

/// Minimum password length for new accounts.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Normalize an email for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_email(email: &str) -> Result<(), String> {
    let normalized = normalize_email(email);
    if normalized.is_empty() {
        return Err("Email can't be blank".into());
    }
    if !normalized.validate_email() {
        return Err(format!("Email '{email}' is invalid"));
    }
    Ok(())
}

/// Passwords need a minimum length plus an uppercase letter, a lowercase
/// letter, and a digit.
pub fn validate_password_complexity(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
        ));
    }
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !(has_upper && has_lower && has_digit) {
        return Err(
            "Password must include at least one uppercase letter, one lowercase letter, and one digit"
                .into(),
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email("  Mod@Example.COM "), "mod@example.com");
    }

    #[test]
    fn email_validation() {
        assert!(validate_email("mod@example.com").is_ok());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("").is_err());
    }

    #[test]
    fn password_complexity() {
        assert!(validate_password_complexity("Passw0rd").is_ok());
        assert!(validate_password_complexity("short1A").is_err());
        assert!(validate_password_complexity("alllowercase1").is_err());
        assert!(validate_password_complexity("NoDigitsHere").is_err());
    }
}
