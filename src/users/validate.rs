use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ApiError;
use crate::users::repo_types::NewUser;

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Optional international-like number: leading + allowed, 10-15 digits,
/// first digit 1-9.
pub fn is_valid_phone(phone: &str) -> bool {
    lazy_static! {
        static ref PHONE_RE: Regex = Regex::new(r"^\+?[1-9]\d{9,14}$").unwrap();
    }
    PHONE_RE.is_match(phone)
}

pub fn validate_name(name: &str) -> Result<(), ApiError> {
    let trimmed = name.trim();
    if trimmed.chars().count() < 2 {
        return Err(ApiError::Validation(
            "Name must be at least 2 characters long".into(),
        ));
    }
    if trimmed.chars().count() > 50 {
        return Err(ApiError::Validation(
            "Name must be less than 50 characters".into(),
        ));
    }
    Ok(())
}

pub fn validate_password_pair(password: &str, password_confirm: &str) -> Result<(), ApiError> {
    if password.len() < 8 {
        return Err(ApiError::Validation(
            "Password must be at least 8 characters long".into(),
        ));
    }
    if password != password_confirm {
        return Err(ApiError::Validation("Passwords are not the same!".into()));
    }
    Ok(())
}

/// Cross-field write invariant for new records: every account carries a
/// password hash or at least one provider id.
pub fn validate_new_user(new_user: &NewUser) -> Result<(), ApiError> {
    validate_name(&new_user.name)?;
    if !is_valid_email(&new_user.email) {
        return Err(ApiError::Validation("Please provide a valid email".into()));
    }
    if let Some(phone) = new_user.phone.as_deref() {
        if !phone.is_empty() && !is_valid_phone(phone) {
            return Err(ApiError::Validation(format!(
                "{phone} is not a valid phone number!"
            )));
        }
    }
    if new_user.password_hash.is_none() && !new_user.has_provider_id() {
        return Err(ApiError::Validation(
            "Password is required for non-OAuth users".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_new_user() -> NewUser {
        NewUser {
            name: "Ann".into(),
            email: "a@x.com".into(),
            password_hash: Some("$argon2id$fake".into()),
            ..Default::default()
        }
    }

    #[test]
    fn accepts_plain_emails() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last@sub.example.co"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("spaces in@x.com"));
        assert!(!is_valid_email("a@nodot"));
    }

    #[test]
    fn phone_boundaries() {
        assert!(!is_valid_phone("12345"));
        assert!(is_valid_phone("1234567890"));
        assert!(is_valid_phone("123456789012345")); // 15 digits, leading 1
        assert!(!is_valid_phone("1234567890123456")); // 16 digits
        assert!(is_valid_phone("+919876543210"));
        assert!(!is_valid_phone("0123456789")); // leading zero
    }

    #[test]
    fn absent_phone_is_valid() {
        let mut new_user = local_new_user();
        new_user.phone = None;
        assert!(validate_new_user(&new_user).is_ok());
        new_user.phone = Some(String::new());
        assert!(validate_new_user(&new_user).is_ok());
    }

    #[test]
    fn name_bounds() {
        assert!(validate_name("Jo").is_ok());
        assert!(validate_name("A").is_err());
        assert!(validate_name(&"x".repeat(50)).is_ok());
        assert!(validate_name(&"x".repeat(51)).is_err());
        assert!(validate_name("   A   ").is_err()); // trimmed to 1 char
    }

    #[test]
    fn password_pair_rules() {
        assert!(validate_password_pair("12345678", "12345678").is_ok());
        assert!(validate_password_pair("1234567", "1234567").is_err());
        assert!(validate_password_pair("12345678", "12345679").is_err());
    }

    #[test]
    fn account_needs_password_or_provider() {
        let mut new_user = local_new_user();
        new_user.password_hash = None;
        assert!(validate_new_user(&new_user).is_err());
        new_user.twitter_id = Some("t-123".into());
        assert!(validate_new_user(&new_user).is_ok());
    }
}
