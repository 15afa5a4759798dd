//! Custom `validator` rules shared by request payloads.

use validator::ValidationError;

/// Indian mobile numbers: exactly 10 digits, first digit 6-9.
pub fn validate_mobile(mobile: &str) -> Result<(), ValidationError> {
    let mut chars = mobile.chars();
    let first_ok = matches!(chars.next(), Some('6'..='9'));
    if mobile.len() == 10 && first_ok && mobile.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("mobile")
            .with_message("mobile must be 10 digits starting with 6-9".into()))
    }
}

/// One-time passwords are exactly 6 digits.
pub fn validate_otp_code(code: &str) -> Result<(), ValidationError> {
    if code.len() == 6 && code.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("otp").with_message("otp must be 6 digits".into()))
    }
}

/// Admin passwords: at least 8 characters with one letter and one digit.
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if password.len() >= 8 && has_letter && has_digit {
        Ok(())
    } else {
        Err(ValidationError::new("password")
            .with_message("password must be 8+ characters with a letter and a digit".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mobile_rules() {
        assert!(validate_mobile("9876543210").is_ok());
        assert!(validate_mobile("5876543210").is_err());
        assert!(validate_mobile("98765").is_err());
        assert!(validate_mobile("98765432a0").is_err());
    }

    #[test]
    fn otp_rules() {
        assert!(validate_otp_code("123456").is_ok());
        assert!(validate_otp_code("12345").is_err());
        assert!(validate_otp_code("12345a").is_err());
    }

    #[test]
    fn password_rules() {
        assert!(validate_password_strength("abcdef12").is_ok());
        assert!(validate_password_strength("short1").is_err());
        assert!(validate_password_strength("allletters").is_err());
        assert!(validate_password_strength("12345678").is_err());
    }
}
