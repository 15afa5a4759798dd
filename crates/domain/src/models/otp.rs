//! One-time passwords for student login and admin password reset.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// OTPs expire 5 minutes after issue.
pub const OTP_TTL_MINUTES: i64 = 5;
/// At most 5 OTPs may be issued per mobile within the rate-limit window.
pub const OTP_RATE_LIMIT: i64 = 5;
/// Rate-limit window width in minutes.
pub const OTP_RATE_WINDOW_MINUTES: i64 = 5;

#[derive(Debug, Clone)]
pub struct Otp {
    pub id: Uuid,
    pub mobile: String,
    pub code: String,
    pub purpose: OtpPurpose,
    pub consumed: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Otp {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    Login,
    PasswordReset,
}

impl OtpPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpPurpose::Login => "login",
            OtpPurpose::PasswordReset => "password_reset",
        }
    }
}

impl FromStr for OtpPurpose {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "login" => Ok(OtpPurpose::Login),
            "password_reset" => Ok(OtpPurpose::PasswordReset),
            _ => Err(format!("Invalid OTP purpose: {}", s)),
        }
    }
}

impl fmt::Display for OtpPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Generates a 6-digit numeric code. Leading zeros are preserved.
pub fn generate_otp_code() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{:06}", n)
}

/// Expiry timestamp for a code issued at `now`.
pub fn otp_expiry(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::minutes(OTP_TTL_MINUTES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_code_is_six_digits() {
        for _ in 0..100 {
            let code = generate_otp_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let now = Utc::now();
        let otp = Otp {
            id: Uuid::new_v4(),
            mobile: "9876543210".to_string(),
            code: "123456".to_string(),
            purpose: OtpPurpose::Login,
            consumed: false,
            expires_at: now,
            created_at: now - Duration::minutes(OTP_TTL_MINUTES),
        };
        // A code whose expiry equals "now" is already expired.
        assert!(otp.is_expired(now));
        assert!(!otp.is_expired(now - Duration::seconds(1)));
    }

    #[test]
    fn test_purpose_round_trip() {
        assert_eq!(
            OtpPurpose::from_str("password_reset").unwrap(),
            OtpPurpose::PasswordReset
        );
        assert!(OtpPurpose::from_str("other").is_err());
    }
}
