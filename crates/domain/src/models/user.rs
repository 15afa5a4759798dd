//! User account and authentication domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use shared::validation::{validate_mobile, validate_otp_code, validate_password_strength};

/// Represents a user account in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub role: UserRole,
    #[serde(skip_serializing)] // Never serialize password hash to API responses
    pub password_hash: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Account role. Students authenticate via OTP; admins via password.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Student,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Student => "student",
        }
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(UserRole::Admin),
            "student" => Ok(UserRole::Student),
            _ => Err(format!("Invalid user role: {}", s)),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Active login session. One row per user; a new login replaces the
/// stored token hash, which invalidates the previous device. Admins keep
/// their sessions across logins.
#[derive(Debug, Clone)]
pub struct UserSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
}

/// Request to register a new student account.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(custom(function = "validate_mobile"))]
    pub mobile: String,
}

/// Partial profile update for the authenticated account.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: Option<String>,

    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
}

/// Password login. Only admin accounts may log in with a password.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Request an OTP to be delivered to a mobile number.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpRequest {
    #[validate(custom(function = "validate_mobile"))]
    pub mobile: String,
}

/// Exchange a delivered OTP for a session token.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
    #[validate(custom(function = "validate_mobile"))]
    pub mobile: String,

    #[validate(custom(function = "validate_otp_code"))]
    pub code: String,
}

/// Admin password reset, authorized by a password-reset OTP.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[validate(custom(function = "validate_mobile"))]
    pub mobile: String,

    #[validate(custom(function = "validate_otp_code"))]
    pub code: String,

    #[validate(custom(function = "validate_password_strength"))]
    pub new_password: String,
}

/// Successful authentication response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_role_round_trip() {
        assert_eq!(UserRole::Admin.as_str(), "admin");
        assert_eq!(UserRole::from_str("STUDENT").unwrap(), UserRole::Student);
        assert!(UserRole::from_str("moderator").is_err());
    }

    #[test]
    fn test_register_request_validation() {
        let request = RegisterRequest {
            name: "Asha Verma".to_string(),
            email: "asha@example.com".to_string(),
            mobile: "9876543210".to_string(),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_register_request_rejects_bad_mobile() {
        let request = RegisterRequest {
            name: "Asha Verma".to_string(),
            email: "asha@example.com".to_string(),
            mobile: "12345".to_string(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Admin".to_string(),
            email: "admin@example.com".to_string(),
            mobile: "9876543210".to_string(),
            role: UserRole::Admin,
            password_hash: Some("$argon2id$secret".to_string()),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_login_at: None,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(json.contains("\"role\":\"admin\""));
    }
}
