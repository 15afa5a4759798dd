use crate::error::ApiError;
use chrono::{Duration, Utc};
use domain::models::{
    generate_otp_code, otp_expiry, AuthResponse, OtpPurpose, RegisterRequest, UpdateProfileRequest,
    User, UserRole, OTP_RATE_LIMIT, OTP_RATE_WINDOW_MINUTES,
};
use domain::services::OtpSender;
use persistence::repositories::{OtpRepository, UserRepository};
use shared::crypto::sha256_hex;
use shared::jwt::JwtSigner;
use shared::password::{hash_password, verify_password};
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email is already registered")]
    EmailTaken,
    #[error("Mobile number is already registered")]
    MobileTaken,
    #[error("Too many codes requested, try again later")]
    OtpRateLimited,
    #[error("Invalid or expired code")]
    InvalidOtp,
    #[error("No account for this mobile number, register first")]
    AccountNotRegistered,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Password login is restricted to admin accounts")]
    PasswordLoginNotAllowed,
    #[error("Account is deactivated")]
    AccountDisabled,
    #[error("User not found")]
    UserNotFound,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::EmailTaken | AuthError::MobileTaken => ApiError::Conflict(err.to_string()),
            AuthError::OtpRateLimited => ApiError::RateLimited(err.to_string()),
            AuthError::InvalidOtp
            | AuthError::InvalidCredentials
            | AuthError::AccountDisabled => ApiError::Unauthorized(err.to_string()),
            AuthError::PasswordLoginNotAllowed => ApiError::Forbidden(err.to_string()),
            AuthError::AccountNotRegistered | AuthError::UserNotFound => {
                ApiError::NotFound(err.to_string())
            }
            AuthError::Database(e) => e.into(),
            AuthError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

/// Registration, OTP issue/verify, password login and session control.
pub struct AuthService {
    users: UserRepository,
    otps: OtpRepository,
    jwt: Arc<JwtSigner>,
    otp_sender: Arc<dyn OtpSender>,
    token_expiry_days: i64,
}

impl AuthService {
    pub fn new(
        pool: PgPool,
        jwt: Arc<JwtSigner>,
        otp_sender: Arc<dyn OtpSender>,
        token_expiry_days: i64,
    ) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            otps: OtpRepository::new(pool),
            jwt,
            otp_sender,
            token_expiry_days,
        }
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<User, AuthError> {
        if self.users.find_by_email(&request.email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }
        if self.users.find_by_mobile(&request.mobile).await?.is_some() {
            return Err(AuthError::MobileTaken);
        }

        let user = self
            .users
            .create_student(&request.name, &request.email, &request.mobile)
            .await?;
        tracing::info!(user_id = %user.id, "Student registered");
        Ok(user.into())
    }

    /// Issues a code for the mobile number. Responds identically for
    /// known and unknown numbers so the endpoint cannot be used to
    /// enumerate which mobiles have accounts.
    pub async fn send_otp(&self, mobile: &str, purpose: OtpPurpose) -> Result<(), AuthError> {
        let window_start = Utc::now() - Duration::minutes(OTP_RATE_WINDOW_MINUTES);
        let recent = self.otps.count_recent(mobile, window_start).await?;
        if recent >= OTP_RATE_LIMIT {
            return Err(AuthError::OtpRateLimited);
        }

        let code = generate_otp_code();
        let now = Utc::now();
        self.otps
            .create(mobile, &code, purpose.as_str(), otp_expiry(now))
            .await?;

        if !self.otp_sender.send(mobile, &code).await {
            tracing::warn!("OTP delivery failed, code remains valid");
        }
        Ok(())
    }

    pub async fn verify_otp(&self, mobile: &str, code: &str) -> Result<AuthResponse, AuthError> {
        let otp = self
            .otps
            .find_valid(mobile, code, OtpPurpose::Login.as_str())
            .await?
            .ok_or(AuthError::InvalidOtp)?;
        self.otps.mark_consumed(otp.id).await?;

        let user = self
            .users
            .find_by_mobile(mobile)
            .await?
            .ok_or(AuthError::AccountNotRegistered)?;
        let user: User = user.into();
        if !user.is_active {
            return Err(AuthError::AccountDisabled);
        }

        self.open_session(user).await
    }

    /// Password login. Restricted to admin accounts; students always
    /// authenticate with an OTP.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        let user: User = user.into();

        if user.role != UserRole::Admin {
            return Err(AuthError::PasswordLoginNotAllowed);
        }
        let stored_hash = user
            .password_hash
            .as_deref()
            .ok_or(AuthError::InvalidCredentials)?;
        let valid = verify_password(password, stored_hash)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        if !valid {
            return Err(AuthError::InvalidCredentials);
        }
        if !user.is_active {
            return Err(AuthError::AccountDisabled);
        }

        self.open_session(user).await
    }

    /// Resets the account password after OTP proof of mobile ownership.
    /// Succeeds quietly when no account exists for the mobile, for the
    /// same probing reason as [`Self::send_otp`].
    pub async fn reset_password(
        &self,
        mobile: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let otp = self
            .otps
            .find_valid(mobile, code, OtpPurpose::PasswordReset.as_str())
            .await?
            .ok_or(AuthError::InvalidOtp)?;
        self.otps.mark_consumed(otp.id).await?;

        if let Some(user) = self.users.find_by_mobile(mobile).await? {
            let hash = hash_password(new_password)
                .map_err(|e| AuthError::Internal(e.to_string()))?;
            self.users.set_password_hash(user.id, &hash).await?;
            // Password changed: revoke whatever session is live.
            self.users.delete_session(user.id).await?;
            tracing::info!(user_id = %user.id, "Password reset");
        }
        Ok(())
    }

    pub async fn logout(&self, user_id: Uuid) -> Result<(), AuthError> {
        self.users.delete_session(user_id).await?;
        Ok(())
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        request: &UpdateProfileRequest,
    ) -> Result<User, AuthError> {
        if let Some(email) = request.email.as_deref() {
            if let Some(existing) = self.users.find_by_email(email).await? {
                if existing.id != user_id {
                    return Err(AuthError::EmailTaken);
                }
            }
        }

        let user = self
            .users
            .update_profile(user_id, request.name.as_deref(), request.email.as_deref())
            .await?
            .ok_or(AuthError::UserNotFound)?;
        Ok(user.into())
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<User, AuthError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        Ok(user.into())
    }

    async fn open_session(&self, user: User) -> Result<AuthResponse, AuthError> {
        let token = self
            .jwt
            .issue(user.id, user.role.as_str())
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let expires_at = Utc::now() + Duration::days(self.token_expiry_days);
        self.users
            .upsert_session(user.id, &sha256_hex(&token), expires_at)
            .await?;
        self.users.update_last_login(user.id, Utc::now()).await?;

        Ok(AuthResponse { token, user })
    }
}
