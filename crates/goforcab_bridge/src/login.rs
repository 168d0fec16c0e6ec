//! Phone number login with one-time passcodes.
//!
//! The flow moves `Phone -> Otp -> Done`, with a detour through
//! `SetPassword` the first time an account signs in. The authentication
//! provider itself is external and reached through [`AuthProvider`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{error, info};

/// Country codes offered by the login form; the first is the default
pub const SUPPORTED_COUNTRY_CODES: [&str; 3] = ["+91", "+1", "+44"];

pub const PHONE_DIGITS: usize = 10;
pub const OTP_DIGITS: usize = 6;
pub const MIN_PASSWORD_LEN: usize = 6;

/// Time before another code may be requested
pub const RESEND_COOLDOWN: Duration = Duration::from_secs(30);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoginError {
    #[error("Please enter a valid 10-digit phone number")]
    InvalidPhoneNumber,

    #[error("Please send OTP first")]
    OtpNotSent,

    #[error("Please enter a valid 6-digit OTP")]
    InvalidOtp,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Password must be at least 6 characters long")]
    PasswordTooShort,

    #[error("Unsupported country code: {0}")]
    UnsupportedCountryCode(String),

    #[error("Resend code in {seconds} seconds")]
    ResendTooSoon { seconds: u64 },

    #[error("Not available in the {0:?} step")]
    WrongStep(LoginStep),

    #[error(transparent)]
    Provider(#[from] AuthProviderError),
}

/// Failure reported by the authentication provider
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthProviderError {
    /// The provider's own message, e.g. `auth/invalid-verification-code`
    #[error("{0}")]
    Rejected(String),

    #[error("An error occurred during authentication")]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStep {
    Phone,
    Otp,
    SetPassword,
    Done,
}

/// Handle returned by the provider after a code was sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationId(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedInUser {
    pub uid: String,
    pub creation_time: DateTime<Utc>,
    pub last_sign_in_time: DateTime<Utc>,
}

impl SignedInUser {
    /// An account signing in for the first time has identical creation and
    /// last sign-in times.
    pub fn is_first_sign_in(&self) -> bool {
        self.creation_time == self.last_sign_in_time
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Send a one-time code to `phone_number` (with country code)
    async fn send_otp(&self, phone_number: &str) -> Result<VerificationId, AuthProviderError>;

    async fn confirm_otp(
        &self,
        verification: &VerificationId,
        code: &str,
    ) -> Result<SignedInUser, AuthProviderError>;

    async fn update_password(
        &self,
        user: &SignedInUser,
        password: &str,
    ) -> Result<(), AuthProviderError>;
}

fn provider_error(err: AuthProviderError) -> LoginError {
    error!("Authentication error: {:?}", err);
    match err {
        AuthProviderError::Rejected(message) if message.trim().is_empty() => {
            AuthProviderError::Unknown.into()
        }
        err => err.into(),
    }
}

pub struct LoginFlow<P> {
    provider: P,
    step: LoginStep,
    country_code: String,
    phone_number: String,
    verification: Option<VerificationId>,
    resend_at: Option<Instant>,
    user: Option<SignedInUser>,
}

impl<P: AuthProvider> LoginFlow<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            step: LoginStep::Phone,
            country_code: SUPPORTED_COUNTRY_CODES[0].to_string(),
            phone_number: String::new(),
            verification: None,
            resend_at: None,
            user: None,
        }
    }

    pub fn step(&self) -> LoginStep {
        self.step
    }

    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    pub fn signed_in_user(&self) -> Option<&SignedInUser> {
        self.user.as_ref()
    }

    pub fn set_country_code(&mut self, code: &str) -> Result<(), LoginError> {
        if !SUPPORTED_COUNTRY_CODES.contains(&code) {
            return Err(LoginError::UnsupportedCountryCode(code.to_string()));
        }
        self.country_code = code.to_string();
        Ok(())
    }

    /// Whole seconds left before a code may be requested again
    pub fn resend_countdown(&self) -> u64 {
        self.resend_at
            .map(|at| {
                let left = at.saturating_duration_since(Instant::now());
                left.as_secs() + u64::from(left.subsec_nanos() > 0)
            })
            .unwrap_or(0)
    }

    /// Request a code for `phone_input`; non-digits are stripped first.
    ///
    /// Also used to resend, which is refused while the countdown runs.
    pub async fn send_otp(&mut self, phone_input: &str) -> Result<(), LoginError> {
        if !matches!(self.step, LoginStep::Phone | LoginStep::Otp) {
            return Err(LoginError::WrongStep(self.step));
        }

        let digits: String = phone_input.chars().filter(char::is_ascii_digit).collect();
        if digits.len() != PHONE_DIGITS {
            return Err(LoginError::InvalidPhoneNumber);
        }

        let seconds = self.resend_countdown();
        if seconds > 0 {
            return Err(LoginError::ResendTooSoon { seconds });
        }

        let formatted = format!("{}{}", self.country_code, digits);
        let verification = self
            .provider
            .send_otp(&formatted)
            .await
            .map_err(provider_error)?;

        info!("Verification code sent");
        self.phone_number = digits;
        self.verification = Some(verification);
        self.resend_at = Some(Instant::now() + RESEND_COOLDOWN);
        self.step = LoginStep::Otp;
        Ok(())
    }

    /// Confirm the code; returns the step the flow moved to
    pub async fn verify_otp(&mut self, code: &str) -> Result<LoginStep, LoginError> {
        match self.step {
            LoginStep::Otp => {}
            LoginStep::Phone => return Err(LoginError::OtpNotSent),
            step => return Err(LoginError::WrongStep(step)),
        }
        let verification = self.verification.as_ref().ok_or(LoginError::OtpNotSent)?;
        if code.len() != OTP_DIGITS || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(LoginError::InvalidOtp);
        }

        let user = self
            .provider
            .confirm_otp(verification, code)
            .await
            .map_err(provider_error)?;

        self.step = if user.is_first_sign_in() {
            LoginStep::SetPassword
        } else {
            LoginStep::Done
        };
        info!("Signed in as {}", user.uid);
        self.user = Some(user);
        Ok(self.step)
    }

    pub async fn set_password(&mut self, password: &str, confirm: &str) -> Result<(), LoginError> {
        let user = match (&self.user, self.step) {
            (Some(user), LoginStep::SetPassword) => user,
            _ => return Err(LoginError::WrongStep(self.step)),
        };
        if password != confirm {
            return Err(LoginError::PasswordMismatch);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(LoginError::PasswordTooShort);
        }

        self.provider
            .update_password(user, password)
            .await
            .map_err(provider_error)?;

        info!("Password set for {}", user.uid);
        self.step = LoginStep::Done;
        Ok(())
    }

    /// Go back to the phone step, keeping any resend countdown
    pub fn change_phone_number(&mut self) {
        if self.step == LoginStep::Otp {
            self.verification = None;
            self.step = LoginStep::Phone;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn returning_user() -> SignedInUser {
        SignedInUser {
            uid: "u555".to_string(),
            creation_time: Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap(),
            last_sign_in_time: Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap(),
        }
    }

    fn new_user() -> SignedInUser {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        SignedInUser {
            uid: "u777".to_string(),
            creation_time: now,
            last_sign_in_time: now,
        }
    }

    fn provider_sending_code() -> MockAuthProvider {
        let mut provider = MockAuthProvider::new();
        provider
            .expect_send_otp()
            .returning(|_| Ok(VerificationId("v1".to_string())));
        provider
    }

    #[tokio::test]
    async fn test_rejects_short_phone_number() {
        let mut flow = LoginFlow::new(MockAuthProvider::new());
        let err = flow.send_otp("98765").await.unwrap_err();
        assert_eq!(err.to_string(), "Please enter a valid 10-digit phone number");
        assert_eq!(flow.step(), LoginStep::Phone);
    }

    #[tokio::test]
    async fn test_sends_formatted_number() {
        let mut provider = MockAuthProvider::new();
        provider
            .expect_send_otp()
            .withf(|phone_number| phone_number == "+449876543210")
            .times(1)
            .returning(|_| Ok(VerificationId("v1".to_string())));

        let mut flow = LoginFlow::new(provider);
        flow.set_country_code("+44").unwrap();
        flow.send_otp("98765-43210").await.unwrap();
        assert_eq!(flow.step(), LoginStep::Otp);
    }

    #[test]
    fn test_unsupported_country_code() {
        let mut flow = LoginFlow::new(MockAuthProvider::new());
        assert_eq!(
            flow.set_country_code("+33"),
            Err(LoginError::UnsupportedCountryCode("+33".to_string()))
        );
        assert_eq!(flow.country_code(), "+91");
    }

    #[tokio::test]
    async fn test_verify_requires_sent_code() {
        let mut flow = LoginFlow::new(MockAuthProvider::new());
        let err = flow.verify_otp("123456").await.unwrap_err();
        assert_eq!(err.to_string(), "Please send OTP first");
    }

    #[tokio::test]
    async fn test_verify_requires_six_digits() {
        let mut flow = LoginFlow::new(provider_sending_code());
        flow.send_otp("9876543210").await.unwrap();
        let err = flow.verify_otp("12345").await.unwrap_err();
        assert_eq!(err.to_string(), "Please enter a valid 6-digit OTP");
    }

    #[tokio::test(start_paused = true)]
    async fn test_resend_countdown() {
        let mut provider = MockAuthProvider::new();
        provider
            .expect_send_otp()
            .times(2)
            .returning(|_| Ok(VerificationId("v1".to_string())));

        let mut flow = LoginFlow::new(provider);
        flow.send_otp("9876543210").await.unwrap();
        assert_eq!(flow.resend_countdown(), 30);

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(
            flow.send_otp("9876543210").await,
            Err(LoginError::ResendTooSoon { seconds: 20 })
        );

        tokio::time::advance(Duration::from_secs(20)).await;
        assert_eq!(flow.resend_countdown(), 0);
        flow.send_otp("9876543210").await.unwrap();
    }

    #[tokio::test]
    async fn test_returning_user_is_done_after_otp() {
        let mut provider = provider_sending_code();
        provider
            .expect_confirm_otp()
            .returning(|_, _| Ok(returning_user()));

        let mut flow = LoginFlow::new(provider);
        flow.send_otp("9876543210").await.unwrap();
        assert_eq!(flow.verify_otp("123456").await.unwrap(), LoginStep::Done);
        assert_eq!(flow.signed_in_user().unwrap().uid, "u555");
    }

    #[tokio::test]
    async fn test_verify_after_done_is_refused() {
        let mut provider = provider_sending_code();
        provider
            .expect_confirm_otp()
            .times(1)
            .returning(|_, _| Ok(new_user()));
        provider.expect_update_password().returning(|_, _| Ok(()));

        let mut flow = LoginFlow::new(provider);
        flow.send_otp("9876543210").await.unwrap();
        flow.verify_otp("123456").await.unwrap();
        flow.set_password("secret1", "secret1").await.unwrap();

        assert_eq!(
            flow.verify_otp("123456").await,
            Err(LoginError::WrongStep(LoginStep::Done))
        );
        assert_eq!(flow.step(), LoginStep::Done);
    }

    #[tokio::test]
    async fn test_first_sign_in_requires_password() {
        let mut provider = provider_sending_code();
        provider.expect_confirm_otp().returning(|_, _| Ok(new_user()));
        provider
            .expect_update_password()
            .withf(|user, password| user.uid == "u777" && password == "secret1")
            .times(1)
            .returning(|_, _| Ok(()));

        let mut flow = LoginFlow::new(provider);
        flow.send_otp("9876543210").await.unwrap();
        assert_eq!(
            flow.verify_otp("123456").await.unwrap(),
            LoginStep::SetPassword
        );

        assert_eq!(
            flow.set_password("secret1", "secret2").await.unwrap_err().to_string(),
            "Passwords do not match"
        );
        assert_eq!(
            flow.set_password("abc", "abc").await.unwrap_err().to_string(),
            "Password must be at least 6 characters long"
        );
        flow.set_password("secret1", "secret1").await.unwrap();
        assert_eq!(flow.step(), LoginStep::Done);
    }

    #[tokio::test]
    async fn test_provider_error_message() {
        let mut provider = provider_sending_code();
        provider
            .expect_confirm_otp()
            .returning(|_, _| {
                Err(AuthProviderError::Rejected(
                    "auth/invalid-verification-code".to_string(),
                ))
            });

        let mut flow = LoginFlow::new(provider);
        flow.send_otp("9876543210").await.unwrap();
        assert_eq!(
            flow.verify_otp("000000").await,
            Err(LoginError::Provider(AuthProviderError::Rejected(
                "auth/invalid-verification-code".to_string()
            )))
        );
        assert_eq!(flow.step(), LoginStep::Otp);
    }

    #[tokio::test]
    async fn test_blank_provider_error_gets_generic_message() {
        let mut provider = MockAuthProvider::new();
        provider
            .expect_send_otp()
            .returning(|_| Err(AuthProviderError::Rejected(String::new())));

        let mut flow = LoginFlow::new(provider);
        let err = flow.send_otp("9876543210").await.unwrap_err();
        assert_eq!(err.to_string(), "An error occurred during authentication");
    }
}
