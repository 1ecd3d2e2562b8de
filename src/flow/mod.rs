//! Multi-stage authentication flow controller.
//!
//! Each login, signup, or password-reset attempt is one [`Flow`]: a small
//! state machine over the stages *identity* → *code verification* → *new
//! credential*. The stage only advances on a successful provider response,
//! never skips, and regresses only through [`Flow::request_new_code`].
//! Provider failures keep the stage unchanged and record the provider's
//! message for display.
//!
//! Flows are transient; completion (or abandonment past the store TTL) ends
//! the machine, there is no explicit terminal state.

use std::fmt;
use std::str::FromStr;

use crate::provider::{AuthProvider, ProviderError, ProviderSession};

pub mod store;
pub mod validate;

pub use store::FlowStore;
pub use validate::mask_email;

/// Ordinal flow stage; the ordinal is what page renderers switch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Identity = 1,
    CodeVerification = 2,
    NewCredential = 3,
}

impl Stage {
    #[must_use]
    pub fn ordinal(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    Login,
    Signup,
    PasswordReset,
}

impl FlowKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Signup => "signup",
            Self::PasswordReset => "reset-password",
        }
    }
}

impl FromStr for FlowKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "login" => Ok(Self::Login),
            "signup" => Ok(Self::Signup),
            "reset-password" => Ok(Self::PasswordReset),
            other => Err(format!("unknown flow kind: {other}")),
        }
    }
}

/// Why a submission was not accepted; the flow stage is unchanged in every
/// case.
#[derive(Debug)]
pub enum FlowError {
    /// Input failed client-side validation; no provider call was made.
    Validation(Vec<&'static str>),
    /// The provider rejected the call; its message is shown to the user.
    Provider(ProviderError),
    /// The submission does not match the flow's current stage.
    Stage { expected: Stage, actual: Stage },
}

impl fmt::Display for FlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(issues) => write!(f, "{}", issues.join(" ")),
            Self::Provider(err) => write!(f, "{}", err.message()),
            Self::Stage { expected, actual } => write!(
                f,
                "expected stage {} but flow is at stage {}",
                expected.ordinal(),
                actual.ordinal()
            ),
        }
    }
}

impl std::error::Error for FlowError {}

/// Successful outcome of a submission.
#[derive(Debug)]
pub enum FlowAdvance {
    /// A one-time code was sent; the flow is at the code-verification stage.
    AwaitCode,
    /// The code was accepted; the reset flow now collects the new password.
    AwaitNewPassword,
    /// The flow is finished; a session, when present, becomes the cookies.
    Complete(Option<ProviderSession>),
}

/// One in-progress authentication attempt.
#[derive(Debug)]
pub struct Flow {
    kind: FlowKind,
    stage: Stage,
    email: Option<String>,
    masked_email: Option<String>,
    pending_error: Option<String>,
    session: Option<ProviderSession>,
}

impl Flow {
    #[must_use]
    pub fn new(kind: FlowKind) -> Self {
        Self {
            kind,
            stage: Stage::Identity,
            email: None,
            masked_email: None,
            pending_error: None,
            session: None,
        }
    }

    #[must_use]
    pub fn kind(&self) -> FlowKind {
        self.kind
    }

    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    #[must_use]
    pub fn masked_email(&self) -> Option<&str> {
        self.masked_email.as_deref()
    }

    #[must_use]
    pub fn pending_error(&self) -> Option<&str> {
        self.pending_error.as_deref()
    }

    /// Submit the identity form: email, optionally with a password.
    ///
    /// # Errors
    /// Validation issues, a stage mismatch, or the provider's failure; the
    /// stage is unchanged on every error.
    pub async fn submit_identity(
        &mut self,
        provider: &dyn AuthProvider,
        email: &str,
        password: Option<&str>,
    ) -> Result<FlowAdvance, FlowError> {
        if self.stage != Stage::Identity {
            return Err(self.stage_mismatch(Stage::Identity));
        }

        let email = validate::normalize_email(email);
        let mut issues = Vec::new();
        if !validate::valid_email(&email) {
            issues.push("Invalid email address.");
        }
        if let Some(password) = password {
            issues.extend(validate::password_issues(password));
        }
        if !issues.is_empty() {
            return Err(FlowError::Validation(issues));
        }

        match (self.kind, password) {
            (FlowKind::Login, Some(password)) => {
                let session = match provider.sign_in_with_password(&email, password).await {
                    Ok(session) => session,
                    Err(err) => return Err(self.provider_failure(err)),
                };
                self.pending_error = None;
                Ok(FlowAdvance::Complete(Some(session)))
            }
            (FlowKind::Signup, Some(password)) => {
                let outcome = match provider.sign_up(&email, password).await {
                    Ok(outcome) => outcome,
                    Err(err) => return Err(self.provider_failure(err)),
                };
                match outcome.session {
                    Some(session) => {
                        self.pending_error = None;
                        Ok(FlowAdvance::Complete(Some(session)))
                    }
                    // Email confirmation is on: the provider mailed a code.
                    None => {
                        self.enter_code_verification(email);
                        Ok(FlowAdvance::AwaitCode)
                    }
                }
            }
            _ => {
                if let Err(err) = provider.send_otp(&email).await {
                    return Err(self.provider_failure(err));
                }
                self.enter_code_verification(email);
                Ok(FlowAdvance::AwaitCode)
            }
        }
    }

    /// Submit the one-time code from the email.
    ///
    /// Codes that are not exactly 6 digits are rejected before any provider
    /// call.
    ///
    /// # Errors
    /// Validation, stage mismatch, or provider failure; stage unchanged.
    pub async fn submit_otp(
        &mut self,
        provider: &dyn AuthProvider,
        code: &str,
    ) -> Result<FlowAdvance, FlowError> {
        if self.stage != Stage::CodeVerification {
            return Err(self.stage_mismatch(Stage::CodeVerification));
        }
        if !validate::valid_otp(code) {
            return Err(FlowError::Validation(vec![
                "Code must be exactly 6 digits.",
            ]));
        }
        let Some(email) = self.email.clone() else {
            return Err(self.stage_mismatch(Stage::Identity));
        };

        match provider.verify_otp(&email, code).await {
            Ok(session) => {
                self.pending_error = None;
                if self.kind == FlowKind::PasswordReset {
                    // Hold the verified session for the credential update.
                    self.session = Some(session);
                    self.stage = Stage::NewCredential;
                    Ok(FlowAdvance::AwaitNewPassword)
                } else {
                    Ok(FlowAdvance::Complete(Some(session)))
                }
            }
            Err(err) => Err(self.provider_failure(err)),
        }
    }

    /// Ask the provider for a fresh code; the previous one is invalidated on
    /// the provider side. This is the only permitted stage regression.
    ///
    /// # Errors
    /// Stage mismatch when no code was ever sent, or the provider's failure.
    pub async fn request_new_code(
        &mut self,
        provider: &dyn AuthProvider,
    ) -> Result<FlowAdvance, FlowError> {
        if self.stage < Stage::CodeVerification {
            return Err(self.stage_mismatch(Stage::CodeVerification));
        }
        let Some(email) = self.email.clone() else {
            return Err(self.stage_mismatch(Stage::Identity));
        };

        if let Err(err) = provider.send_otp(&email).await {
            return Err(self.provider_failure(err));
        }
        self.pending_error = None;
        self.stage = Stage::CodeVerification;
        Ok(FlowAdvance::AwaitCode)
    }

    /// Submit the replacement password for a reset flow.
    ///
    /// # Errors
    /// Validation (strength rules, mismatch) or stage mismatch.
    pub fn submit_new_password(
        &mut self,
        password: &str,
        confirm_password: &str,
    ) -> Result<FlowAdvance, FlowError> {
        if self.kind != FlowKind::PasswordReset || self.stage != Stage::NewCredential {
            return Err(self.stage_mismatch(Stage::NewCredential));
        }

        let mut issues = validate::password_issues(password);
        if password != confirm_password {
            issues.push("Passwords do not match.");
        }
        if !issues.is_empty() {
            return Err(FlowError::Validation(issues));
        }

        // TODO: persist the credential once the provider client gains a
        // password-update call for recovery sessions; until then the new
        // password is validated but not stored.
        self.pending_error = None;
        Ok(FlowAdvance::Complete(self.session.take()))
    }

    fn enter_code_verification(&mut self, email: String) {
        self.masked_email = Some(validate::mask_email(&email));
        self.email = Some(email);
        self.pending_error = None;
        self.stage = Stage::CodeVerification;
    }

    fn provider_failure(&mut self, err: ProviderError) -> FlowError {
        self.pending_error = Some(err.message().to_string());
        FlowError::Provider(err)
    }

    fn stage_mismatch(&self, expected: Stage) -> FlowError {
        FlowError::Stage {
            expected,
            actual: self.stage,
        }
    }
}
