//! Two-factor login flow
//!
//! Decides the next navigation step after a credential check without
//! committing to an authenticated session prematurely. Only the skip-OTP
//! path (and a successful TOTP verification) mutates the auth store;
//! every other branch leaves it untouched.

use std::sync::Arc;
use std::time::Duration;

use opencircle_domain::constants::DEFAULT_LOGIN_SETTLE_DELAY_MS;
use opencircle_domain::{
    AccountType, AuthorizedSession, Credentials, LoginOutcome, LoginStep, OpenCircleError,
    Result, TwoFactorPolicy,
};
use tracing::{debug, info};

use crate::session::ports::AccountGateway;
use crate::session::store::AuthStore;

/// Resolve a login outcome into the next navigation step
///
/// Pure: no store mutation, no I/O. The caller commits the session when
/// the step is [`LoginStep::EnterApp`].
#[must_use]
pub fn resolve_login(
    outcome: LoginOutcome,
    account_type: AccountType,
    identifier: &str,
) -> LoginStep {
    match outcome {
        LoginOutcome::TwoFactorRequired(_) => LoginStep::PromptOtp {
            identifier: identifier.to_string(),
            account_type,
        },
        LoginOutcome::Success(authorized) => {
            match TwoFactorPolicy::for_identity(&authorized.identity) {
                // The credential check alone is insufficient; the session
                // is only committed after the TOTP code verifies.
                TwoFactorPolicy::PromptOtp => LoginStep::PromptOtp {
                    identifier: identifier.to_string(),
                    account_type,
                },
                TwoFactorPolicy::SkipOtp => {
                    let home = authorized.identity.profile_home();
                    LoginStep::EnterApp { authorized, home }
                }
                TwoFactorPolicy::RequireSetup => LoginStep::SetupTwoFactor {
                    outcome: Box::new(LoginOutcome::Success(authorized)),
                    account_type,
                },
            }
        }
        LoginOutcome::Unrecognized => LoginStep::SetupTwoFactor {
            outcome: Box::new(LoginOutcome::Unrecognized),
            account_type,
        },
    }
}

/// Orchestrates credential checks, TOTP verification, and session commit
pub struct LoginFlow {
    store: Arc<AuthStore>,
    gateway: Arc<dyn AccountGateway>,
    settle_delay: Duration,
}

impl LoginFlow {
    #[must_use]
    pub fn new(store: Arc<AuthStore>, gateway: Arc<dyn AccountGateway>) -> Self {
        Self {
            store,
            gateway,
            settle_delay: Duration::from_millis(DEFAULT_LOGIN_SETTLE_DELAY_MS),
        }
    }

    /// Override the post-commit settle delay
    ///
    /// The delay gives session cookies time to propagate before the first
    /// authenticated request fires. Tests set this to zero.
    #[must_use]
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Run a credential check and resolve the next step
    ///
    /// A gateway error propagates with no store mutation; the only
    /// mutating path runs after a successful outcome resolved to
    /// [`LoginStep::EnterApp`].
    ///
    /// # Errors
    /// Returns error if the sign-in call fails
    pub async fn sign_in(
        &self,
        account_type: AccountType,
        credentials: Credentials,
    ) -> Result<LoginStep> {
        let outcome = self.gateway.sign_in(account_type, &credentials).await?;

        let step = resolve_login(outcome, account_type, &credentials.email);
        match step {
            LoginStep::EnterApp { authorized, home } => {
                let authorized = self.commit(authorized).await;
                Ok(LoginStep::EnterApp { authorized, home })
            }
            other => {
                debug!(account_type = %account_type, step = step_name(&other), "login deferred");
                Ok(other)
            }
        }
    }

    /// Verify a TOTP code for a pending login
    ///
    /// A successful outcome is committed exactly like the skip-OTP path;
    /// anything else is an authentication failure.
    ///
    /// # Errors
    /// Returns error if the verification call fails or the backend does not
    /// answer with an identity payload
    pub async fn verify_otp(
        &self,
        account_type: AccountType,
        identifier: &str,
        code: &str,
    ) -> Result<LoginStep> {
        let outcome = self.gateway.verify_two_factor(account_type, identifier, code).await?;

        match outcome {
            LoginOutcome::Success(authorized) => {
                let home = authorized.identity.profile_home();
                let authorized = self.commit(authorized).await;
                Ok(LoginStep::EnterApp { authorized, home })
            }
            LoginOutcome::TwoFactorRequired(_) | LoginOutcome::Unrecognized => {
                Err(OpenCircleError::Rejected("two-factor verification failed".to_string()))
            }
        }
    }

    /// Commit an authorized session
    ///
    /// Order matters: drop data cached for the previous session before the
    /// new identity lands, then persist, then let cookies settle before
    /// the caller navigates.
    async fn commit(&self, authorized: AuthorizedSession) -> AuthorizedSession {
        self.store.invalidate_cache();
        self.store.login(authorized.clone()).await;

        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }

        info!(role = %authorized.identity.role(), "login committed");
        authorized
    }
}

fn step_name(step: &LoginStep) -> &'static str {
    match step {
        LoginStep::PromptOtp { .. } => "prompt-otp",
        LoginStep::EnterApp { .. } => "enter-app",
        LoginStep::SetupTwoFactor { .. } => "setup-two-factor",
    }
}
