//! Login and two-factor types
//!
//! The credential-check endpoint answers with one of several shapes; they
//! are classified at the decode boundary into [`LoginOutcome`] so the rest
//! of the client matches exhaustively instead of probing for keys.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identity::{Identity, Role};
use crate::constants::{OTP_SIGNIN_ROUTE, TWO_FACTOR_SETUP_ROUTE};

/// Account kind used for a login attempt
///
/// Carried through the OTP screens so a verification request hits the right
/// endpoint. Wire values are `"user"` and `"organization"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    User,
    Organization,
}

impl AccountType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Organization => "organization",
        }
    }

    /// Role a successful login with this account type resolves to
    #[must_use]
    pub fn role(&self) -> Role {
        match self {
            Self::User => Role::Member,
            Self::Organization => Role::Organization,
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Form-encoded credentials submitted to the sign-in endpoints
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// A confirmed identity plus its session deadline
///
/// Produced by a successful credential check, a successful TOTP
/// verification, or a who-am-I response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizedSession {
    pub identity: Identity,
    pub expires_at: DateTime<Utc>,
}

/// Challenge details returned when credentials alone are not enough
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TwoFactorChallenge {
    pub message: Option<String>,
    pub account_type: Option<AccountType>,
}

/// Outcome of a credential-check call
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    /// Credentials accepted and an identity payload was returned
    Success(AuthorizedSession),
    /// Backend demands a TOTP code before issuing a session
    TwoFactorRequired(TwoFactorChallenge),
    /// A 2xx response matching neither known shape. Routed to two-factor
    /// setup as the conservative fallback; an explicit variant rather than
    /// a silent default.
    Unrecognized,
}

/// Derived two-factor policy, never stored
///
/// The exact table, for `(two_factor_enabled, bypass_two_factor)`:
/// `(1,1)` prompt for OTP now; `(0,1)` skip OTP entirely; `(1,0)` and
/// `(0,0)` route to two-factor setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TwoFactorPolicy {
    PromptOtp,
    SkipOtp,
    RequireSetup,
}

impl TwoFactorPolicy {
    #[must_use]
    pub fn evaluate(two_factor_enabled: bool, bypass_two_factor: bool) -> Self {
        match (two_factor_enabled, bypass_two_factor) {
            (true, true) => Self::PromptOtp,
            (false, true) => Self::SkipOtp,
            (true, false) | (false, false) => Self::RequireSetup,
        }
    }

    #[must_use]
    pub fn for_identity(identity: &Identity) -> Self {
        Self::evaluate(identity.two_factor_enabled(), identity.bypass_two_factor())
    }
}

/// Next navigation step after a credential check
///
/// Only `EnterApp` corresponds to a committed session; the other steps
/// leave the auth store untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginStep {
    /// Go to OTP entry, carrying the submitted identifier and account type
    PromptOtp {
        identifier: String,
        account_type: AccountType,
    },
    /// Session established; navigate to the role's profile home
    EnterApp {
        authorized: AuthorizedSession,
        home: &'static str,
    },
    /// Go to two-factor setup, passing the raw outcome through
    SetupTwoFactor {
        outcome: Box<LoginOutcome>,
        account_type: AccountType,
    },
}

impl LoginStep {
    /// Route the shell should navigate to for this step
    #[must_use]
    pub fn route(&self) -> &'static str {
        match self {
            Self::PromptOtp { .. } => OTP_SIGNIN_ROUTE,
            Self::EnterApp { home, .. } => home,
            Self::SetupTwoFactor { .. } => TWO_FACTOR_SETUP_ROUTE,
        }
    }
}
