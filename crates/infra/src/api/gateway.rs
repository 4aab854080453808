//! HTTP implementation of the account gateway port
//!
//! The backend answers the account endpoints with duck-typed JSON: a
//! session envelope keyed by `user` or `organization`, a two-factor
//! challenge keyed by `requires_2fa`, or a bare identity record. This
//! module is the decode boundary where those shapes become the domain's
//! tagged unions; nothing above it inspects keys.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use opencircle_core::AccountGateway;
use opencircle_domain::constants::RAW_IDENTITY_SESSION_TTL_HOURS;
use opencircle_domain::{
    AccountType, AuthUserPayload, AuthorizedSession, Credentials, Identity, LoginOutcome,
    MemberProfile, OpenCircleError, OrganizationProfile, Result, TwoFactorChallenge,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::client::ApiClient;

const USER_SIGNIN_PATH: &str = "/account/user_signin";
const ORGANIZATION_SIGNIN_PATH: &str = "/account/organization_signin";
const AUTH_USER_PATH: &str = "/account/auth_user";
const LOGOUT_PATH: &str = "/account/logout";
const VERIFY_2FA_PATH: &str = "/account/verify_2fa";
const BYPASS_2FA_PATH: &str = "/2fa/bypass-two-factor";

/// Account gateway over the OpenCircle REST API
pub struct HttpAccountGateway {
    client: Arc<ApiClient>,
}

impl HttpAccountGateway {
    #[must_use]
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Toggle the per-account two-factor bypass flag
    ///
    /// # Errors
    /// Returns error if the request fails
    #[instrument(skip(self))]
    pub async fn set_two_factor_bypass(
        &self,
        account_type: AccountType,
        enabled: bool,
    ) -> Result<()> {
        let body = serde_json::json!({
            "account_type": account_type.as_str(),
            "bypass_two_factor": u8::from(enabled),
        });
        self.client.post_json_empty(BYPASS_2FA_PATH, &body).await
    }

    fn signin_path(account_type: AccountType) -> &'static str {
        match account_type {
            AccountType::User => USER_SIGNIN_PATH,
            AccountType::Organization => ORGANIZATION_SIGNIN_PATH,
        }
    }
}

#[async_trait]
impl AccountGateway for HttpAccountGateway {
    #[instrument(skip(self, credentials), fields(account_type = %account_type))]
    async fn sign_in(
        &self,
        account_type: AccountType,
        credentials: &Credentials,
    ) -> Result<LoginOutcome> {
        let path = Self::signin_path(account_type);
        let value: Value = self.client.post_form(path, credentials).await?;
        Ok(classify_login_outcome(value))
    }

    #[instrument(skip(self))]
    async fn fetch_auth_user(&self) -> Result<Option<AuthUserPayload>> {
        let value = self.client.get_optional_json::<Value>(AUTH_USER_PATH).await?;

        match value {
            None => Ok(None),
            Some(value) if is_empty_payload(&value) => Ok(None),
            Some(value) => classify_auth_user(value).map(Some),
        }
    }

    #[instrument(skip(self))]
    async fn sign_out(&self) -> Result<()> {
        self.client.post_empty(LOGOUT_PATH).await
    }

    #[instrument(skip(self, code), fields(account_type = %account_type))]
    async fn verify_two_factor(
        &self,
        account_type: AccountType,
        identifier: &str,
        code: &str,
    ) -> Result<LoginOutcome> {
        let body = serde_json::json!({
            "account_type": account_type.as_str(),
            "email": identifier,
            "otp": code,
        });
        let value: Value = self.client.post_json(VERIFY_2FA_PATH, &body).await?;
        Ok(classify_login_outcome(value))
    }
}

/// Session envelope as it appears on the wire
///
/// Exactly one of `user`/`organization` is populated; `expires_at` is
/// normally present on sign-in responses.
#[derive(Debug, Deserialize)]
struct WireSessionEnvelope {
    #[serde(default)]
    user: Option<MemberProfile>,
    #[serde(default)]
    organization: Option<OrganizationProfile>,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
}

impl WireSessionEnvelope {
    fn into_authorized(self) -> Option<AuthorizedSession> {
        let identity = match (self.user, self.organization) {
            (Some(member), _) => Identity::Member(member),
            (None, Some(organization)) => Identity::Organization(organization),
            (None, None) => return None,
        };
        let expires_at = self
            .expires_at
            .unwrap_or_else(|| Utc::now() + Duration::hours(RAW_IDENTITY_SESSION_TTL_HOURS));
        Some(AuthorizedSession { identity, expires_at })
    }
}

/// Classify a 2xx sign-in (or 2FA verify) response body
///
/// Shapes that match neither the envelope nor the challenge become
/// `Unrecognized`, which the login flow routes to two-factor setup.
fn classify_login_outcome(value: Value) -> LoginOutcome {
    if value.get("user").is_some() || value.get("organization").is_some() {
        match serde_json::from_value::<WireSessionEnvelope>(value) {
            Ok(envelope) => match envelope.into_authorized() {
                Some(authorized) => return LoginOutcome::Success(authorized),
                None => return LoginOutcome::Unrecognized,
            },
            Err(err) => {
                warn!(error = %err, "sign-in envelope did not decode");
                return LoginOutcome::Unrecognized;
            }
        }
    }

    if truthy(value.get("requires_2fa")) {
        let message = value.get("message").and_then(Value::as_str).map(str::to_string);
        let account_type = value
            .get("account_type")
            .cloned()
            .and_then(|v| serde_json::from_value::<AccountType>(v).ok());
        return LoginOutcome::TwoFactorRequired(TwoFactorChallenge { message, account_type });
    }

    debug!("sign-in response matched no known shape");
    LoginOutcome::Unrecognized
}

/// Classify a non-empty who-am-I response body
///
/// Unlike sign-in, an undecodable body here is an error: the session check
/// must fail closed rather than guess.
fn classify_auth_user(value: Value) -> Result<AuthUserPayload> {
    if value.get("user").is_some() || value.get("organization").is_some() {
        let envelope: WireSessionEnvelope = serde_json::from_value(value)
            .map_err(|err| OpenCircleError::Decode(format!("auth_user envelope: {err}")))?;
        return envelope
            .into_authorized()
            .map(AuthUserPayload::Envelope)
            .ok_or_else(|| OpenCircleError::Decode("auth_user envelope carried no identity".into()));
    }

    // Bare identity record: the role discriminator picks the variant, and
    // anything other than an explicit "organization" is a member.
    let identity = match value.get("role").and_then(Value::as_str) {
        Some("organization") => serde_json::from_value::<OrganizationProfile>(value)
            .map(Identity::Organization)
            .map_err(|err| OpenCircleError::Decode(format!("auth_user organization: {err}")))?,
        _ => serde_json::from_value::<MemberProfile>(value)
            .map(Identity::Member)
            .map_err(|err| OpenCircleError::Decode(format!("auth_user member: {err}")))?,
    };

    Ok(AuthUserPayload::Raw(identity))
}

fn is_empty_payload(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
        _ => false,
    }
}
