//! Session types
//!
//! The client's local belief about current authentication status. The
//! backend is the source of truth; the local session is a cache invalidated
//! by periodic re-validation or explicit logout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identity::Identity;
use super::login::AuthorizedSession;

/// Local session state
///
/// A tagged union rather than a `(flag, Option<Identity>)` pair: being
/// authenticated without an identity is unrepresentable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Session {
    #[default]
    Anonymous,
    Authenticated {
        identity: Identity,
        expires_at: DateTime<Utc>,
    },
}

impl Session {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated { identity, .. } => Some(identity),
        }
    }

    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated { expires_at, .. } => Some(*expires_at),
        }
    }

    /// Get seconds until session expiry
    ///
    /// # Returns
    /// `Some(seconds)` while authenticated, `None` otherwise
    #[must_use]
    pub fn seconds_until_expiry(&self) -> Option<i64> {
        self.expires_at().map(|expires_at| (expires_at - Utc::now()).num_seconds())
    }
}

impl From<AuthorizedSession> for Session {
    fn from(authorized: AuthorizedSession) -> Self {
        Self::Authenticated {
            identity: authorized.identity,
            expires_at: authorized.expires_at,
        }
    }
}

/// Payload of the who-am-I endpoint
///
/// The backend answers in one of two shapes: a session envelope
/// (`{user: ...}` / `{organization: ...}` plus `expires_at`) or a bare
/// identity record with no expiry. The gateway classifies the wire JSON;
/// the hydrator normalizes `Raw` by attaching a fallback TTL.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthUserPayload {
    Envelope(AuthorizedSession),
    Raw(Identity),
}
