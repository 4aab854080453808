//! Session validation against backend truth
//!
//! Reconciles the local [`AuthStore`] with the backend's who-am-I view.
//! Every path that cannot confirm authentication clears local state: the
//! client never claims a session the backend could not vouch for. The one
//! deliberate exception is the periodic check's transient-failure policy,
//! documented on [`FailurePolicy`].

use std::sync::Arc;

use chrono::{Duration, Utc};
use opencircle_domain::constants::RAW_IDENTITY_SESSION_TTL_HOURS;
use opencircle_domain::{AuthUserPayload, AuthorizedSession, OpenCircleError};
use tracing::{debug, info, warn};

use super::ports::AccountGateway;
use super::store::AuthStore;

/// How validation reacts to gateway failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Any failure clears the local session. Used at boot and for explicit
    /// checks: better to re-authenticate than to act on unconfirmed state.
    FailClosed,
    /// Only a definitive verdict clears the session: an empty who-am-I
    /// result, a rejection, or an undecodable body. Transient transport
    /// failures (network, timeout, 5xx, throttling) keep the local session
    /// and are logged. Used by the periodic check, where a 5-minute cadence
    /// would otherwise turn every network blip into a forced logout.
    KeepOnTransient,
}

/// Result of one validation pass
#[derive(Debug)]
pub enum SessionValidation {
    /// Backend confirmed the session; the store holds the fresh identity
    Valid,
    /// No authenticated session, locally or backend-side
    Invalid,
    /// The check itself failed; whether the session was cleared depends on
    /// the policy and the error kind
    Failed(OpenCircleError),
}

impl SessionValidation {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Reconciles local session state with the backend
pub struct SessionValidator {
    store: Arc<AuthStore>,
    gateway: Arc<dyn AccountGateway>,
}

impl SessionValidator {
    #[must_use]
    pub fn new(store: Arc<AuthStore>, gateway: Arc<dyn AccountGateway>) -> Self {
        Self { store, gateway }
    }

    /// Validate the current session, failing closed on any error
    ///
    /// Short-circuits without a network call when no session is established
    /// locally; unauthenticated probing of the who-am-I endpoint is never
    /// useful.
    pub async fn validate_session(&self) -> SessionValidation {
        self.validate_session_with_policy(FailurePolicy::FailClosed).await
    }

    /// Validate the current session under the given failure policy
    pub async fn validate_session_with_policy(
        &self,
        policy: FailurePolicy,
    ) -> SessionValidation {
        if !self.store.is_authenticated() {
            debug!("skipping session validation: not authenticated locally");
            return SessionValidation::Invalid;
        }

        let epoch = self.store.epoch();

        match self.gateway.fetch_auth_user().await {
            Ok(Some(payload)) => {
                let authorized = normalize(payload);
                debug!(
                    ttl_seconds = (authorized.expires_at - Utc::now()).num_seconds(),
                    "backend confirmed session"
                );
                if self.store.login_if_epoch(authorized, epoch).await {
                    SessionValidation::Valid
                } else {
                    // A logout won the race while the check was in flight.
                    SessionValidation::Invalid
                }
            }
            Ok(None) => {
                info!("backend reports no authenticated principal; clearing session");
                self.store.logout().await;
                SessionValidation::Invalid
            }
            Err(err) => {
                if policy == FailurePolicy::KeepOnTransient && err.is_transient() {
                    warn!(error = %err, "session check failed transiently; keeping session");
                } else {
                    warn!(error = %err, "session validation failed; clearing session");
                    self.store.logout().await;
                }
                SessionValidation::Failed(err)
            }
        }
    }

    /// One-shot boot hydration
    ///
    /// Restores the persisted snapshot into the store, then validates it
    /// against the backend. With nothing persisted the result is `Invalid`
    /// without any network traffic, and an application shell can route
    /// straight to login.
    pub async fn bootstrap(&self) -> SessionValidation {
        match self.store_snapshot().await {
            Some(snapshot) => {
                self.store.restore(snapshot);
                self.validate_session().await
            }
            None => {
                debug!("no persisted session to hydrate");
                SessionValidation::Invalid
            }
        }
    }

    /// Log out: best-effort backend invalidation, unconditional local clear
    ///
    /// A failed backend call is logged and never blocks the local clearing.
    pub async fn sign_out(&self) {
        if let Err(err) = self.gateway.sign_out().await {
            warn!(error = %err, "backend logout failed; clearing local session anyway");
        }
        self.store.logout().await;
    }

    async fn store_snapshot(&self) -> Option<AuthorizedSession> {
        match self.store.load_persisted().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(error = %err, "failed to load persisted session");
                None
            }
        }
    }
}

/// Normalize a who-am-I payload into an authorized session
///
/// Raw identity records carry no expiry; they get the fallback TTL. The
/// member-vs-organization classification already happened at the decode
/// boundary.
fn normalize(payload: AuthUserPayload) -> AuthorizedSession {
    match payload {
        AuthUserPayload::Envelope(authorized) => authorized,
        AuthUserPayload::Raw(identity) => AuthorizedSession {
            identity,
            expires_at: Utc::now() + Duration::hours(RAW_IDENTITY_SESSION_TTL_HOURS),
        },
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for session::validator.
    use std::sync::atomic::Ordering;

    use opencircle_domain::Role;

    use super::*;
    use crate::test_support::{
        member_identity, member_session, CountingCache, MemorySessionStorage, MockGateway,
    };

    fn new_validator() -> (SessionValidator, Arc<AuthStore>, Arc<MockGateway>) {
        let store = Arc::new(AuthStore::new(
            Arc::new(MemorySessionStorage::default()),
            Arc::new(CountingCache::default()),
        ));
        let gateway = Arc::new(MockGateway::default());
        let validator = SessionValidator::new(store.clone(), gateway.clone());
        (validator, store, gateway)
    }

    /// Validates `SessionValidator::validate_session` behavior for the
    /// unauthenticated short-circuit scenario.
    ///
    /// Assertions:
    /// - Ensures the result is `Invalid`.
    /// - Ensures zero who-am-I calls were made.
    #[tokio::test]
    async fn test_unauthenticated_short_circuits_without_network() {
        let (validator, _, gateway) = new_validator();

        let result = validator.validate_session().await;

        assert!(matches!(result, SessionValidation::Invalid));
        assert_eq!(gateway.auth_user_calls.load(Ordering::SeqCst), 0);
    }

    /// Validates `SessionValidator::validate_session` behavior for the
    /// confirmed session scenario.
    ///
    /// Assertions:
    /// - Ensures the result is `Valid`.
    /// - Ensures the store holds the freshly confirmed identity.
    #[tokio::test]
    async fn test_confirmed_session_refreshes_store() {
        let (validator, store, gateway) = new_validator();
        store.login(member_session()).await;
        gateway.push_auth_user(Ok(Some(AuthUserPayload::Envelope(member_session()))));

        let result = validator.validate_session().await;

        assert!(result.is_valid());
        assert!(store.is_authenticated());
    }

    /// Validates `SessionValidator::validate_session` behavior for the raw
    /// identity normalization scenario.
    ///
    /// Assertions:
    /// - Ensures a bare identity record is wrapped with the fallback TTL.
    #[tokio::test]
    async fn test_raw_identity_gets_fallback_ttl() {
        let (validator, store, gateway) = new_validator();
        store.login(member_session()).await;
        gateway.push_auth_user(Ok(Some(AuthUserPayload::Raw(member_identity(false, true)))));

        let result = validator.validate_session().await;

        assert!(result.is_valid());
        let session = store.session();
        let ttl = session.seconds_until_expiry().unwrap();
        // 24h fallback, allowing a little slack for test execution time
        assert!(ttl > 24 * 3600 - 60 && ttl <= 24 * 3600);
        assert_eq!(session.identity().unwrap().role(), Role::Member);
    }

    /// Validates `SessionValidator::validate_session` behavior for the
    /// empty who-am-I result scenario.
    ///
    /// Assertions:
    /// - Ensures the store is cleared.
    /// - Ensures the result is `Invalid`.
    #[tokio::test]
    async fn test_empty_result_forces_logout() {
        let (validator, store, gateway) = new_validator();
        store.login(member_session()).await;
        gateway.push_auth_user(Ok(None));

        let result = validator.validate_session().await;

        assert!(matches!(result, SessionValidation::Invalid));
        assert!(!store.is_authenticated());
    }

    /// Validates `SessionValidator::validate_session` behavior for the
    /// fail-closed network error scenario.
    ///
    /// Assertions:
    /// - Ensures a network error clears the session under `FailClosed`.
    /// - Ensures the error is surfaced in the result.
    #[tokio::test]
    async fn test_network_error_fails_closed() {
        let (validator, store, gateway) = new_validator();
        store.login(member_session()).await;
        gateway.push_auth_user(Err(OpenCircleError::Network("connection reset".into())));

        let result = validator.validate_session().await;

        assert!(matches!(result, SessionValidation::Failed(_)));
        assert!(!store.is_authenticated());
    }

    /// Validates `FailurePolicy::KeepOnTransient` behavior for the periodic
    /// check scenarios.
    ///
    /// Assertions:
    /// - Ensures a transient error keeps the local session.
    /// - Ensures a definitive rejection still clears it.
    #[tokio::test]
    async fn test_keep_on_transient_policy() {
        let (validator, store, gateway) = new_validator();
        store.login(member_session()).await;

        gateway.push_auth_user(Err(OpenCircleError::Server("502".into())));
        let result =
            validator.validate_session_with_policy(FailurePolicy::KeepOnTransient).await;
        assert!(matches!(result, SessionValidation::Failed(_)));
        assert!(store.is_authenticated(), "transient failure must not clear the session");

        gateway.push_auth_user(Err(OpenCircleError::Rejected("session revoked".into())));
        let result =
            validator.validate_session_with_policy(FailurePolicy::KeepOnTransient).await;
        assert!(matches!(result, SessionValidation::Failed(_)));
        assert!(!store.is_authenticated(), "definitive rejection must clear the session");
    }

    /// Validates the logout/in-flight-check race guard scenario.
    ///
    /// Assertions:
    /// - Ensures a check that resolves after a logout does not repopulate
    ///   the store.
    #[tokio::test]
    async fn test_logout_during_check_discards_result() {
        let (validator, store, gateway) = new_validator();
        store.login(member_session()).await;

        // The gateway response is already queued, but the logout lands
        // before the write-back (epoch bump), so the result is discarded.
        gateway.push_auth_user(Ok(Some(AuthUserPayload::Envelope(member_session()))));
        let epoch = store.epoch();
        store.logout().await;

        assert!(!store.login_if_epoch(member_session(), epoch).await);
        assert!(!store.is_authenticated());

        // A fresh validation still behaves normally afterwards.
        let result = validator.validate_session().await;
        assert!(matches!(result, SessionValidation::Invalid));
    }

    /// Validates `SessionValidator::sign_out` behavior for the best-effort
    /// backend logout scenario.
    ///
    /// Assertions:
    /// - Ensures local clearing proceeds when the backend call fails.
    /// - Ensures the backend endpoint was attempted exactly once.
    #[tokio::test]
    async fn test_sign_out_clears_locally_despite_backend_failure() {
        let (validator, store, gateway) = new_validator();
        store.login(member_session()).await;
        *gateway.sign_out_result.lock().unwrap() =
            Some(OpenCircleError::Network("unreachable".into()));

        validator.sign_out().await;

        assert!(!store.is_authenticated());
        assert_eq!(gateway.sign_out_calls.load(Ordering::SeqCst), 1);
    }

    /// Validates `SessionValidator::bootstrap` behavior for the cold-start
    /// scenario.
    ///
    /// Assertions:
    /// - Ensures an empty store yields `Invalid` with no network call.
    #[tokio::test]
    async fn test_bootstrap_without_snapshot() {
        let (validator, _, gateway) = new_validator();

        let result = validator.bootstrap().await;

        assert!(matches!(result, SessionValidation::Invalid));
        assert_eq!(gateway.auth_user_calls.load(Ordering::SeqCst), 0);
    }

    /// Validates `SessionValidator::bootstrap` behavior for the rehydration
    /// scenario.
    ///
    /// Assertions:
    /// - Ensures a persisted snapshot is restored and then revalidated
    ///   against the backend.
    #[tokio::test]
    async fn test_bootstrap_restores_and_validates() {
        use crate::session::ports::SessionStorage as _;

        // Simulate a process restart: the snapshot is on disk, the new
        // store starts anonymous.
        let storage = Arc::new(MemorySessionStorage::default());
        storage.persist(&member_session()).await.unwrap();

        let store = Arc::new(AuthStore::new(storage, Arc::new(CountingCache::default())));
        let gateway = Arc::new(MockGateway::default());
        let validator = SessionValidator::new(store.clone(), gateway.clone());
        gateway.push_auth_user(Ok(Some(AuthUserPayload::Envelope(member_session()))));

        let result = validator.bootstrap().await;

        assert!(result.is_valid());
        assert!(store.is_authenticated());
        assert_eq!(gateway.auth_user_calls.load(Ordering::SeqCst), 1);
    }
}
