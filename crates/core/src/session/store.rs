//! Auth store
//!
//! Single process-wide container for the local [`Session`]:
//! - change notification for interested observers (UI shells re-render on
//!   change) via a `tokio::sync::watch` channel
//! - synchronous write-through persistence of the authenticated snapshot
//! - broad invalidation of persisted storage and the request cache on
//!   logout
//!
//! The store is constructed explicitly and injected wherever it is needed;
//! there is no module-level singleton.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use opencircle_domain::{AuthorizedSession, Identity, Session};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::ports::{RequestCache, SessionStorage};

/// Process-wide session state with subscriber notification
pub struct AuthStore {
    session: watch::Sender<Session>,
    /// Generation counter, bumped by every logout. Hydration attempts
    /// record the epoch they started against and discard write-backs whose
    /// epoch is stale, closing the logout/in-flight-check race.
    epoch: AtomicU64,
    storage: Arc<dyn SessionStorage>,
    cache: Arc<dyn RequestCache>,
}

impl AuthStore {
    /// Create a new store in the anonymous state
    ///
    /// # Arguments
    /// * `storage` - Persisted session storage (cleared wholesale on logout)
    /// * `cache` - Request cache collaborator (invalidated on logout)
    #[must_use]
    pub fn new(storage: Arc<dyn SessionStorage>, cache: Arc<dyn RequestCache>) -> Self {
        let (session, _) = watch::channel(Session::Anonymous);
        Self { session, epoch: AtomicU64::new(0), storage, cache }
    }

    /// Current session snapshot
    #[must_use]
    pub fn session(&self) -> Session {
        self.session.borrow().clone()
    }

    /// Whether an identity is currently established
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.borrow().is_authenticated()
    }

    /// Current identity, if any
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.session.borrow().identity().cloned()
    }

    /// Subscribe to session changes
    ///
    /// The receiver observes every `login`/`logout` transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.session.subscribe()
    }

    /// Current session generation
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Establish an authenticated session
    ///
    /// Sets the in-memory state first, then persists the snapshot before
    /// returning. A persistence failure is logged and does not undo the
    /// in-memory transition: callers own backend synchronization, the store
    /// owns local state.
    pub async fn login(&self, authorized: AuthorizedSession) {
        self.session.send_replace(Session::from(authorized.clone()));
        info!(role = %authorized.identity.role(), "session established");

        if let Err(err) = self.storage.persist(&authorized).await {
            warn!(error = %err, "failed to persist session snapshot");
        }
    }

    /// Establish an authenticated session only if the store's epoch still
    /// matches `epoch`
    ///
    /// # Returns
    /// `false` when a logout happened since `epoch` was read; the
    /// write-back is discarded.
    pub async fn login_if_epoch(&self, authorized: AuthorizedSession, epoch: u64) -> bool {
        if self.epoch() != epoch {
            debug!("discarding stale session write-back");
            return false;
        }
        self.login(authorized).await;
        true
    }

    /// Seed the in-memory session from a persisted snapshot
    ///
    /// Used at boot before the first validation; does not write storage
    /// back.
    pub fn restore(&self, authorized: AuthorizedSession) {
        self.session.send_replace(Session::from(authorized));
        debug!("session restored from persisted snapshot");
    }

    /// Clear the session
    ///
    /// Transitions to `Anonymous`, bumps the epoch, wipes all persisted
    /// client storage and invalidates the request cache. Idempotent; a
    /// storage failure is logged and does not keep the local state alive.
    /// Purely local: invoking the backend logout endpoint is the
    /// validator's job.
    pub async fn logout(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.session.send_replace(Session::Anonymous);

        if let Err(err) = self.storage.clear_all().await {
            warn!(error = %err, "failed to clear persisted client storage");
        }
        self.cache.invalidate_all();
        info!("session cleared");
    }

    /// Load the persisted snapshot, if any
    ///
    /// # Errors
    /// Returns error if the backing store is unreadable
    pub async fn load_persisted(&self) -> opencircle_domain::Result<Option<AuthorizedSession>> {
        self.storage.load().await
    }

    /// Invalidate the request cache without touching session state
    ///
    /// The login flow uses this to drop data cached for a previous session
    /// before committing a new one.
    pub fn invalidate_cache(&self) {
        self.cache.invalidate_all();
    }
}

impl std::fmt::Debug for AuthStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthStore")
            .field("authenticated", &self.is_authenticated())
            .field("epoch", &self.epoch())
            .finish()
    }
}
