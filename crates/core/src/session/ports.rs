//! Ports for backend and storage collaborators
//!
//! These traits enable dependency injection and testing by abstracting
//! external dependencies (the REST backend, persisted client storage, and
//! the request/response cache owned by the embedding application).

use async_trait::async_trait;
use opencircle_domain::{
    AccountType, AuthUserPayload, AuthorizedSession, Credentials, LoginOutcome, Result,
};

/// Trait for the backend account endpoints
///
/// Implementations translate wire shapes into the domain's tagged unions;
/// everything above this boundary matches exhaustively.
#[async_trait]
pub trait AccountGateway: Send + Sync {
    /// Check credentials against the role-specific sign-in endpoint
    ///
    /// # Errors
    /// Returns error on transport failure or a non-2xx response
    async fn sign_in(
        &self,
        account_type: AccountType,
        credentials: &Credentials,
    ) -> Result<LoginOutcome>;

    /// Ask the backend who the current session belongs to
    ///
    /// # Returns
    /// `None` when the backend reports no authenticated principal
    ///
    /// # Errors
    /// Returns error on transport failure, rejection, or an undecodable body
    async fn fetch_auth_user(&self) -> Result<Option<AuthUserPayload>>;

    /// Invalidate the session server-side
    ///
    /// Best-effort from the caller's perspective; local clearing proceeds
    /// even when this fails.
    ///
    /// # Errors
    /// Returns error on transport failure or a non-2xx response
    async fn sign_out(&self) -> Result<()>;

    /// Submit a TOTP code for a pending login
    ///
    /// # Errors
    /// Returns error on transport failure or a non-2xx response
    async fn verify_two_factor(
        &self,
        account_type: AccountType,
        identifier: &str,
        code: &str,
    ) -> Result<LoginOutcome>;
}

/// Trait for persisted client-side session state
///
/// The browser-storage analog: a snapshot survives process restarts and is
/// wiped wholesale on logout.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Persist the authenticated snapshot
    ///
    /// # Errors
    /// Returns error if the write fails
    async fn persist(&self, snapshot: &AuthorizedSession) -> Result<()>;

    /// Load the persisted snapshot, if any
    ///
    /// # Errors
    /// Returns error if the backing store is unreadable
    async fn load(&self) -> Result<Option<AuthorizedSession>>;

    /// Remove every persisted key, not a scoped subset
    ///
    /// Broad invalidation keeps one account's data from leaking into the
    /// next session on a shared device.
    ///
    /// # Errors
    /// Returns error if the deletion fails
    async fn clear_all(&self) -> Result<()>;
}

/// Trait for the request/response cache collaborator
///
/// The cache is invalidated, never locked: at-most-stale consistency,
/// corrected by the periodic check or explicit action.
pub trait RequestCache: Send + Sync {
    /// Drop every cached entry
    fn invalidate_all(&self);
}

/// No-op cache for embedders without a request cache
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRequestCache;

impl RequestCache for NoopRequestCache {
    fn invalidate_all(&self) {}
}
