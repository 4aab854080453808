//! Mock implementations of core ports for unit tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use opencircle_domain::{
    AccountType, AuthUserPayload, AuthorizedSession, Credentials, Identity, LoginOutcome,
    MemberProfile, OpenCircleError, OrganizationProfile, Result, Role,
};

use crate::session::ports::{AccountGateway, RequestCache, SessionStorage};

/// In-memory session storage mock
#[derive(Default)]
pub(crate) struct MemorySessionStorage {
    snapshot: Mutex<Option<AuthorizedSession>>,
    pub clear_count: AtomicUsize,
}

#[async_trait]
impl SessionStorage for MemorySessionStorage {
    async fn persist(&self, snapshot: &AuthorizedSession) -> Result<()> {
        *self.snapshot.lock().unwrap() = Some(snapshot.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Option<AuthorizedSession>> {
        Ok(self.snapshot.lock().unwrap().clone())
    }

    async fn clear_all(&self) -> Result<()> {
        self.clear_count.fetch_add(1, Ordering::SeqCst);
        *self.snapshot.lock().unwrap() = None;
        Ok(())
    }
}

/// Request cache mock that counts invalidations
#[derive(Default)]
pub(crate) struct CountingCache {
    pub invalidations: AtomicUsize,
}

impl RequestCache for CountingCache {
    fn invalidate_all(&self) {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
    }
}

/// Scripted account gateway mock
///
/// Each call pops the next scripted response; call counts are recorded so
/// tests can assert on network traffic (or the absence of it).
#[derive(Default)]
pub(crate) struct MockGateway {
    pub sign_in_responses: Mutex<VecDeque<Result<LoginOutcome>>>,
    pub auth_user_responses: Mutex<VecDeque<Result<Option<AuthUserPayload>>>>,
    pub verify_responses: Mutex<VecDeque<Result<LoginOutcome>>>,
    pub sign_out_result: Mutex<Option<OpenCircleError>>,
    pub auth_user_calls: AtomicUsize,
    pub sign_out_calls: AtomicUsize,
}

impl MockGateway {
    pub fn push_auth_user(&self, response: Result<Option<AuthUserPayload>>) {
        self.auth_user_responses.lock().unwrap().push_back(response);
    }

    pub fn push_sign_in(&self, response: Result<LoginOutcome>) {
        self.sign_in_responses.lock().unwrap().push_back(response);
    }

    pub fn push_verify(&self, response: Result<LoginOutcome>) {
        self.verify_responses.lock().unwrap().push_back(response);
    }
}

#[async_trait]
impl AccountGateway for MockGateway {
    async fn sign_in(
        &self,
        _account_type: AccountType,
        _credentials: &Credentials,
    ) -> Result<LoginOutcome> {
        self.sign_in_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(OpenCircleError::Internal("no scripted sign_in response".into())))
    }

    async fn fetch_auth_user(&self) -> Result<Option<AuthUserPayload>> {
        self.auth_user_calls.fetch_add(1, Ordering::SeqCst);
        self.auth_user_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(OpenCircleError::Internal("no scripted auth_user response".into())))
    }

    async fn sign_out(&self) -> Result<()> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        match self.sign_out_result.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn verify_two_factor(
        &self,
        _account_type: AccountType,
        _identifier: &str,
        _code: &str,
    ) -> Result<LoginOutcome> {
        self.verify_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(OpenCircleError::Internal("no scripted verify response".into())))
    }
}

/// Member fixture with configurable 2FA flags
pub(crate) fn member_identity(two_factor_enabled: bool, bypass_two_factor: bool) -> Identity {
    Identity::Member(MemberProfile {
        id: 1,
        account_id: 10,
        first_name: "Ada".into(),
        last_name: "Osei".into(),
        email: "ada@example.com".into(),
        username: "ada".into(),
        bio: None,
        profile_pic: None,
        uuid: uuid::Uuid::nil(),
        role: Role::Member,
        two_factor_enabled,
        bypass_two_factor,
        membership_status: Some("active".into()),
        account_status: None,
        avatar_url: None,
    })
}

/// Organization fixture with configurable 2FA flags
pub(crate) fn organization_identity(
    two_factor_enabled: bool,
    bypass_two_factor: bool,
) -> Identity {
    Identity::Organization(OrganizationProfile {
        id: 2,
        account_id: 20,
        name: "Harbor Collective".into(),
        email: "hello@harbor.example".into(),
        username: "harbor".into(),
        logo: None,
        category: Some("community".into()),
        description: None,
        uuid: uuid::Uuid::nil(),
        role: Role::Organization,
        two_factor_enabled,
        bypass_two_factor,
        membership_status: Some("active".into()),
        account_status: None,
        avatar_url: None,
    })
}

/// Authorized member session fixture (2FA off, bypass on)
pub(crate) fn member_session() -> AuthorizedSession {
    AuthorizedSession {
        identity: member_identity(false, true),
        expires_at: Utc::now() + Duration::hours(24),
    }
}
