//! Domain types and models

pub mod identity;
pub mod login;
pub mod session;

pub use identity::{Identity, MemberProfile, OrganizationProfile, Role};
pub use login::{
    AccountType, AuthorizedSession, Credentials, LoginOutcome, LoginStep, TwoFactorChallenge,
    TwoFactorPolicy,
};
pub use session::{AuthUserPayload, Session};
