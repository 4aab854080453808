//! Identity types
//!
//! The authenticated principal is either a member or an organization. The
//! backend discriminates the two with a role field; locally the distinction
//! is a tagged union so every consumer matches exhaustively.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, BoolFromInt};
use uuid::Uuid;

use crate::constants::{MEMBER_PROFILE_ROUTE, ORGANIZATION_PROFILE_ROUTE};

/// Account role discriminator
///
/// `Default` is `Member`: raw backend identity records that omit the role
/// field are classified as members. This is the explicit form of the
/// fallback rather than an implicit branch in decode code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Member,
    Organization,
}

impl Role {
    /// Wire value used by the backend
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Organization => "organization",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Member account profile
///
/// The 2FA flags arrive as numeric booleans (`0`/`1`) on the wire.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberProfile {
    pub id: i64,
    pub account_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    pub bio: Option<String>,
    pub profile_pic: Option<String>,
    pub uuid: Uuid,
    #[serde(default)]
    pub role: Role,
    #[serde_as(as = "BoolFromInt")]
    pub two_factor_enabled: bool,
    #[serde_as(as = "BoolFromInt")]
    pub bypass_two_factor: bool,
    pub membership_status: Option<String>,
    pub account_status: Option<String>,
    pub avatar_url: Option<String>,
}

/// Organization account profile
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationProfile {
    pub id: i64,
    pub account_id: i64,
    pub name: String,
    pub email: String,
    pub username: String,
    pub logo: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub uuid: Uuid,
    #[serde(default = "organization_role")]
    pub role: Role,
    #[serde_as(as = "BoolFromInt")]
    pub two_factor_enabled: bool,
    #[serde_as(as = "BoolFromInt")]
    pub bypass_two_factor: bool,
    pub membership_status: Option<String>,
    pub account_status: Option<String>,
    pub avatar_url: Option<String>,
}

fn organization_role() -> Role {
    Role::Organization
}

/// The authenticated principal
///
/// Exactly one variant is active per session; the embedded profile's role
/// field always agrees with the variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "profile", rename_all = "snake_case")]
pub enum Identity {
    Member(MemberProfile),
    Organization(OrganizationProfile),
}

impl Identity {
    #[must_use]
    pub fn role(&self) -> Role {
        match self {
            Self::Member(_) => Role::Member,
            Self::Organization(_) => Role::Organization,
        }
    }

    #[must_use]
    pub fn username(&self) -> &str {
        match self {
            Self::Member(m) => &m.username,
            Self::Organization(o) => &o.username,
        }
    }

    #[must_use]
    pub fn email(&self) -> &str {
        match self {
            Self::Member(m) => &m.email,
            Self::Organization(o) => &o.email,
        }
    }

    #[must_use]
    pub fn uuid(&self) -> Uuid {
        match self {
            Self::Member(m) => m.uuid,
            Self::Organization(o) => o.uuid,
        }
    }

    #[must_use]
    pub fn two_factor_enabled(&self) -> bool {
        match self {
            Self::Member(m) => m.two_factor_enabled,
            Self::Organization(o) => o.two_factor_enabled,
        }
    }

    #[must_use]
    pub fn bypass_two_factor(&self) -> bool {
        match self {
            Self::Member(m) => m.bypass_two_factor,
            Self::Organization(o) => o.bypass_two_factor,
        }
    }

    /// Profile home route for the principal's role
    #[must_use]
    pub fn profile_home(&self) -> &'static str {
        match self {
            Self::Member(_) => MEMBER_PROFILE_ROUTE,
            Self::Organization(_) => ORGANIZATION_PROFILE_ROUTE,
        }
    }
}
