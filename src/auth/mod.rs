pub mod authorize;
pub mod jwt;
pub mod password;
pub mod session;

use axum::{extract::FromRequestParts, http::StatusCode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Moderator,
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Moderator => "moderator",
            Role::Member => "member",
        }
    }

    /// Roles allowed to moderate content they do not own.
    pub const ELEVATED: &'static [Role] = &[Role::Admin, Role::Moderator];
}

impl TryFrom<&str> for Role {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "admin" => Ok(Role::Admin),
            "moderator" => Ok(Role::Moderator),
            "member" => Ok(Role::Member),
            _ => Err(()),
        }
    }
}

/// Purpose tag embedded in every token. A refresh token presented where an
/// access token is expected fails validation on this tag alone.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenPurpose {
    Access,
    Refresh,
    Email,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // account email
    pub exp: usize,  // expiry (unix)
    pub iat: usize,  // issued at
    pub jti: Uuid,   // unique per issue; iat alone is second-granular
    pub scope: TokenPurpose,
}

/// Authenticated identity resolved from a bearer token. Built once per
/// request by the session resolver; everything past the resolver trusts it.
#[derive(Debug, Clone)]
pub struct Principal {
    pub account_id: Uuid,
    pub role: Role,
    pub active: bool,
    pub confirmed: bool,
}

impl Principal {
    pub fn owns(&self, owner_id: Uuid) -> bool {
        self.account_id == owner_id
    }
}

// Helper extractor: pull the resolved Principal from request extensions.
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or((StatusCode::UNAUTHORIZED, "No principal in request"))
    }
}

#[derive(Debug)]
pub struct TokenBundle {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: usize,
}

#[cfg(test)]
mod tests {
    use super::Role;

    #[test]
    fn role_string_roundtrip() {
        assert_eq!(Role::Admin.as_str(), "admin");
        assert_eq!(Role::Moderator.as_str(), "moderator");
        assert_eq!(Role::Member.as_str(), "member");

        assert_eq!(Role::try_from("admin"), Ok(Role::Admin));
        assert_eq!(Role::try_from("moderator"), Ok(Role::Moderator));
        assert_eq!(Role::try_from("member"), Ok(Role::Member));
        assert!(Role::try_from("manager").is_err());
    }

    #[test]
    fn elevated_roles_exclude_member() {
        assert!(Role::ELEVATED.contains(&Role::Admin));
        assert!(Role::ELEVATED.contains(&Role::Moderator));
        assert!(!Role::ELEVATED.contains(&Role::Member));
    }
}
