//! Identity extraction and the role policy.
//!
//! Authentication itself happens upstream: the gateway verifies the session
//! and forwards `x-user-id` and `x-user-role` headers. This core trusts
//! those values unconditionally and only enforces the role policy.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::UserId;

use crate::error::ApiError;

/// Role of the authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

impl Role {
    fn parse(value: &str) -> Option<Role> {
        match value.to_ascii_lowercase().as_str() {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    /// Returns the role name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The authenticated caller, as asserted by the gateway.
#[derive(Debug, Clone, Copy)]
pub struct Identity {
    pub user_id: UserId,
    pub role: Role,
}

impl<S: Send + Sync> FromRequestParts<S> for Identity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
        };

        let user_id = header("x-user-id")
            .ok_or_else(|| {
                ApiError::Unauthorized("Login first to access this resource.".to_string())
            })?
            .parse::<UserId>()
            .map_err(|_| ApiError::Unauthorized("Invalid user identity.".to_string()))?;

        let role = header("x-user-role")
            .and_then(Role::parse)
            .ok_or_else(|| ApiError::Unauthorized("Invalid user role.".to_string()))?;

        Ok(Identity { user_id, role })
    }
}

/// Allows the request through only when the caller holds one of `roles`.
pub fn require_role(identity: &Identity, roles: &[Role]) -> Result<(), ApiError> {
    if roles.contains(&identity.role) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!(
            "Role ({}) is not allowed to access this resource.",
            identity.role
        )))
    }
}
