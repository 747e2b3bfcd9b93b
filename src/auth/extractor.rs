use std::marker::PhantomData;
use std::ops::Deref;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use model::entities::user::Role;
use tracing::{debug, warn};

use super::jwt::decode_token;
use crate::error::ApiError;
use crate::schemas::AppState;

/// Named sets of roles allowed to call an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    AdminOnly,
    ManagerAndUp,
    StaffAndUp,
}

impl Policy {
    pub fn allows(self, role: Role) -> bool {
        match self {
            Policy::AdminOnly => matches!(role, Role::Admin),
            Policy::ManagerAndUp => matches!(role, Role::Admin | Role::Manager),
            Policy::StaffAndUp => matches!(role, Role::Admin | Role::Manager | Role::Staff),
        }
    }
}

/// Caller identity taken from a valid bearer token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i32,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    pub fn require(&self, policy: Policy) -> Result<(), ApiError> {
        if policy.allows(self.role) {
            Ok(())
        } else {
            warn!(
                "User {} with role {} denied by {:?}",
                self.username,
                self.role.as_str(),
                policy
            );
            Err(ApiError::Forbidden(
                "You do not have permission to perform this action.".to_string(),
            ))
        }
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthorized("Missing Authorization header."))?;
    let value = header
        .to_str()
        .map_err(|_| ApiError::unauthorized("Invalid Authorization header."))?;

    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(ApiError::unauthorized(
            "Authorization header must use the Bearer scheme.",
        )),
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = decode_token(&state.settings.jwt, token).map_err(|e| {
            warn!("Rejected bearer token: {}", e);
            ApiError::unauthorized("Invalid or expired token.")
        })?;

        let user_id = claims
            .sub
            .parse::<i32>()
            .map_err(|_| ApiError::unauthorized("Invalid or expired token."))?;

        debug!("Authenticated user {} ({})", claims.name, claims.role.as_str());
        Ok(AuthUser {
            user_id,
            username: claims.name,
            email: claims.email,
            role: claims.role,
        })
    }
}

/// Type-level [`Policy`] for [`Require`]
pub trait RolePolicy {
    const POLICY: Policy;
}

#[derive(Debug)]
pub struct AdminOnly;

#[derive(Debug)]
pub struct ManagerAndUp;

#[derive(Debug)]
pub struct StaffAndUp;

impl RolePolicy for AdminOnly {
    const POLICY: Policy = Policy::AdminOnly;
}

impl RolePolicy for ManagerAndUp {
    const POLICY: Policy = Policy::ManagerAndUp;
}

impl RolePolicy for StaffAndUp {
    const POLICY: Policy = Policy::StaffAndUp;
}

/// An authenticated caller whose role satisfies `P`.
///
/// Runs as a request-parts extractor, so the role is checked before any
/// body is read or validated.
#[derive(Debug)]
pub struct Require<P> {
    user: AuthUser,
    policy: PhantomData<P>,
}

impl<P> Deref for Require<P> {
    type Target = AuthUser;

    fn deref(&self) -> &AuthUser {
        &self.user
    }
}

#[axum::async_trait]
impl<P> FromRequestParts<AppState> for Require<P>
where
    P: RolePolicy + Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        user.require(P::POLICY)?;
        Ok(Require {
            user,
            policy: PhantomData,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_membership() {
        assert!(Policy::AdminOnly.allows(Role::Admin));
        assert!(!Policy::AdminOnly.allows(Role::Manager));

        assert!(Policy::ManagerAndUp.allows(Role::Manager));
        assert!(!Policy::ManagerAndUp.allows(Role::Staff));

        assert!(Policy::StaffAndUp.allows(Role::Staff));
        assert!(!Policy::StaffAndUp.allows(Role::Tenant));
    }

    #[test]
    fn test_role_policy_markers() {
        assert_eq!(AdminOnly::POLICY, Policy::AdminOnly);
        assert_eq!(ManagerAndUp::POLICY, Policy::ManagerAndUp);
        assert_eq!(StaffAndUp::POLICY, Policy::StaffAndUp);
    }
}
