use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use futures_util::future::BoxFuture;
use tower::{Layer, Service};
use uuid::Uuid;

use super::{Principal, Role};
use crate::error::{AppError, AuthError};

/// Owner-or-elevated-role rule shared by every mutating content endpoint:
/// allow when the principal holds one of `allowed_roles` or owns the resource.
///
/// Activity status is not re-checked here; inactive principals never get past
/// the session resolver.
pub fn authorize(
    principal: &Principal,
    resource_owner: Uuid,
    allowed_roles: &[Role],
) -> Result<(), AuthError> {
    if allowed_roles.contains(&principal.role) || principal.owns(resource_owner) {
        return Ok(());
    }
    Err(AuthError::Forbidden)
}

/// Strict role check for account mutation (ban, role change); ownership is
/// irrelevant here.
pub fn require_role(principal: &Principal, allowed_roles: &[Role]) -> Result<(), AuthError> {
    if allowed_roles.contains(&principal.role) {
        return Ok(());
    }
    Err(AuthError::Forbidden)
}

/// Tower layer form of the strict-role check, for guarding whole routers.
#[derive(Clone)]
pub struct RequireRoleLayer {
    allowed: &'static [Role],
}

impl RequireRoleLayer {
    pub fn new(allowed: &'static [Role]) -> Self {
        Self { allowed }
    }
}

#[derive(Clone)]
pub struct RequireRole<S> {
    inner: S,
    allowed: &'static [Role],
}

impl<S> Layer<S> for RequireRoleLayer {
    type Service = RequireRole<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequireRole {
            inner,
            allowed: self.allowed,
        }
    }
}

impl<S> Service<Request<Body>> for RequireRole<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let allowed = self.allowed;

        // tower Services may be called concurrently, so clone inner
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let principal = match req.extensions().get::<Principal>() {
                Some(p) => p,
                None => {
                    return Ok(
                        AppError::unauthorized("No principal in request").into_response()
                    );
                }
            };

            if let Err(err) = require_role(principal, allowed) {
                return Ok(AppError::from(err).into_response());
            }

            inner.call(req).await
        })
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::{authorize, require_role};
    use crate::{
        auth::{Principal, Role},
        error::AuthError,
    };

    fn principal(role: Role) -> Principal {
        Principal {
            account_id: Uuid::new_v4(),
            role,
            active: true,
            confirmed: true,
        }
    }

    #[test]
    fn allows_iff_role_matches_or_owner() {
        let owner = Uuid::new_v4();
        let elevated = Role::ELEVATED;

        for role in [Role::Admin, Role::Moderator, Role::Member] {
            let p = principal(role);

            // non-owner: decision is purely role membership
            let expect_allow = elevated.contains(&role);
            assert_eq!(authorize(&p, owner, elevated).is_ok(), expect_allow);

            // owner: always allowed regardless of role
            assert!(authorize(&p, p.account_id, elevated).is_ok());
            assert!(authorize(&p, p.account_id, &[]).is_ok());
        }
    }

    #[test]
    fn denial_is_forbidden() {
        let p = principal(Role::Member);
        assert_eq!(
            authorize(&p, Uuid::new_v4(), Role::ELEVATED),
            Err(AuthError::Forbidden)
        );
    }

    #[test]
    fn strict_check_ignores_ownership() {
        let p = principal(Role::Member);
        // even "owning" the resource does not matter for strict role checks
        assert_eq!(require_role(&p, &[Role::Admin]), Err(AuthError::Forbidden));
        assert!(require_role(&principal(Role::Admin), &[Role::Admin]).is_ok());
    }
}
