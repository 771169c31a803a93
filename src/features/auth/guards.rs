//! Role-based authorization guards.
//!
//! Guards extract the authenticated user from request extensions and verify
//! the required role. Ownership checks for per-order operations stay in the
//! handlers, since they need the order row.

use crate::core::error::AppError;
use crate::features::auth::model::AuthenticatedUser;
use axum::{extract::FromRequestParts, http::request::Parts};

/// Guard for admin-only operations.
///
/// # Example
/// ```ignore
/// pub async fn handler(RequireAdmin(user): RequireAdmin) { ... }
/// ```
pub struct RequireAdmin(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or_else(|| AppError::Auth("Not authorized, no token".to_string()))?;

        if !user.is_admin() {
            return Err(AppError::Unauthorized(
                "Not authorized as an admin".to_string(),
            ));
        }

        Ok(RequireAdmin(user.clone()))
    }
}
