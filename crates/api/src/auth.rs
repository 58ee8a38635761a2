//! Request identity extracted from trusted upstream headers.
//!
//! Authentication itself lives at the edge (reverse proxy / auth service);
//! this server trusts the `x-user-id` and `x-user-role` headers it is
//! handed.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::UserId;

use crate::error::ApiError;

/// The caller's identity for this request.
#[derive(Debug, Clone, Copy)]
pub struct Identity {
    pub user_id: UserId,
    pub is_admin: bool,
}

impl Identity {
    /// Rejects non-admin callers.
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(ApiError::Forbidden("admin access required".to_string()))
        }
    }
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("missing x-user-id header".to_string()))?
            .parse::<UserId>()
            .map_err(|_| ApiError::Unauthorized("malformed x-user-id header".to_string()))?;

        let is_admin = parts
            .headers
            .get("x-user-role")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|role| role == "admin");

        Ok(Identity { user_id, is_admin })
    }
}
