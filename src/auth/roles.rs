//! Role extractors
//!
//! Build on [`RequireAuth`] and load the caller's stored profile. A token
//! without a profile can only reach `/me`.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use std::sync::Arc;

use super::RequireAuth;
use crate::app::AppState;
use crate::domain::{User, UserRole};
use crate::error::ApiError;
use crate::repo;

/// Authenticated caller with a stored profile
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl std::ops::Deref for CurrentUser {
    type Target = User;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let auth = RequireAuth::from_request_parts(parts, state).await?;

        let mut conn = state.db.acquire().await?;
        let user = repo::users::find(&mut conn, auth.user_id)
            .await?
            .ok_or_else(|| ApiError::forbidden("Create your profile before using this endpoint"))?;

        Ok(CurrentUser(user))
    }
}

async fn require_role(
    parts: &mut Parts,
    state: &Arc<AppState>,
    role: UserRole,
) -> Result<User, ApiError> {
    let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
    if user.role != role {
        tracing::warn!(user_id = %user.id, required = %role, "Role check failed");
        return Err(ApiError::forbidden(format!("This action requires the {} role", role)));
    }
    Ok(user)
}

/// Caller with the council role
#[derive(Debug, Clone)]
pub struct RequireCouncil(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for RequireCouncil {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        require_role(parts, state, UserRole::Council).await.map(Self)
    }
}

/// Caller with the contractor role
#[derive(Debug, Clone)]
pub struct RequireContractor(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for RequireContractor {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        require_role(parts, state, UserRole::Contractor).await.map(Self)
    }
}
