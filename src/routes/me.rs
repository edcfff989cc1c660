//! Caller identity and profile

use axum::{extract::State, response::IntoResponse, Json};
use chrono::Utc;
use std::sync::Arc;

use crate::api::{Created, DataResponse};
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::{ActivityKind, MeResponse, NewActivity, UpsertProfileRequest, User};
use crate::error::{ApiError, ApiResult};
use crate::repo;

/// GET /me
pub async fn get_me(auth: RequireAuth, State(state): State<Arc<AppState>>) -> ApiResult<Json<MeResponse>> {
    let mut conn = state.db.acquire().await?;
    let profile = repo::users::find(&mut conn, auth.user_id).await?;

    Ok(Json(MeResponse {
        user_id: auth.user_id,
        email: auth.email.clone(),
        profile,
    }))
}

/// PUT /me/profile
///
/// Creates the profile on first call; afterwards updates everything except
/// the role.
pub async fn upsert_profile(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpsertProfileRequest>,
) -> ApiResult<axum::response::Response> {
    let mut conn = state.db.acquire().await?;
    let existing = repo::users::find(&mut conn, auth.user_id).await?;

    let Some(mut user) = existing else {
        req.validate(true)?;
        let role = req.role.ok_or_else(|| ApiError::invalid("role", "role is required"))?;
        let now = Utc::now();
        let mut user = User {
            id: auth.user_id,
            role,
            username: auth.default_username(),
            email: auth.email.clone(),
            full_name: String::new(),
            company_name: String::new(),
            phone: String::new(),
            address: String::new(),
            experience_years: 0,
            is_verified: false,
            created_at: now,
            updated_at: now,
        };
        req.apply(&mut user);
        let user = repo::users::insert(&mut conn, &user).await?;

        tracing::info!(user_id = %user.id, role = %user.role, "Profile created");
        state.activity.record(NewActivity::new(
            user.id,
            ActivityKind::ProfileCreated,
            format!("Registered as {}", user.role),
        ));
        return Ok(Created(user).into_response());
    };

    req.validate(false)?;
    if req.role.is_some_and(|role| role != user.role) {
        return Err(ApiError::conflict("The account role cannot be changed once set"));
    }
    req.apply(&mut user);
    let user = repo::users::update_profile(&mut conn, &user).await?;

    // Reports embed display names and experience
    let project_ids = repo::projects::ids_involving_user(&mut conn, user.id).await?;
    state.cache.invalidate_projects(&project_ids).await;

    tracing::info!(user_id = %user.id, projects = project_ids.len(), "Profile updated");
    state.activity.record(NewActivity::new(
        user.id,
        ActivityKind::ProfileUpdated,
        "Updated profile",
    ));
    Ok(DataResponse::new(user).into_response())
}
