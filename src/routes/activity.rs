use axum::extract::{Query, State};
use std::sync::Arc;

use crate::api::{Paginated, PaginationParams};
use crate::app::AppState;
use crate::auth::CurrentUser;
use crate::domain::ActivityLog;
use crate::error::ApiResult;

/// GET /activity
///
/// The caller's own activity log, newest first.
pub async fn list_activity(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationParams>,
) -> ApiResult<Paginated<ActivityLog>> {
    let (limit, offset) = pagination.limit_offset();
    let (entries, total) = state.activity.list_for_user(user.id, limit, offset).await?;
    Ok(Paginated::new(entries, &pagination, total))
}
