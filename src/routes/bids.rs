//! Bid routes
//!
//! Thin wrappers over [`BidService`](crate::services::BidService); the
//! service owns validation, ownership checks and side effects.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{Created, DataResponse, NoContent, Paginated, PaginationParams};
use crate::app::AppState;
use crate::auth::{CurrentUser, RequireContractor, RequireCouncil};
use crate::domain::{Bid, BidQuery, BidReviewResponse, CreateBidRequest, ReviewBidRequest, UpdateBidRequest};
use crate::error::ApiResult;
use crate::workflow::AwardOutcome;

/// Review notes are optional and so is the body carrying them.
fn review_notes(body: Option<Json<ReviewBidRequest>>) -> Option<String> {
    body.and_then(|Json(req)| req.notes)
}

/// POST /packages/:package_id/bids
pub async fn create_bid(
    RequireContractor(contractor): RequireContractor,
    State(state): State<Arc<AppState>>,
    Path(package_id): Path<Uuid>,
    Json(req): Json<CreateBidRequest>,
) -> ApiResult<Created<Bid>> {
    tracing::info!(
        user_id = %contractor.id,
        package_id = %package_id,
        bid_amount = %req.bid_amount,
        as_draft = req.as_draft,
        "Creating bid"
    );
    let bid = state.bids.create(&contractor, package_id, req).await?;
    Ok(Created(bid))
}

/// GET /packages/:package_id/bids
///
/// Cheapest first, for the owning council.
pub async fn list_package_bids(
    RequireCouncil(council): RequireCouncil,
    State(state): State<Arc<AppState>>,
    Path(package_id): Path<Uuid>,
) -> ApiResult<DataResponse<Vec<Bid>>> {
    let bids = state.bids.list_for_package(&council, package_id).await?;
    Ok(DataResponse::new(bids))
}

/// GET /bids
pub async fn list_my_bids(
    RequireContractor(contractor): RequireContractor,
    State(state): State<Arc<AppState>>,
    Query(query): Query<BidQuery>,
    Query(pagination): Query<PaginationParams>,
) -> ApiResult<Paginated<Bid>> {
    let (limit, offset) = pagination.limit_offset();
    let (bids, total) = state.bids.list_mine(&contractor, &query, limit, offset).await?;
    Ok(Paginated::new(bids, &pagination, total))
}

/// GET /bids/review
pub async fn review_queue(
    RequireCouncil(council): RequireCouncil,
    State(state): State<Arc<AppState>>,
    Query(query): Query<BidQuery>,
    Query(pagination): Query<PaginationParams>,
) -> ApiResult<Paginated<Bid>> {
    let (limit, offset) = pagination.limit_offset();
    let (bids, total) = state.bids.review_queue(&council, &query, limit, offset).await?;
    Ok(Paginated::new(bids, &pagination, total))
}

/// GET /bids/:bid_id
pub async fn get_bid(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(bid_id): Path<Uuid>,
) -> ApiResult<DataResponse<Bid>> {
    Ok(DataResponse::new(state.bids.get(&user, bid_id).await?))
}

/// GET /bids/:bid_id/review
pub async fn get_review_detail(
    RequireCouncil(council): RequireCouncil,
    State(state): State<Arc<AppState>>,
    Path(bid_id): Path<Uuid>,
) -> ApiResult<DataResponse<BidReviewResponse>> {
    Ok(DataResponse::new(state.bids.review_detail(&council, bid_id).await?))
}

/// PUT /bids/:bid_id
pub async fn update_bid(
    RequireContractor(contractor): RequireContractor,
    State(state): State<Arc<AppState>>,
    Path(bid_id): Path<Uuid>,
    Json(req): Json<UpdateBidRequest>,
) -> ApiResult<DataResponse<Bid>> {
    Ok(DataResponse::new(state.bids.edit(&contractor, bid_id, req).await?))
}

/// DELETE /bids/:bid_id
pub async fn delete_bid(
    RequireContractor(contractor): RequireContractor,
    State(state): State<Arc<AppState>>,
    Path(bid_id): Path<Uuid>,
) -> ApiResult<NoContent> {
    state.bids.delete(&contractor, bid_id).await?;
    Ok(NoContent)
}

/// POST /bids/:bid_id/submit
pub async fn submit_bid(
    RequireContractor(contractor): RequireContractor,
    State(state): State<Arc<AppState>>,
    Path(bid_id): Path<Uuid>,
) -> ApiResult<DataResponse<Bid>> {
    Ok(DataResponse::new(state.bids.submit(&contractor, bid_id).await?))
}

/// POST /bids/:bid_id/withdraw
pub async fn withdraw_bid(
    RequireContractor(contractor): RequireContractor,
    State(state): State<Arc<AppState>>,
    Path(bid_id): Path<Uuid>,
) -> ApiResult<DataResponse<Bid>> {
    Ok(DataResponse::new(state.bids.withdraw(&contractor, bid_id).await?))
}

/// POST /bids/:bid_id/start-review
pub async fn start_review(
    RequireCouncil(council): RequireCouncil,
    State(state): State<Arc<AppState>>,
    Path(bid_id): Path<Uuid>,
    body: Option<Json<ReviewBidRequest>>,
) -> ApiResult<DataResponse<Bid>> {
    let bid = state.bids.start_review(&council, bid_id, review_notes(body)).await?;
    Ok(DataResponse::new(bid))
}

/// POST /bids/:bid_id/accept
///
/// Returns the accepted bid, the awarded package and the team formation.
pub async fn accept_bid(
    RequireCouncil(council): RequireCouncil,
    State(state): State<Arc<AppState>>,
    Path(bid_id): Path<Uuid>,
    body: Option<Json<ReviewBidRequest>>,
) -> ApiResult<DataResponse<AwardOutcome>> {
    tracing::info!(user_id = %council.id, bid_id = %bid_id, "Accepting bid");
    let outcome = state.bids.accept(&council, bid_id, review_notes(body)).await?;
    Ok(DataResponse::new(outcome))
}

/// POST /bids/:bid_id/reject
pub async fn reject_bid(
    RequireCouncil(council): RequireCouncil,
    State(state): State<Arc<AppState>>,
    Path(bid_id): Path<Uuid>,
    body: Option<Json<ReviewBidRequest>>,
) -> ApiResult<DataResponse<Bid>> {
    tracing::info!(user_id = %council.id, bid_id = %bid_id, "Rejecting bid");
    let bid = state.bids.reject(&council, bid_id, review_notes(body)).await?;
    Ok(DataResponse::new(bid))
}
