//! Dashboards and bid analytics
//!
//! Routes load the caller's rows; the numbers come from the pure builders
//! in [`crate::reporting`].

use axum::extract::{Query, State};
use chrono::Utc;
use std::sync::Arc;

use crate::api::DataResponse;
use crate::app::AppState;
use crate::auth::{CurrentUser, RequireContractor, RequireCouncil};
use crate::domain::{AvailableProjectQuery, AwardQuery};
use crate::error::ApiResult;
use crate::reporting::dashboard::SUGGESTED_PROJECTS;
use crate::reporting::{
    AwardPortfolio, BidAnalytics, ContractorDashboard, CouncilDashboard, Dashboard,
};
use crate::repo;

/// GET /dashboard
///
/// Councils get project, package and bid counters; contractors get their
/// bidding record, suggested projects and recent awards.
pub async fn get_dashboard(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
) -> ApiResult<DataResponse<Dashboard>> {
    let mut conn = state.db.acquire().await?;

    let dashboard = if user.is_council() {
        let projects = repo::projects::all_for_council(&mut conn, user.id).await?;
        let packages = repo::packages::all_for_council(&mut conn, user.id).await?;
        let bids = repo::bids::all_for_council(&mut conn, user.id).await?;
        Dashboard::Council(CouncilDashboard::build(&projects, &packages, &bids))
    } else {
        let bids = repo::bids::all_for_contractor(&mut conn, user.id).await?;
        let (available, _) = repo::projects::list_available(
            &mut conn,
            &AvailableProjectQuery::default(),
            Utc::now(),
            SUGGESTED_PROJECTS as i64,
            0,
        )
        .await?;
        let awarded = repo::packages::awarded_to(&mut conn, user.id).await?;
        Dashboard::Contractor(ContractorDashboard::build(&bids, available, awarded))
    };

    Ok(DataResponse::new(dashboard))
}

/// GET /analytics/bids
pub async fn bid_analytics(
    RequireCouncil(council): RequireCouncil,
    State(state): State<Arc<AppState>>,
) -> ApiResult<DataResponse<BidAnalytics>> {
    let mut conn = state.db.acquire().await?;
    let bids = repo::bids::all_for_council(&mut conn, council.id).await?;
    Ok(DataResponse::new(BidAnalytics::build(&bids)))
}

/// GET /awards
///
/// The contractor's contracted packages. `status` narrows the list but not
/// the totals.
pub async fn list_awards(
    RequireContractor(contractor): RequireContractor,
    State(state): State<Arc<AppState>>,
    Query(query): Query<AwardQuery>,
) -> ApiResult<DataResponse<AwardPortfolio>> {
    let mut conn = state.db.acquire().await?;
    let awards = repo::packages::awarded_to(&mut conn, contractor.id).await?;
    Ok(DataResponse::new(AwardPortfolio::build(awards, query.status)))
}
