pub mod activity;
pub mod bids;
pub mod dashboard;
pub mod health;
pub mod me;
pub mod packages;
pub mod projects;
pub mod reports;
pub mod teams;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

use crate::app::AppState;

/// Build the API router with all routes
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Public routes
        .route("/health", get(health::health_check))
        // Identity
        .route("/me", get(me::get_me))
        .route("/me/profile", put(me::upsert_profile))
        .route("/activity", get(activity::list_activity))
        .route("/dashboard", get(dashboard::get_dashboard))
        .route("/analytics/bids", get(dashboard::bid_analytics))
        .route("/awards", get(dashboard::list_awards))
        // Projects
        .route(
            "/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route("/projects/available", get(projects::list_available))
        .route(
            "/projects/:project_id",
            get(projects::get_project)
                .put(projects::update_project)
                .delete(projects::delete_project),
        )
        // Packages
        .route(
            "/projects/:project_id/packages",
            get(packages::list_packages).post(packages::create_package),
        )
        .route(
            "/packages/:package_id",
            get(packages::get_package)
                .put(packages::update_package)
                .delete(packages::delete_package),
        )
        // Bids
        .route(
            "/packages/:package_id/bids",
            get(bids::list_package_bids).post(bids::create_bid),
        )
        .route("/bids", get(bids::list_my_bids))
        .route("/bids/review", get(bids::review_queue))
        .route(
            "/bids/:bid_id",
            get(bids::get_bid).put(bids::update_bid).delete(bids::delete_bid),
        )
        .route("/bids/:bid_id/review", get(bids::get_review_detail))
        .route("/bids/:bid_id/submit", post(bids::submit_bid))
        .route("/bids/:bid_id/withdraw", post(bids::withdraw_bid))
        .route("/bids/:bid_id/start-review", post(bids::start_review))
        .route("/bids/:bid_id/accept", post(bids::accept_bid))
        .route("/bids/:bid_id/reject", post(bids::reject_bid))
        // Teams
        .route("/teams", get(teams::list_teams).post(teams::create_team))
        .route(
            "/teams/:team_id",
            get(teams::get_team).put(teams::update_team),
        )
        .route("/teams/:team_id/members", post(teams::add_member))
        .route(
            "/teams/:team_id/members/:contractor_id",
            delete(teams::remove_member),
        )
        // Reports
        .route(
            "/projects/:project_id/reports/:kind",
            get(reports::project_report),
        )
        .route(
            "/reports",
            get(reports::list_reports).post(reports::generate_report),
        )
        .route(
            "/reports/:report_id",
            get(reports::get_report)
                .put(reports::update_report)
                .delete(reports::delete_report),
        )
}
