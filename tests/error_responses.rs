//! `ApiError` to HTTP response mapping

use assert_matches::assert_matches;
use axum::{http::StatusCode, response::IntoResponse};
use http_body_util::BodyExt;
use serde_json::Value;
use uuid::Uuid;

use council_procurement::auth::AuthError;
use council_procurement::domain::{BidStatus, CreateBidRequest, PackageStatus};
use council_procurement::error::ApiError;
use council_procurement::workflow::{BidAction, WorkflowError};

async fn render(err: impl Into<ApiError>) -> (StatusCode, Value) {
    let response = err.into().into_response();
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    (status, serde_json::from_slice(&bytes).expect("json body"))
}

#[tokio::test]
async fn test_validation_errors_list_every_field() {
    let req = CreateBidRequest {
        bid_amount: rust_decimal::Decimal::from(-1),
        duration_days: 0,
        proposal_text: "  ".into(),
        as_draft: false,
    };
    let errors = req.validate().unwrap_err();

    let (status, body) = render(errors).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let fields: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["bid_amount", "duration_days", "proposal_text"]);
}

#[tokio::test]
async fn test_invalid_transition_is_conflict() {
    let (status, body) = render(WorkflowError::InvalidTransition {
        action: BidAction::Withdraw,
        from: BidStatus::Accepted,
    })
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INVALID_TRANSITION");
    assert_eq!(body["message"], "cannot withdraw a bid that is accepted");
    assert!(body.get("fields").is_none());
}

#[tokio::test]
async fn test_award_conflicts() {
    let (status, body) = render(WorkflowError::PackageAlreadyAwarded {
        package_id: Uuid::nil(),
        awarded_bid_id: Uuid::nil(),
    })
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, _) = render(WorkflowError::PackageNotOpen {
        package_id: Uuid::nil(),
        status: PackageStatus::Cancelled,
    })
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_missing_team_member_is_not_found() {
    let (status, body) = render(WorkflowError::NotMember {
        contractor_id: Uuid::nil(),
    })
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_row_not_found_maps_to_404() {
    let (status, body) = render(sqlx::Error::RowNotFound).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Resource not found");
}

#[tokio::test]
async fn test_internal_details_are_hidden() {
    let (status, body) = render(anyhow::anyhow!("redis at 10.0.0.7 refused connection")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "INTERNAL_ERROR");
    assert_eq!(body["message"], "An internal error occurred");

    let (status, body) = render(sqlx::Error::PoolTimedOut).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "DATABASE_ERROR");
}

#[tokio::test]
async fn test_token_failures_are_unauthorized() {
    let (status, body) = render(AuthError::InvalidToken("kid abc not in JWKS".into())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid or expired token");

    let (status, body) = render(AuthError::MissingToken).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Missing authorization token");
}

#[test]
fn test_helpers_build_expected_variants() {
    assert_matches!(ApiError::not_found("Bid"), ApiError::NotFound(msg) if msg == "Bid not found");
    assert_matches!(ApiError::invalid("deadline", "passed"), ApiError::Validation(e) if e.fields().len() == 1);
}
