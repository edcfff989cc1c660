//! Bid status transitions
//!
//! ```text
//! draft -> submitted -> under_review -> accepted | rejected
//!   \          \             \
//!    `----------`-------------`--> withdrawn
//! ```
//!
//! Every transition checks the current status first and returns
//! [`WorkflowError::InvalidTransition`] without touching the bid when the
//! move is not allowed.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::WorkflowError;
use crate::domain::{Bid, BidStatus, Package, PackageStatus};

/// Transition requested on a bid
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BidAction {
    Submit,
    StartReview,
    Withdraw,
    Accept,
    Reject,
}

impl std::fmt::Display for BidAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let verb = match self {
            Self::Submit => "submit",
            Self::StartReview => "review",
            Self::Withdraw => "withdraw",
            Self::Accept => "accept",
            Self::Reject => "reject",
        };
        f.write_str(verb)
    }
}

/// Applied status change
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Transition {
    pub bid_id: Uuid,
    pub action: BidAction,
    pub from: BidStatus,
    pub to: BidStatus,
}

fn guard(bid: &Bid, action: BidAction, allowed: fn(&BidStatus) -> bool) -> Result<(), WorkflowError> {
    if allowed(&bid.status) {
        Ok(())
    } else {
        Err(WorkflowError::InvalidTransition {
            action,
            from: bid.status,
        })
    }
}

fn set_status(bid: &mut Bid, action: BidAction, to: BidStatus, now: DateTime<Utc>) -> Transition {
    let from = bid.status;
    bid.status = to;
    bid.updated_at = now;
    Transition {
        bid_id: bid.id,
        action,
        from,
        to,
    }
}

fn stamp_review(bid: &mut Bid, reviewer: Uuid, notes: Option<&str>, now: DateTime<Utc>) {
    bid.reviewed_by = Some(reviewer);
    bid.reviewed_at = Some(now);
    if let Some(notes) = notes {
        bid.review_notes = notes.to_string();
    }
}

/// `draft -> submitted`, stamping `submitted_at`.
pub fn submit(bid: &mut Bid, now: DateTime<Utc>) -> Result<Transition, WorkflowError> {
    guard(bid, BidAction::Submit, |s| *s == BidStatus::Draft)?;
    bid.submitted_at = Some(now);
    Ok(set_status(bid, BidAction::Submit, BidStatus::Submitted, now))
}

/// `submitted -> under_review`.
pub fn start_review(
    bid: &mut Bid,
    reviewer: Uuid,
    notes: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Transition, WorkflowError> {
    guard(bid, BidAction::StartReview, |s| *s == BidStatus::Submitted)?;
    stamp_review(bid, reviewer, notes, now);
    Ok(set_status(bid, BidAction::StartReview, BidStatus::UnderReview, now))
}

/// Any pre-terminal status `-> withdrawn`.
pub fn withdraw(bid: &mut Bid, now: DateTime<Utc>) -> Result<Transition, WorkflowError> {
    guard(bid, BidAction::Withdraw, BidStatus::is_withdrawable)?;
    Ok(set_status(bid, BidAction::Withdraw, BidStatus::Withdrawn, now))
}

/// `submitted | under_review -> rejected`. No cascade.
pub fn reject(
    bid: &mut Bid,
    reviewer: Uuid,
    notes: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Transition, WorkflowError> {
    guard(bid, BidAction::Reject, BidStatus::is_reviewable)?;
    stamp_review(bid, reviewer, notes, now);
    Ok(set_status(bid, BidAction::Reject, BidStatus::Rejected, now))
}

/// `submitted | under_review -> accepted`, awarding `package` to the bid.
///
/// The package must be the bid's own, still open, and not already awarded
/// to another bid.
pub fn accept(
    bid: &mut Bid,
    package: &mut Package,
    reviewer: Uuid,
    notes: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Transition, WorkflowError> {
    if bid.package_id != package.id {
        return Err(WorkflowError::PackageMismatch {
            bid_id: bid.id,
            package_id: package.id,
        });
    }
    guard(bid, BidAction::Accept, BidStatus::is_reviewable)?;
    if let Some(awarded_bid_id) = package.awarded_bid_id {
        if awarded_bid_id != bid.id {
            return Err(WorkflowError::PackageAlreadyAwarded {
                package_id: package.id,
                awarded_bid_id,
            });
        }
    }
    if package.status != PackageStatus::Open {
        return Err(WorkflowError::PackageNotOpen {
            package_id: package.id,
            status: package.status,
        });
    }

    stamp_review(bid, reviewer, notes, now);
    let transition = set_status(bid, BidAction::Accept, BidStatus::Accepted, now);

    package.status = PackageStatus::Awarded;
    package.awarded_bid_id = Some(bid.id);
    package.updated_at = now;

    Ok(transition)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::workflow::fixtures;

    fn setup(status: BidStatus) -> (Bid, Package) {
        let project = fixtures::project(Uuid::new_v4());
        let package = fixtures::package(&project, "Resurfacing");
        let bid = fixtures::bid(&package, Uuid::new_v4(), 1000, status);
        (bid, package)
    }

    #[test]
    fn test_submit_only_from_draft() {
        let now = Utc::now();
        let (mut bid, _) = setup(BidStatus::Draft);
        let t = submit(&mut bid, now).unwrap();
        assert_eq!((t.from, t.to), (BidStatus::Draft, BidStatus::Submitted));
        assert_eq!(bid.submitted_at, Some(now));

        let err = submit(&mut bid, now).unwrap_err();
        assert_matches!(err, WorkflowError::InvalidTransition { action: BidAction::Submit, .. });
    }

    #[test]
    fn test_withdraw_from_pre_terminal_statuses() {
        for status in [BidStatus::Draft, BidStatus::Submitted, BidStatus::UnderReview] {
            let (mut bid, _) = setup(status);
            withdraw(&mut bid, Utc::now()).unwrap();
            assert_eq!(bid.status, BidStatus::Withdrawn);
        }
    }

    #[test]
    fn test_withdraw_from_terminal_statuses_leaves_state_unchanged() {
        for status in [BidStatus::Accepted, BidStatus::Rejected, BidStatus::Withdrawn] {
            let (mut bid, _) = setup(status);
            let updated_at = bid.updated_at;
            let err = withdraw(&mut bid, Utc::now()).unwrap_err();
            assert_eq!(
                err,
                WorkflowError::InvalidTransition {
                    action: BidAction::Withdraw,
                    from: status
                }
            );
            assert_eq!(bid.status, status);
            assert_eq!(bid.updated_at, updated_at);
        }
    }

    #[test]
    fn test_reject_stamps_reviewer_and_notes() {
        let reviewer = Uuid::new_v4();
        let now = Utc::now();
        let (mut bid, package) = setup(BidStatus::UnderReview);
        reject(&mut bid, reviewer, Some("Too expensive"), now).unwrap();
        assert_eq!(bid.status, BidStatus::Rejected);
        assert_eq!(bid.reviewed_by, Some(reviewer));
        assert_eq!(bid.reviewed_at, Some(now));
        assert_eq!(bid.review_notes, "Too expensive");
        assert_eq!(package.status, PackageStatus::Open);
    }

    #[test]
    fn test_start_review_only_from_submitted() {
        let (mut bid, _) = setup(BidStatus::Submitted);
        start_review(&mut bid, Uuid::new_v4(), None, Utc::now()).unwrap();
        assert_eq!(bid.status, BidStatus::UnderReview);
        assert!(start_review(&mut bid, Uuid::new_v4(), None, Utc::now()).is_err());
    }

    #[test]
    fn test_accept_awards_package() {
        let reviewer = Uuid::new_v4();
        let (mut bid, mut package) = setup(BidStatus::Submitted);
        accept(&mut bid, &mut package, reviewer, None, Utc::now()).unwrap();
        assert_eq!(bid.status, BidStatus::Accepted);
        assert_eq!(bid.reviewed_by, Some(reviewer));
        assert_eq!(package.status, PackageStatus::Awarded);
        assert_eq!(package.awarded_bid_id, Some(bid.id));
    }

    #[test]
    fn test_second_accept_on_awarded_package_is_refused() {
        let (mut first, mut package) = setup(BidStatus::Submitted);
        let mut second = fixtures::bid(&package, Uuid::new_v4(), 900, BidStatus::Submitted);
        accept(&mut first, &mut package, Uuid::new_v4(), None, Utc::now()).unwrap();

        let err = accept(&mut second, &mut package, Uuid::new_v4(), None, Utc::now()).unwrap_err();
        assert_eq!(
            err,
            WorkflowError::PackageAlreadyAwarded {
                package_id: package.id,
                awarded_bid_id: first.id
            }
        );
        assert_eq!(second.status, BidStatus::Submitted);
        assert_eq!(package.awarded_bid_id, Some(first.id));
    }

    #[test]
    fn test_accept_requires_open_package() {
        let (mut bid, mut package) = setup(BidStatus::Submitted);
        package.status = PackageStatus::Cancelled;
        let err = accept(&mut bid, &mut package, Uuid::new_v4(), None, Utc::now()).unwrap_err();
        assert_matches!(err, WorkflowError::PackageNotOpen { status: PackageStatus::Cancelled, .. });
    }

    #[test]
    fn test_accept_rejects_foreign_package() {
        let (mut bid, _) = setup(BidStatus::Submitted);
        let (_, mut other_package) = setup(BidStatus::Submitted);
        let err = accept(&mut bid, &mut other_package, Uuid::new_v4(), None, Utc::now()).unwrap_err();
        assert_matches!(err, WorkflowError::PackageMismatch { .. });
    }

    #[test]
    fn test_draft_cannot_be_accepted() {
        let (mut bid, mut package) = setup(BidStatus::Draft);
        assert!(accept(&mut bid, &mut package, Uuid::new_v4(), None, Utc::now()).is_err());
        assert_eq!(package.awarded_bid_id, None);
    }
}
