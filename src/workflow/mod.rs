//! Bid award workflow
//!
//! Pure state transitions over in-memory entities. The service layer loads the
//! rows inside a transaction, runs these functions, and persists whatever they
//! changed; nothing here touches the database.

pub mod bid_lifecycle;
pub mod team_formation;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{Bid, BidStatus, Package, PackageStatus, Project};

pub use bid_lifecycle::{BidAction, Transition};
pub use team_formation::{Formation, TeamRoster};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    #[error("cannot {action} a bid that is {from}")]
    InvalidTransition { action: BidAction, from: BidStatus },

    #[error("package {package_id} is already awarded to bid {awarded_bid_id}")]
    PackageAlreadyAwarded { package_id: Uuid, awarded_bid_id: Uuid },

    #[error("package {package_id} is {status} and cannot be awarded")]
    PackageNotOpen { package_id: Uuid, status: PackageStatus },

    #[error("bid {bid_id} does not belong to package {package_id}")]
    PackageMismatch { bid_id: Uuid, package_id: Uuid },

    #[error("contractor {contractor_id} is already on the team")]
    AlreadyMember { contractor_id: Uuid },

    #[error("contractor {contractor_id} is not on the team")]
    NotMember { contractor_id: Uuid },
}

/// Everything an accepted bid changed
#[derive(Debug, Clone, Serialize)]
pub struct AwardOutcome {
    pub transition: Transition,
    pub bid: Bid,
    pub package: Package,
    pub formation: Formation,
}

/// Accepts `bid`, awards its package, and enrolls the contractor on the
/// project team in one step.
///
/// Nothing is modified when an error is returned.
pub fn award(
    bid: &mut Bid,
    package: &mut Package,
    project: &Project,
    roster: Option<TeamRoster>,
    reviewer: Uuid,
    notes: Option<&str>,
    now: DateTime<Utc>,
) -> Result<AwardOutcome, WorkflowError> {
    let transition = bid_lifecycle::accept(bid, package, reviewer, notes, now)?;
    let formation = team_formation::enroll_winner(project, roster, bid.contractor_id, now);

    Ok(AwardOutcome {
        transition,
        bid: bid.clone(),
        package: package.clone(),
        formation,
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{Duration, NaiveDate};
    use rust_decimal::Decimal;

    use super::*;
    use crate::domain::{PackageType, ProjectStatus};

    pub fn project(council_id: Uuid) -> Project {
        Project {
            id: Uuid::new_v4(),
            council_id,
            title: "Harbour Upgrade".into(),
            description: "Quay walls and lighting".into(),
            location: "Whitby".into(),
            budget_range: String::new(),
            start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
            status: ProjectStatus::Published,
            is_public: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub fn package(project: &Project, title: &str) -> Package {
        Package {
            id: Uuid::new_v4(),
            project_id: project.id,
            title: title.into(),
            description: format!("{} works", title),
            package_type: PackageType::Structural,
            estimated_cost: Some(Decimal::from(1200)),
            deadline: Utc::now() + Duration::days(30),
            status: PackageStatus::Open,
            awarded_bid_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub fn bid(package: &Package, contractor_id: Uuid, amount: i64, status: BidStatus) -> Bid {
        Bid {
            id: Uuid::new_v4(),
            package_id: package.id,
            contractor_id,
            bid_amount: Decimal::from(amount),
            duration_days: 30,
            proposal_text: "Experienced crew".into(),
            status,
            review_notes: String::new(),
            reviewed_by: None,
            submitted_at: None,
            reviewed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use rust_decimal::Decimal;

    use super::fixtures::*;
    use super::*;
    use crate::domain::MemberRole;

    #[test]
    fn test_award_scenario_two_packages_one_accepted() {
        let council = Uuid::new_v4();
        let contractor = Uuid::new_v4();
        let project = project(council);
        let mut package_a = package(&project, "Quay wall");
        let package_b = package(&project, "Lighting");
        let mut winning = bid(&package_a, contractor, 1000, BidStatus::Submitted);

        let outcome = award(
            &mut winning,
            &mut package_a,
            &project,
            None,
            council,
            None,
            Utc::now(),
        )
        .unwrap();

        assert_eq!(package_a.status, PackageStatus::Awarded);
        assert_eq!(package_a.awarded_bid_id, Some(winning.id));
        assert_eq!(outcome.bid.bid_amount, Decimal::from(1000));
        assert_eq!(package_b.status, PackageStatus::Open);

        let roster = &outcome.formation.roster;
        assert!(outcome.formation.team_created);
        assert_eq!(roster.team.project_id, project.id);
        assert_eq!(roster.team.lead_contractor_id, Some(contractor));
        assert_eq!(roster.members.len(), 1);
        assert_eq!(roster.members[0].contractor_id, contractor);
        assert_eq!(roster.members[0].role, MemberRole::Member);
    }

    #[test]
    fn test_same_contractor_on_two_packages_joins_once() {
        let council = Uuid::new_v4();
        let contractor = Uuid::new_v4();
        let project = project(council);
        let mut package_a = package(&project, "Quay wall");
        let mut package_b = package(&project, "Lighting");
        let mut bid_a = bid(&package_a, contractor, 1000, BidStatus::Submitted);
        let mut bid_b = bid(&package_b, contractor, 800, BidStatus::UnderReview);

        let first = award(&mut bid_a, &mut package_a, &project, None, council, None, Utc::now())
            .unwrap();
        let second = award(
            &mut bid_b,
            &mut package_b,
            &project,
            Some(first.formation.roster),
            council,
            None,
            Utc::now(),
        )
        .unwrap();

        assert!(!second.formation.team_created);
        assert!(second.formation.member_added.is_none());
        assert!(!second.formation.lead_assigned);
        assert_eq!(second.formation.roster.members.len(), 1);
        assert_eq!(package_b.awarded_bid_id, Some(bid_b.id));
    }

    #[test]
    fn test_second_contractor_joins_without_taking_lead() {
        let council = Uuid::new_v4();
        let first_contractor = Uuid::new_v4();
        let second_contractor = Uuid::new_v4();
        let project = project(council);
        let mut package_a = package(&project, "Quay wall");
        let mut package_b = package(&project, "Lighting");
        let mut bid_a = bid(&package_a, first_contractor, 1000, BidStatus::Submitted);
        let mut bid_b = bid(&package_b, second_contractor, 500, BidStatus::Submitted);

        let first = award(&mut bid_a, &mut package_a, &project, None, council, None, Utc::now())
            .unwrap();
        let second = award(
            &mut bid_b,
            &mut package_b,
            &project,
            Some(first.formation.roster),
            council,
            None,
            Utc::now(),
        )
        .unwrap();

        let roster = second.formation.roster;
        assert_eq!(roster.members.len(), 2);
        assert_eq!(roster.team.lead_contractor_id, Some(first_contractor));
    }

    #[test]
    fn test_failed_award_leaves_everything_untouched() {
        let council = Uuid::new_v4();
        let project = project(council);
        let mut package_a = package(&project, "Quay wall");
        let mut withdrawn = bid(&package_a, Uuid::new_v4(), 900, BidStatus::Withdrawn);
        let before_package = package_a.clone();

        let err = award(
            &mut withdrawn,
            &mut package_a,
            &project,
            None,
            council,
            None,
            Utc::now(),
        )
        .unwrap_err();

        assert_matches!(
            err,
            WorkflowError::InvalidTransition {
                action: BidAction::Accept,
                from: BidStatus::Withdrawn
            }
        );
        assert_eq!(withdrawn.status, BidStatus::Withdrawn);
        assert_eq!(package_a.status, before_package.status);
        assert_eq!(package_a.awarded_bid_id, None);
    }
}
