//! Landing-page summaries for councils and contractors

use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::count_percent;
use crate::domain::{Bid, BidStatus, Package, PackageStatus, Project, ProjectStatus};

/// Entries shown in each "recent" list
pub const RECENT_ITEMS: usize = 2;
/// Open projects suggested to a contractor
pub const SUGGESTED_PROJECTS: usize = 5;
/// Awards shown on a contractor's dashboard
pub const DASHBOARD_AWARDS: usize = 10;

/// A package won by a contractor, with the winning bid's terms
#[derive(Debug, Clone, Serialize)]
pub struct AwardedPackage {
    #[serde(flatten)]
    pub package: Package,
    pub project_title: String,
    pub bid_id: Uuid,
    pub bid_amount: Decimal,
    pub duration_days: i32,
    pub awarded_at: Option<DateTime<Utc>>,
}

/// A published project with packages still taking bids
#[derive(Debug, Clone, Serialize)]
pub struct AvailableProject {
    #[serde(flatten)]
    pub project: Project,
    pub open_packages: i64,
    /// Open packages whose deadline falls within the next week
    pub closing_soon: i64,
    pub next_deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ContractorStats {
    pub total_bids: usize,
    pub active_bids: usize,
    pub awarded_bids: usize,
    pub success_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContractorDashboard {
    pub stats: ContractorStats,
    pub recent_bids: Vec<Bid>,
    pub available_projects: Vec<AvailableProject>,
    pub awarded_packages: Vec<AwardedPackage>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CouncilStats {
    pub total_projects: usize,
    pub published_projects: usize,
    pub active_projects: usize,
    pub total_packages: usize,
    pub open_packages: usize,
    pub total_bids: usize,
    pub pending_bids: usize,
    pub accepted_bids: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CouncilDashboard {
    pub stats: CouncilStats,
    pub recent_projects: Vec<Project>,
    pub recent_bids: Vec<Bid>,
}

/// Dashboard payload, tagged with the viewer's role
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Dashboard {
    Council(CouncilDashboard),
    Contractor(ContractorDashboard),
}

/// Bids that have not reached a decision yet, drafts included.
fn is_active(status: BidStatus) -> bool {
    matches!(
        status,
        BidStatus::Draft | BidStatus::Submitted | BidStatus::UnderReview
    )
}

/// Latest first by submission; drafts fall back to their creation time.
fn recent_bids(bids: &[Bid]) -> Vec<Bid> {
    let mut recent = bids.to_vec();
    recent.sort_by_key(|b| Reverse(b.submitted_at.unwrap_or(b.created_at)));
    recent.truncate(RECENT_ITEMS);
    recent
}

impl ContractorDashboard {
    pub fn build(
        bids: &[Bid],
        mut available: Vec<AvailableProject>,
        mut awarded: Vec<AwardedPackage>,
    ) -> Self {
        let total_bids = bids.len();
        let awarded_bids = bids
            .iter()
            .filter(|b| b.status == BidStatus::Accepted)
            .count();

        available.truncate(SUGGESTED_PROJECTS);
        awarded.retain(|a| a.package.status.is_contracted());
        awarded.sort_by_key(|a| Reverse(a.package.created_at));
        awarded.truncate(DASHBOARD_AWARDS);

        Self {
            stats: ContractorStats {
                total_bids,
                active_bids: bids.iter().filter(|b| is_active(b.status)).count(),
                awarded_bids,
                success_rate: count_percent(awarded_bids, total_bids),
            },
            recent_bids: recent_bids(bids),
            available_projects: available,
            awarded_packages: awarded,
        }
    }
}

impl CouncilDashboard {
    pub fn build(projects: &[Project], packages: &[Package], bids: &[Bid]) -> Self {
        let mut recent_projects = projects.to_vec();
        recent_projects.sort_by_key(|p| Reverse(p.created_at));
        recent_projects.truncate(RECENT_ITEMS);

        Self {
            stats: CouncilStats {
                total_projects: projects.len(),
                published_projects: projects
                    .iter()
                    .filter(|p| p.status == ProjectStatus::Published)
                    .count(),
                active_projects: projects
                    .iter()
                    .filter(|p| p.status == ProjectStatus::InProgress)
                    .count(),
                total_packages: packages.len(),
                open_packages: packages
                    .iter()
                    .filter(|p| p.status == PackageStatus::Open)
                    .count(),
                total_bids: bids.len(),
                pending_bids: bids.iter().filter(|b| b.status.is_reviewable()).count(),
                accepted_bids: bids
                    .iter()
                    .filter(|b| b.status == BidStatus::Accepted)
                    .count(),
            },
            recent_projects,
            recent_bids: recent_bids(bids),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::Utc;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use super::{AvailableProject, AwardedPackage};
    use crate::domain::{Package, PackageStatus, Project};
    use crate::workflow::fixtures;

    pub fn awarded(
        project: &Project,
        title: &str,
        amount: i64,
        status: PackageStatus,
    ) -> AwardedPackage {
        let mut package = fixtures::package(project, title);
        let bid_id = Uuid::new_v4();
        package.status = status;
        package.awarded_bid_id = Some(bid_id);
        AwardedPackage {
            package,
            project_title: project.title.clone(),
            bid_id,
            bid_amount: Decimal::from(amount),
            duration_days: 30,
            awarded_at: Some(Utc::now()),
        }
    }

    pub fn available(project: &Project, open_packages: i64) -> AvailableProject {
        AvailableProject {
            project: project.clone(),
            open_packages,
            closing_soon: 0,
            next_deadline: None,
        }
    }

    pub fn with_status(package: &Package, status: PackageStatus) -> Package {
        Package {
            status,
            ..package.clone()
        }
    }
}
