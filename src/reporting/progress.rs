use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{count_percent, ProjectSnapshot, ReportHeader};
use crate::domain::{BidStatus, PackageStatus};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgressReport {
    #[serde(flatten)]
    pub header: ReportHeader,
    pub total_packages: usize,
    pub completed_packages: usize,
    pub in_progress_packages: usize,
    pub awarded_packages: usize,
    pub open_packages: usize,
    pub progress_percentage: f64,
    pub total_bids: usize,
    pub accepted_bids: usize,
    pub bid_acceptance_rate: f64,
    pub team: TeamOverview,
    pub packages: Vec<PackageProgress>,
    pub recommendations: Vec<String>,
    pub total_awarded_value: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TeamOverview {
    pub status: String,
    pub name: Option<String>,
    pub member_count: usize,
    pub lead_contractor: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PackageProgress {
    pub title: String,
    pub package_type: String,
    pub status: PackageStatus,
    pub status_label: String,
    pub bid_count: usize,
    pub awarded_amount: Option<Decimal>,
    pub contractor: Option<String>,
}

fn stage_recommendation(progress: f64) -> &'static str {
    if progress < 25.0 {
        "Project is in early stages. Focus on completing initial planning and mobilization."
    } else if progress < 50.0 {
        "Project is progressing steadily. Ensure quality control measures are in place."
    } else if progress < 75.0 {
        "Project is in execution phase. Monitor timelines and resource allocation."
    } else {
        "Project is nearing completion. Prepare for handover and final inspections."
    }
}

pub fn build(snapshot: &ProjectSnapshot, now: DateTime<Utc>) -> ProgressReport {
    let total_packages = snapshot.packages.len();
    let completed_packages = snapshot.count_packages(PackageStatus::Completed);
    let open_packages = snapshot.count_packages(PackageStatus::Open);
    let progress_percentage = count_percent(completed_packages, total_packages);

    let total_bids = snapshot.bids.len();
    let accepted_bids = snapshot.count_bids(BidStatus::Accepted);

    let team = match &snapshot.team {
        Some(roster) => TeamOverview {
            status: roster.team.status.label().to_string(),
            name: Some(roster.team.name.clone()),
            member_count: roster.members.len(),
            lead_contractor: roster
                .team
                .lead_contractor_id
                .map(|id| snapshot.display_name(id)),
        },
        None => TeamOverview {
            status: "Not formed".to_string(),
            name: None,
            member_count: 0,
            lead_contractor: None,
        },
    };

    let packages = snapshot
        .packages
        .iter()
        .map(|package| {
            let award = snapshot.awarded_bid(package);
            PackageProgress {
                title: package.title.clone(),
                package_type: package.package_type.label().to_string(),
                status: package.status,
                status_label: package.status.label().to_string(),
                bid_count: snapshot.bids_for(package.id).count(),
                awarded_amount: award.map(|b| b.bid_amount),
                contractor: award.map(|b| snapshot.display_name(b.contractor_id)),
            }
        })
        .collect();

    let mut recommendations = vec![stage_recommendation(progress_percentage).to_string()];
    if open_packages > 0 {
        recommendations
            .push("Complete bidding process for remaining packages to avoid delays.".to_string());
    }

    ProgressReport {
        header: ReportHeader::new(snapshot, now),
        total_packages,
        completed_packages,
        in_progress_packages: snapshot.count_packages(PackageStatus::InProgress),
        awarded_packages: snapshot.count_packages(PackageStatus::Awarded),
        open_packages,
        progress_percentage,
        total_bids,
        accepted_bids,
        bid_acceptance_rate: count_percent(accepted_bids, total_bids),
        team,
        packages,
        recommendations,
        total_awarded_value: snapshot.total_awarded_value(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporting::fixtures::{self, add_package, contractor};

    #[test]
    fn test_empty_project_reports_zero() {
        let report = build(&fixtures::empty(), Utc::now());
        assert_eq!(report.total_packages, 0);
        assert_eq!(report.progress_percentage, 0.0);
        assert_eq!(report.bid_acceptance_rate, 0.0);
        assert_eq!(report.team.status, "Not formed");
        assert_eq!(report.total_awarded_value, Decimal::ZERO);
        assert_eq!(report.recommendations.len(), 1);
        assert!(report.recommendations[0].starts_with("Project is in early stages"));
    }

    #[test]
    fn test_progress_thresholds() {
        assert!(stage_recommendation(24.99).contains("early stages"));
        assert!(stage_recommendation(25.0).contains("progressing steadily"));
        assert!(stage_recommendation(50.0).contains("execution phase"));
        assert!(stage_recommendation(75.0).contains("nearing completion"));
        assert!(stage_recommendation(100.0).contains("nearing completion"));
    }

    #[test]
    fn test_counts_and_team() {
        let mut snapshot = fixtures::empty();
        let acme = contractor("Acme Civil", 8);
        add_package(&mut snapshot, "Quay wall", 1200, Some((&acme, 1000)), PackageStatus::Completed);
        add_package(&mut snapshot, "Lighting", 500, Some((&acme, 450)), PackageStatus::Awarded);
        add_package(&mut snapshot, "Signage", 300, None, PackageStatus::Open);

        let report = build(&snapshot, Utc::now());
        assert_eq!(report.total_packages, 3);
        assert_eq!(report.completed_packages, 1);
        assert_eq!(report.open_packages, 1);
        assert_eq!(report.progress_percentage, 33.33);
        assert_eq!(report.accepted_bids, 2);
        assert_eq!(report.bid_acceptance_rate, 100.0);
        assert_eq!(report.team.member_count, 1);
        assert_eq!(report.team.lead_contractor.as_deref(), Some("Acme Civil"));
        // only packages still in `awarded`
        assert_eq!(report.total_awarded_value, Decimal::from(450));
        assert_eq!(report.packages[2].awarded_amount, None);
        assert_eq!(
            report.recommendations.last().map(String::as_str),
            Some("Complete bidding process for remaining packages to avoid delays.")
        );
    }
}
