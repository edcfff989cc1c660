use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{
    contractor_totals, count_percent, format_money, ContractorTotal, ProjectSnapshot, ReportHeader,
};
use crate::domain::{PackageStatus, ProjectStatus};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletionReport {
    #[serde(flatten)]
    pub header: ReportHeader,
    pub completion_percentage: f64,
    pub project_duration_days: i64,
    pub project_status: String,
    pub packages: Vec<PackageCompletion>,
    pub summary: CompletionSummary,
    pub total_project_value: Decimal,
    pub contractors: Vec<ContractorTotal>,
    pub team: TeamRosterSummary,
    pub achievements: Vec<String>,
    pub lessons_learned: LessonsLearned,
    pub future_recommendations: Vec<PhaseRecommendation>,
    pub final_status: FinalStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PackageCompletion {
    pub title: String,
    pub package_type: String,
    pub status: PackageStatus,
    pub status_label: String,
    pub award: Option<AwardInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AwardInfo {
    pub awarded_to: String,
    pub contract_value: Decimal,
    pub duration_days: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CompletionSummary {
    pub completed: usize,
    pub in_progress: usize,
    pub awarded: usize,
    pub open: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TeamRosterSummary {
    pub name: Option<String>,
    pub status: String,
    pub member_count: usize,
    pub members: Vec<RosterLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RosterLine {
    pub name: String,
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LessonsLearned {
    pub success_factors: Vec<String>,
    pub areas_for_improvement: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhaseRecommendation {
    pub phase: String,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinalStatus {
    pub project_status: String,
    pub completion_date: String,
    pub prepared_by: String,
}

const PHASES: &[(&str, [&str; 3])] = &[
    (
        "Planning Phase",
        [
            "Conduct thorough feasibility studies",
            "Develop detailed project schedules",
            "Establish clear quality standards",
        ],
    ),
    (
        "Execution Phase",
        [
            "Implement regular progress monitoring",
            "Maintain open communication channels",
            "Ensure adequate resource allocation",
        ],
    ),
    (
        "Closure Phase",
        [
            "Conduct comprehensive final inspections",
            "Document lessons learned",
            "Prepare handover documentation",
        ],
    ),
];

fn achievements(
    completion: f64,
    total_value: Decimal,
    team_members: usize,
) -> Vec<String> {
    let mut out = Vec::new();
    out.push(
        if completion >= 100.0 {
            "Project completed on time and within scope"
        } else if completion >= 80.0 {
            "Project substantially completed"
        } else {
            "Project completion in progress"
        }
        .to_string(),
    );
    if total_value > Decimal::ZERO {
        out.push(format!(
            "Total contract value of {} secured",
            format_money(total_value)
        ));
    }
    if team_members > 0 {
        out.push(format!(
            "Team of {} members successfully coordinated",
            team_members
        ));
    }
    out
}

pub fn build(snapshot: &ProjectSnapshot, now: DateTime<Utc>) -> CompletionReport {
    let summary = CompletionSummary {
        completed: snapshot.count_packages(PackageStatus::Completed),
        in_progress: snapshot.count_packages(PackageStatus::InProgress),
        awarded: snapshot.count_packages(PackageStatus::Awarded),
        open: snapshot.count_packages(PackageStatus::Open),
    };
    let completion_percentage = count_percent(summary.completed, snapshot.packages.len());
    let is_complete = completion_percentage >= 100.0;

    let packages = snapshot
        .packages
        .iter()
        .map(|package| PackageCompletion {
            title: package.title.clone(),
            package_type: package.package_type.label().to_string(),
            status: package.status,
            status_label: package.status.label().to_string(),
            award: snapshot.awarded_bid(package).map(|bid| AwardInfo {
                awarded_to: snapshot.display_name(bid.contractor_id),
                contract_value: bid.bid_amount,
                duration_days: bid.duration_days,
            }),
        })
        .collect();

    let contractors = contractor_totals(
        snapshot,
        snapshot
            .awards()
            .map(|(_, bid)| (bid.contractor_id, bid.bid_amount)),
    );

    let team = match &snapshot.team {
        Some(roster) => TeamRosterSummary {
            name: Some(roster.team.name.clone()),
            status: roster.team.status.label().to_string(),
            member_count: roster.members.len(),
            members: roster
                .members
                .iter()
                .map(|m| RosterLine {
                    name: snapshot.display_name(m.contractor_id),
                    role: m.role.label().to_string(),
                })
                .collect(),
        },
        None => TeamRosterSummary {
            name: None,
            status: "No formal team structure was established for this project.".to_string(),
            member_count: 0,
            members: Vec::new(),
        },
    };

    let total_project_value = snapshot.total_awarded_value();

    let lessons_learned = LessonsLearned {
        success_factors: vec![
            if completion_percentage > 80.0 {
                "Effective project planning contributed to successful execution"
            } else {
                "Additional planning may be beneficial for future projects"
            }
            .to_string(),
            format!("{} qualified contractors engaged", contractors.len()),
            if snapshot.team.is_some() {
                "Well-coordinated team effort"
            } else {
                "Individual contractor management approach"
            }
            .to_string(),
        ],
        areas_for_improvement: vec![
            if snapshot.project.status == ProjectStatus::Completed {
                "Project completed within planned timeline"
            } else {
                "Timeline monitoring and adjustment may be needed"
            }
            .to_string(),
            "Regular quality inspections maintained throughout project".to_string(),
            "Stakeholder communication protocols established".to_string(),
        ],
    };

    CompletionReport {
        header: ReportHeader::new(snapshot, now),
        completion_percentage,
        project_duration_days: snapshot.project.duration_days(),
        project_status: snapshot.project.status.label().to_string(),
        packages,
        summary,
        total_project_value,
        achievements: achievements(completion_percentage, total_project_value, team.member_count),
        contractors,
        team,
        lessons_learned,
        future_recommendations: PHASES
            .iter()
            .map(|(phase, items)| PhaseRecommendation {
                phase: phase.to_string(),
                items: items.iter().map(|s| s.to_string()).collect(),
            })
            .collect(),
        final_status: FinalStatus {
            project_status: if is_complete { "COMPLETED" } else { "IN PROGRESS" }.to_string(),
            completion_date: if is_complete {
                now.format("%B %d, %Y").to_string()
            } else {
                "Ongoing".to_string()
            },
            prepared_by: "Automated System".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::reporting::fixtures::{self, add_package, contractor};

    #[test]
    fn test_empty_project() {
        let snapshot = fixtures::empty();
        let report = build(&snapshot, Utc::now());
        assert_eq!(report.completion_percentage, 0.0);
        assert_eq!(report.summary, CompletionSummary::default());
        assert_eq!(report.project_duration_days, 364);
        assert_eq!(report.team.member_count, 0);
        assert_eq!(report.achievements, vec!["Project completion in progress".to_string()]);
        assert_eq!(report.final_status.completion_date, "Ongoing");
        assert_eq!(report.future_recommendations.len(), 3);
    }

    #[test]
    fn test_fully_completed_project() {
        let mut snapshot = fixtures::empty();
        let acme = contractor("Acme Civil", 8);
        let bolt = contractor("Bolt Electrical", 4);
        add_package(&mut snapshot, "Quay wall", 1000, Some((&acme, 1000)), PackageStatus::Completed);
        add_package(&mut snapshot, "Lighting", 500, Some((&bolt, 2500)), PackageStatus::Completed);

        let now = Utc.with_ymd_and_hms(2026, 11, 3, 9, 0, 0).unwrap();
        let report = build(&snapshot, now);
        assert_eq!(report.completion_percentage, 100.0);
        assert_eq!(report.final_status.project_status, "COMPLETED");
        assert_eq!(report.final_status.completion_date, "November 03, 2026");
        assert_eq!(report.team.member_count, 2);
        assert_eq!(report.contractors[0].name, "Bolt Electrical");
        // completed packages are no longer counted as awarded value
        assert_eq!(report.total_project_value, Decimal::ZERO);
        assert_eq!(
            report.achievements,
            vec![
                "Project completed on time and within scope".to_string(),
                "Team of 2 members successfully coordinated".to_string(),
            ]
        );
        assert_eq!(
            report.lessons_learned.success_factors[1],
            "2 qualified contractors engaged"
        );
    }

    #[test]
    fn test_contract_value_achievement() {
        let mut snapshot = fixtures::empty();
        let acme = contractor("Acme Civil", 8);
        add_package(&mut snapshot, "Quay wall", 1000, Some((&acme, 12500)), PackageStatus::Awarded);

        let report = build(&snapshot, Utc::now());
        assert_eq!(
            report.achievements[1],
            "Total contract value of $12,500.00 secured"
        );
        let award = report.packages[0].award.as_ref().unwrap();
        assert_eq!(award.awarded_to, "Acme Civil");
        assert_eq!(award.duration_days, 30);
    }
}
