use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{count_percent, ProjectSnapshot, ReportHeader};
use crate::domain::PackageStatus;

/// Contractors below this many years of experience are flagged as a risk.
const LOW_EXPERIENCE_YEARS: i32 = 3;

const RECOMMENDATIONS: &[&str] = &[
    "Implement regular quality inspections for all active work packages",
    "Ensure all contractors have appropriate safety certifications",
    "Maintain detailed quality control documentation",
    "Conduct final quality audits before project completion",
    "Address identified risk factors promptly",
];

const NEXT_STEPS: &[&str] = &[
    "Schedule quality control inspections for active packages",
    "Review contractor safety records and certifications",
    "Update risk register with current project status",
    "Prepare quality assurance checklist for remaining work",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QualityReport {
    #[serde(flatten)]
    pub header: ReportHeader,
    pub project_status: String,
    pub active_packages: usize,
    pub completed_packages: usize,
    pub packages: Vec<PackageQuality>,
    pub contractors: Vec<ContractorPerformance>,
    pub contractors_count: usize,
    pub avg_contractor_experience: f64,
    pub risks: Vec<String>,
    pub recommendations: Vec<String>,
    pub next_steps: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PackageQuality {
    pub title: String,
    pub package_type: String,
    pub status: PackageStatus,
    pub status_label: String,
    pub contractor: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContractorPerformance {
    pub contractor_id: Uuid,
    pub name: String,
    pub packages_assigned: usize,
    pub packages_completed: usize,
    pub completion_rate: f64,
    pub experience_years: i32,
}

fn assess_risks(snapshot: &ProjectSnapshot, contractors: &[ContractorPerformance]) -> Vec<String> {
    let mut risks = Vec::new();

    if snapshot.count_packages(PackageStatus::Open) > 0 {
        risks.push("Delayed bidding process may impact project timeline".to_string());
    }

    let live_packages = snapshot
        .packages
        .iter()
        .filter(|p| p.status != PackageStatus::Cancelled)
        .count();
    if contractors.is_empty() {
        risks.push("No contractors assigned - project initiation at risk".to_string());
    } else if snapshot.awards().count() < live_packages {
        risks.push("Some packages remain unassigned".to_string());
    }

    let mut inexperienced: Vec<&str> = contractors
        .iter()
        .filter(|c| c.experience_years < LOW_EXPERIENCE_YEARS)
        .map(|c| c.name.as_str())
        .collect();
    inexperienced.sort_unstable();
    if !inexperienced.is_empty() {
        risks.push(format!(
            "Contractors with limited experience: {}",
            inexperienced.join(", ")
        ));
    }

    if risks.is_empty() {
        risks.push("No significant risks identified at this time.".to_string());
    }
    risks
}

pub fn build(snapshot: &ProjectSnapshot, now: DateTime<Utc>) -> QualityReport {
    let packages = snapshot
        .packages
        .iter()
        .map(|package| PackageQuality {
            title: package.title.clone(),
            package_type: package.package_type.label().to_string(),
            status: package.status,
            status_label: package.status.label().to_string(),
            contractor: snapshot
                .awarded_bid(package)
                .map(|b| snapshot.display_name(b.contractor_id)),
        })
        .collect();

    let mut contractors: Vec<ContractorPerformance> = Vec::new();
    for (package, bid) in snapshot.awards() {
        let completed = usize::from(package.status == PackageStatus::Completed);
        match contractors
            .iter_mut()
            .find(|c| c.contractor_id == bid.contractor_id)
        {
            Some(entry) => {
                entry.packages_assigned += 1;
                entry.packages_completed += completed;
            }
            None => contractors.push(ContractorPerformance {
                contractor_id: bid.contractor_id,
                name: snapshot.display_name(bid.contractor_id),
                packages_assigned: 1,
                packages_completed: completed,
                completion_rate: 0.0,
                experience_years: snapshot.experience_years(bid.contractor_id),
            }),
        }
    }
    for entry in &mut contractors {
        entry.completion_rate = count_percent(entry.packages_completed, entry.packages_assigned);
    }
    contractors.sort_by(|a, b| {
        b.packages_assigned
            .cmp(&a.packages_assigned)
            .then_with(|| a.name.cmp(&b.name))
    });

    let avg_contractor_experience = if contractors.is_empty() {
        0.0
    } else {
        let total: i64 = contractors.iter().map(|c| i64::from(c.experience_years)).sum();
        (total as f64 / contractors.len() as f64 * 100.0).round() / 100.0
    };

    QualityReport {
        header: ReportHeader::new(snapshot, now),
        project_status: snapshot.project.status.label().to_string(),
        active_packages: snapshot.count_packages(PackageStatus::Awarded)
            + snapshot.count_packages(PackageStatus::InProgress),
        completed_packages: snapshot.count_packages(PackageStatus::Completed),
        packages,
        risks: assess_risks(snapshot, &contractors),
        contractors_count: contractors.len(),
        contractors,
        avg_contractor_experience,
        recommendations: RECOMMENDATIONS.iter().map(|s| s.to_string()).collect(),
        next_steps: NEXT_STEPS.iter().map(|s| s.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporting::fixtures::{self, add_package, contractor};

    #[test]
    fn test_empty_project_has_no_contractor_risk() {
        let report = build(&fixtures::empty(), Utc::now());
        assert_eq!(report.contractors_count, 0);
        assert_eq!(report.avg_contractor_experience, 0.0);
        assert_eq!(
            report.risks,
            vec!["No contractors assigned - project initiation at risk".to_string()]
        );
        assert_eq!(report.recommendations.len(), 5);
        assert_eq!(report.next_steps.len(), 4);
    }

    #[test]
    fn test_risks_and_performance() {
        let mut snapshot = fixtures::empty();
        let acme = contractor("Acme Civil", 8);
        let novice = contractor("New Start Ltd", 1);
        add_package(&mut snapshot, "Quay wall", 1000, Some((&acme, 900)), PackageStatus::Completed);
        add_package(&mut snapshot, "Paving", 1000, Some((&acme, 900)), PackageStatus::InProgress);
        add_package(&mut snapshot, "Lighting", 500, Some((&novice, 450)), PackageStatus::Awarded);
        add_package(&mut snapshot, "Signage", 300, None, PackageStatus::Open);

        let report = build(&snapshot, Utc::now());
        assert_eq!(report.active_packages, 2);
        assert_eq!(report.completed_packages, 1);
        assert_eq!(report.contractors_count, 2);
        assert_eq!(report.contractors[0].name, "Acme Civil");
        assert_eq!(report.contractors[0].completion_rate, 50.0);
        assert_eq!(report.avg_contractor_experience, 4.5);
        assert_eq!(
            report.risks,
            vec![
                "Delayed bidding process may impact project timeline".to_string(),
                "Some packages remain unassigned".to_string(),
                "Contractors with limited experience: New Start Ltd".to_string(),
            ]
        );
    }

    #[test]
    fn test_no_significant_risks() {
        let mut snapshot = fixtures::empty();
        let acme = contractor("Acme Civil", 8);
        add_package(&mut snapshot, "Quay wall", 1000, Some((&acme, 900)), PackageStatus::Completed);

        let report = build(&snapshot, Utc::now());
        assert_eq!(
            report.risks,
            vec!["No significant risks identified at this time.".to_string()]
        );
    }
}
