//! Project report aggregation
//!
//! Each report is a pure function of a [`ProjectSnapshot`] and the
//! generation time. Dashboards and analytics are likewise pure functions of
//! the rows a route loads. Percentages are plain `f64` rounded to two
//! decimals and are `0.0` whenever their denominator is empty.

pub mod analytics;
pub mod completion;
pub mod dashboard;
pub mod financial;
pub mod progress;
pub mod quality;
pub mod snapshot;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::ReportKind;

pub use analytics::{AwardPortfolio, BidAnalytics};
pub use completion::CompletionReport;
pub use dashboard::{
    AvailableProject, AwardedPackage, ContractorDashboard, CouncilDashboard, Dashboard,
};
pub use financial::FinancialReport;
pub use progress::ProgressReport;
pub use quality::QualityReport;
pub use snapshot::ProjectSnapshot;

/// Computed report payload, tagged by report type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "report_type", rename_all = "snake_case")]
pub enum ReportData {
    Progress(ProgressReport),
    Financial(FinancialReport),
    Quality(QualityReport),
    Completion(CompletionReport),
}

impl ReportData {
    pub fn compute(kind: ReportKind, snapshot: &ProjectSnapshot, now: DateTime<Utc>) -> Self {
        match kind {
            ReportKind::Progress => Self::Progress(progress::build(snapshot, now)),
            ReportKind::Financial => Self::Financial(financial::build(snapshot, now)),
            ReportKind::Quality => Self::Quality(quality::build(snapshot, now)),
            ReportKind::Completion => Self::Completion(completion::build(snapshot, now)),
        }
    }

    pub fn kind(&self) -> ReportKind {
        match self {
            Self::Progress(_) => ReportKind::Progress,
            Self::Financial(_) => ReportKind::Financial,
            Self::Quality(_) => ReportKind::Quality,
            Self::Completion(_) => ReportKind::Completion,
        }
    }
}

/// Header shared by every report
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportHeader {
    pub project_id: Uuid,
    pub project_title: String,
    pub generated_at: DateTime<Utc>,
}

impl ReportHeader {
    fn new(snapshot: &ProjectSnapshot, now: DateTime<Utc>) -> Self {
        Self {
            project_id: snapshot.project.id,
            project_title: snapshot.project.title.clone(),
            generated_at: now,
        }
    }
}

/// Amount received by one contractor across their awards
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContractorTotal {
    pub contractor_id: Uuid,
    pub name: String,
    pub total_amount: Decimal,
    pub percentage: f64,
}

/// Sums `(contractor, amount)` pairs per contractor, largest first, ties by
/// name. `percentage` is each total's share of the grand total.
pub(crate) fn contractor_totals(
    snapshot: &ProjectSnapshot,
    awards: impl IntoIterator<Item = (Uuid, Decimal)>,
) -> Vec<ContractorTotal> {
    let mut totals: Vec<ContractorTotal> = Vec::new();
    for (contractor_id, amount) in awards {
        match totals.iter_mut().find(|t| t.contractor_id == contractor_id) {
            Some(entry) => entry.total_amount += amount,
            None => totals.push(ContractorTotal {
                contractor_id,
                name: snapshot.display_name(contractor_id),
                total_amount: amount,
                percentage: 0.0,
            }),
        }
    }

    let grand_total: Decimal = totals.iter().map(|t| t.total_amount).sum();
    for entry in &mut totals {
        entry.percentage = percent(entry.total_amount, grand_total);
    }

    totals.sort_by(|a, b| {
        b.total_amount
            .cmp(&a.total_amount)
            .then_with(|| a.name.cmp(&b.name))
    });
    totals
}

/// `part / whole * 100`, or 0 when `whole` is zero.
pub(crate) fn percent(part: Decimal, whole: Decimal) -> f64 {
    if whole.is_zero() {
        return 0.0;
    }
    let ratio = part.to_f64().unwrap_or(0.0) / whole.to_f64().unwrap_or(1.0);
    (ratio * 10_000.0).round() / 100.0
}

pub(crate) fn count_percent(part: usize, whole: usize) -> f64 {
    percent(Decimal::from(part), Decimal::from(whole))
}

/// Money with thousands separators, e.g. `$12,500.00`.
pub(crate) fn format_money(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let sign = if rounded.is_sign_negative() { "-" } else { "" };
    let text = format!("{:.2}", rounded.abs());
    let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}${}.{}", sign, grouped, cents)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::collections::HashMap;

    use chrono::Utc;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use super::ProjectSnapshot;
    use crate::domain::{Bid, BidStatus, PackageStatus, User, UserRole};
    use crate::workflow::{self, fixtures};

    pub fn contractor(company: &str, experience_years: i32) -> User {
        User {
            id: Uuid::new_v4(),
            role: UserRole::Contractor,
            username: company.to_lowercase().replace(' ', "_"),
            email: None,
            full_name: String::new(),
            company_name: company.into(),
            phone: String::new(),
            address: String::new(),
            experience_years,
            is_verified: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub fn empty() -> ProjectSnapshot {
        ProjectSnapshot {
            project: fixtures::project(Uuid::new_v4()),
            packages: Vec::new(),
            bids: Vec::new(),
            team: None,
            users: HashMap::new(),
        }
    }

    /// Adds a package with `estimated` cost and, when `award` is given, an
    /// accepted bid from that contractor driven through the award workflow.
    pub fn add_package(
        snapshot: &mut ProjectSnapshot,
        title: &str,
        estimated: i64,
        award: Option<(&User, i64)>,
        status: PackageStatus,
    ) -> Option<Bid> {
        let mut package = fixtures::package(&snapshot.project, title);
        package.estimated_cost = Some(Decimal::from(estimated));

        let awarded = award.map(|(user, amount)| {
            snapshot.users.insert(user.id, user.clone());
            let mut bid = fixtures::bid(&package, user.id, amount, BidStatus::Submitted);
            let outcome = workflow::award(
                &mut bid,
                &mut package,
                &snapshot.project,
                snapshot.team.take(),
                snapshot.project.council_id,
                None,
                Utc::now(),
            )
            .unwrap();
            snapshot.team = Some(outcome.formation.roster);
            bid
        });

        package.status = status;
        snapshot.packages.push(package);
        if let Some(bid) = &awarded {
            snapshot.bids.push(bid.clone());
        }
        awarded
    }
}
