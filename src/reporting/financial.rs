use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{contractor_totals, percent, ContractorTotal, ProjectSnapshot, ReportHeader};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinancialReport {
    #[serde(flatten)]
    pub header: ReportHeader,
    /// Sum of winning bids on contracted packages
    pub total_awarded: Decimal,
    /// Sum of estimated costs over every package
    pub total_estimated: Decimal,
    pub budget_variance: Decimal,
    pub variance_percentage: f64,
    pub budget_utilization: f64,
    pub average_contract: Decimal,
    pub largest_contract: Decimal,
    pub smallest_contract: Decimal,
    pub packages: Vec<PackageFinancials>,
    pub contractors: Vec<ContractorTotal>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PackageFinancials {
    pub title: String,
    pub package_type: String,
    pub status: String,
    pub estimated_cost: Decimal,
    pub awarded_amount: Decimal,
    pub variance: Decimal,
    pub variance_percentage: f64,
    pub contractor: String,
}

fn budget_recommendation(variance_percentage: f64) -> &'static str {
    if variance_percentage > 10.0 {
        "Budget exceeds estimates significantly. Review scope and requirements."
    } else if variance_percentage < -10.0 {
        "Project is under budget. Consider scope enhancements or quality improvements."
    } else {
        "Budget is well-managed within acceptable variance ranges."
    }
}

pub fn build(snapshot: &ProjectSnapshot, now: DateTime<Utc>) -> FinancialReport {
    let contracts: Vec<_> = snapshot.contracts().collect();
    let amounts: Vec<Decimal> = contracts.iter().map(|(_, bid)| bid.bid_amount).collect();

    let total_awarded: Decimal = amounts.iter().sum();
    let total_estimated: Decimal = snapshot
        .packages
        .iter()
        .filter_map(|p| p.estimated_cost)
        .sum();
    let budget_variance = if total_estimated.is_zero() {
        Decimal::ZERO
    } else {
        total_awarded - total_estimated
    };
    let variance_percentage = percent(budget_variance, total_estimated);

    let average_contract = if amounts.is_empty() {
        Decimal::ZERO
    } else {
        (total_awarded / Decimal::from(amounts.len())).round_dp(2)
    };

    let packages = contracts
        .iter()
        .map(|(package, bid)| {
            let estimated = package.estimated_cost.unwrap_or_default();
            let variance = bid.bid_amount - estimated;
            PackageFinancials {
                title: package.title.clone(),
                package_type: package.package_type.label().to_string(),
                status: package.status.label().to_string(),
                estimated_cost: estimated,
                awarded_amount: bid.bid_amount,
                variance,
                variance_percentage: percent(variance, estimated),
                contractor: snapshot.display_name(bid.contractor_id),
            }
        })
        .collect();

    let contractors = contractor_totals(
        snapshot,
        contracts.iter().map(|(_, bid)| (bid.contractor_id, bid.bid_amount)),
    );

    let recommendations = vec![
        budget_recommendation(variance_percentage).to_string(),
        "Monitor ongoing package costs to ensure continued budget compliance.".to_string(),
        "Maintain detailed cost tracking for accurate financial reporting.".to_string(),
    ];

    FinancialReport {
        header: ReportHeader::new(snapshot, now),
        total_awarded,
        total_estimated,
        budget_variance,
        variance_percentage,
        budget_utilization: percent(total_awarded, total_estimated),
        average_contract,
        largest_contract: amounts.iter().copied().max().unwrap_or_default(),
        smallest_contract: amounts.iter().copied().min().unwrap_or_default(),
        packages,
        contractors,
        recommendations,
    }
}
