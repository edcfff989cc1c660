//! Bid analytics for councils and award portfolios for contractors

use std::cmp::Reverse;

use rust_decimal::Decimal;
use serde::Serialize;

use super::count_percent;
use super::dashboard::AwardedPackage;
use crate::domain::{Bid, BidStatus, PackageStatus};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatusCount {
    pub status: BidStatus,
    pub label: &'static str,
    pub count: usize,
}

/// Bid volume and value across every package a council owns
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BidAnalytics {
    pub total_bids: usize,
    /// Drafts and submissions nobody has picked up yet
    pub pending_bids: usize,
    pub under_review_bids: usize,
    pub accepted_bids: usize,
    pub rejected_bids: usize,
    pub withdrawn_bids: usize,
    pub acceptance_rate: f64,
    pub average_bid_amount: Decimal,
    pub total_bid_value: Decimal,
    pub by_status: Vec<StatusCount>,
}

impl BidAnalytics {
    pub fn build(bids: &[Bid]) -> Self {
        let count = |status: BidStatus| bids.iter().filter(|b| b.status == status).count();

        let total_bids = bids.len();
        let accepted_bids = count(BidStatus::Accepted);
        let total_bid_value: Decimal = bids.iter().map(|b| b.bid_amount).sum();
        let average_bid_amount = if total_bids == 0 {
            Decimal::ZERO
        } else {
            (total_bid_value / Decimal::from(total_bids)).round_dp(2)
        };

        Self {
            total_bids,
            pending_bids: count(BidStatus::Draft) + count(BidStatus::Submitted),
            under_review_bids: count(BidStatus::UnderReview),
            accepted_bids,
            rejected_bids: count(BidStatus::Rejected),
            withdrawn_bids: count(BidStatus::Withdrawn),
            acceptance_rate: count_percent(accepted_bids, total_bids),
            average_bid_amount,
            total_bid_value,
            by_status: BidStatus::ALL
                .iter()
                .map(|&status| StatusCount {
                    status,
                    label: status.label(),
                    count: count(status),
                })
                .collect(),
        }
    }
}

/// A contractor's awarded work with delivery statistics
#[derive(Debug, Clone, Serialize)]
pub struct AwardPortfolio {
    pub total_awards: usize,
    /// Awarded but not started
    pub upcoming: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub total_contract_value: Decimal,
    pub average_duration_days: f64,
    pub completion_rate: f64,
    pub awards: Vec<AwardedPackage>,
}

impl AwardPortfolio {
    /// Statistics cover every award; `status` only narrows the listed ones.
    pub fn build(mut awards: Vec<AwardedPackage>, status: Option<PackageStatus>) -> Self {
        awards.retain(|a| a.package.status.is_contracted());
        let count = |status: PackageStatus| {
            awards
                .iter()
                .filter(|a| a.package.status == status)
                .count()
        };

        let total_awards = awards.len();
        let completed = count(PackageStatus::Completed);
        let upcoming = count(PackageStatus::Awarded);
        let in_progress = count(PackageStatus::InProgress);
        let total_contract_value: Decimal = awards.iter().map(|a| a.bid_amount).sum();
        let average_duration_days = if total_awards == 0 {
            0.0
        } else {
            let days: i64 = awards.iter().map(|a| i64::from(a.duration_days)).sum();
            (days as f64 / total_awards as f64 * 100.0).round() / 100.0
        };

        if let Some(status) = status {
            awards.retain(|a| a.package.status == status);
        }
        awards.sort_by_key(|a| Reverse(a.awarded_at.unwrap_or(a.package.created_at)));

        Self {
            total_awards,
            upcoming,
            in_progress,
            completed,
            total_contract_value,
            average_duration_days,
            completion_rate: count_percent(completed, total_awards),
            awards,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use super::*;
    use crate::reporting::dashboard::fixtures::awarded;
    use crate::workflow::fixtures::{bid, package, project};

    #[test]
    fn test_no_bids_yields_zeroes() {
        let analytics = BidAnalytics::build(&[]);

        assert_eq!(analytics.total_bids, 0);
        assert_eq!(analytics.acceptance_rate, 0.0);
        assert_eq!(analytics.average_bid_amount, Decimal::ZERO);
        assert_eq!(analytics.total_bid_value, Decimal::ZERO);
        assert!(analytics.by_status.iter().all(|s| s.count == 0));
    }

    #[test]
    fn test_bid_analytics_counts_and_values() {
        let site = project(Uuid::new_v4());
        let lot = package(&site, "Lighting");
        let contractor = Uuid::new_v4();
        let bids = [
            bid(&lot, contractor, 1000, BidStatus::Draft),
            bid(&lot, contractor, 2000, BidStatus::Submitted),
            bid(&lot, contractor, 1500, BidStatus::UnderReview),
            bid(&lot, contractor, 1200, BidStatus::Accepted),
            bid(&lot, contractor, 1300, BidStatus::Rejected),
            bid(&lot, contractor, 1001, BidStatus::Withdrawn),
        ];

        let analytics = BidAnalytics::build(&bids);

        assert_eq!(analytics.total_bids, 6);
        assert_eq!(analytics.pending_bids, 2);
        assert_eq!(analytics.under_review_bids, 1);
        assert_eq!(analytics.accepted_bids, 1);
        assert_eq!(analytics.rejected_bids, 1);
        assert_eq!(analytics.withdrawn_bids, 1);
        assert_eq!(analytics.acceptance_rate, 16.67);
        assert_eq!(analytics.total_bid_value, Decimal::from(8001));
        assert_eq!(analytics.average_bid_amount, Decimal::new(133350, 2));
        assert_eq!(analytics.by_status.len(), BidStatus::ALL.len());
        assert_eq!(analytics.by_status.iter().map(|s| s.count).sum::<usize>(), 6);
    }

    #[test]
    fn test_empty_portfolio_has_zero_rates() {
        let portfolio = AwardPortfolio::build(Vec::new(), None);

        assert_eq!(portfolio.total_awards, 0);
        assert_eq!(portfolio.completion_rate, 0.0);
        assert_eq!(portfolio.average_duration_days, 0.0);
        assert_eq!(portfolio.total_contract_value, Decimal::ZERO);
    }

    #[test]
    fn test_portfolio_stats_ignore_status_filter() {
        let site = project(Uuid::new_v4());
        let mut roofing = awarded(&site, "Roofing", 5000, PackageStatus::Completed);
        roofing.duration_days = 20;
        let mut paving = awarded(&site, "Paving", 3000, PackageStatus::InProgress);
        paving.duration_days = 45;
        let fencing = awarded(&site, "Fencing", 2000, PackageStatus::Awarded);

        let portfolio = AwardPortfolio::build(
            vec![roofing, paving, fencing],
            Some(PackageStatus::Completed),
        );

        assert_eq!(portfolio.total_awards, 3);
        assert_eq!(portfolio.upcoming, 1);
        assert_eq!(portfolio.in_progress, 1);
        assert_eq!(portfolio.completed, 1);
        assert_eq!(portfolio.total_contract_value, Decimal::from(10000));
        assert_eq!(portfolio.average_duration_days, 31.67);
        assert_eq!(portfolio.completion_rate, 33.33);
        assert_eq!(portfolio.awards.len(), 1);
        assert_eq!(portfolio.awards[0].package.title, "Roofing");
    }

    #[test]
    fn test_portfolio_lists_latest_awards_first() {
        let site = project(Uuid::new_v4());
        let now = Utc::now();
        let mut older = awarded(&site, "Drainage", 1000, PackageStatus::Awarded);
        older.awarded_at = Some(now - Duration::days(10));
        let mut newer = awarded(&site, "Lighting", 1000, PackageStatus::Awarded);
        newer.awarded_at = Some(now);

        let portfolio = AwardPortfolio::build(vec![older, newer], None);

        let titles: Vec<_> = portfolio
            .awards
            .iter()
            .map(|a| a.package.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Lighting", "Drainage"]);
    }
}
