use std::collections::HashMap;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{Bid, BidStatus, Package, PackageStatus, Project, User};
use crate::workflow::TeamRoster;

/// Everything the report builders read about one project
#[derive(Debug, Clone)]
pub struct ProjectSnapshot {
    pub project: Project,
    pub packages: Vec<Package>,
    pub bids: Vec<Bid>,
    pub team: Option<TeamRoster>,
    /// Profiles of every contractor referenced by a bid or team membership
    pub users: HashMap<Uuid, User>,
}

impl ProjectSnapshot {
    pub fn count_packages(&self, status: PackageStatus) -> usize {
        self.packages.iter().filter(|p| p.status == status).count()
    }

    pub fn count_bids(&self, status: BidStatus) -> usize {
        self.bids.iter().filter(|b| b.status == status).count()
    }

    pub fn bids_for(&self, package_id: Uuid) -> impl Iterator<Item = &Bid> {
        self.bids.iter().filter(move |b| b.package_id == package_id)
    }

    pub fn awarded_bid(&self, package: &Package) -> Option<&Bid> {
        let bid_id = package.awarded_bid_id?;
        self.bids.iter().find(|b| b.id == bid_id)
    }

    /// Packages carrying an award, paired with the winning bid.
    pub fn awards(&self) -> impl Iterator<Item = (&Package, &Bid)> {
        self.packages
            .iter()
            .filter_map(move |p| self.awarded_bid(p).map(|b| (p, b)))
    }

    /// Awards on packages in `awarded`, `in_progress` or `completed`.
    pub fn contracts(&self) -> impl Iterator<Item = (&Package, &Bid)> {
        self.awards().filter(|(p, _)| p.status.is_contracted())
    }

    /// Sum of winning amounts on packages whose status is exactly `awarded`.
    pub fn total_awarded_value(&self) -> Decimal {
        self.awards()
            .filter(|(p, _)| p.status == PackageStatus::Awarded)
            .map(|(_, b)| b.bid_amount)
            .sum()
    }

    pub fn display_name(&self, user_id: Uuid) -> String {
        self.users
            .get(&user_id)
            .map(User::display_name)
            .unwrap_or_else(|| "Unknown contractor".to_string())
    }

    pub fn experience_years(&self, user_id: Uuid) -> i32 {
        self.users
            .get(&user_id)
            .map(|u| u.experience_years)
            .unwrap_or(0)
    }
}
