//! Entity builders shared by the integration tests

#![allow(dead_code)]

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use council_procurement::domain::{
    Bid, BidStatus, Package, PackageStatus, PackageType, Project, ProjectStatus, User, UserRole,
};

pub fn project(council_id: Uuid) -> Project {
    Project {
        id: Uuid::new_v4(),
        council_id,
        title: "Canal Towpath".into(),
        description: "Resurfacing and lighting".into(),
        location: "Birmingham".into(),
        budget_range: "£10k-£50k".into(),
        start_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
        status: ProjectStatus::Published,
        is_public: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn package(project: &Project, title: &str, estimate: i64) -> Package {
    Package {
        id: Uuid::new_v4(),
        project_id: project.id,
        title: title.into(),
        description: format!("{title} works"),
        package_type: PackageType::Road,
        estimated_cost: Some(Decimal::from(estimate)),
        deadline: Utc::now() + Duration::days(14),
        status: PackageStatus::Open,
        awarded_bid_id: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn bid(package: &Package, contractor_id: Uuid, amount: i64) -> Bid {
    Bid {
        id: Uuid::new_v4(),
        package_id: package.id,
        contractor_id,
        bid_amount: Decimal::from(amount),
        duration_days: 45,
        proposal_text: "Local crew, own plant".into(),
        status: BidStatus::Submitted,
        review_notes: String::new(),
        reviewed_by: None,
        submitted_at: Some(Utc::now()),
        reviewed_at: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn user(role: UserRole, full_name: &str, company: &str, experience_years: i32) -> User {
    User {
        id: Uuid::new_v4(),
        role,
        username: format!("user_{}", Uuid::new_v4().simple()),
        email: None,
        full_name: full_name.into(),
        company_name: company.into(),
        phone: String::new(),
        address: String::new(),
        experience_years,
        is_verified: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn contractor(company: &str) -> User {
    user(UserRole::Contractor, "", company, 6)
}

pub fn council(name: &str) -> User {
    user(UserRole::Council, name, "", 0)
}
