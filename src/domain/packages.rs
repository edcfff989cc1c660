use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::string_enum;
use crate::validation::ValidationErrors;

/// Kind of work a package covers
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PackageType {
    Wiring,
    Plumbing,
    Traffic,
    Water,
    Road,
    Sanitation,
    Landscaping,
    Structural,
    Other,
}

string_enum!(PackageType, "package type" {
    Wiring => "wiring",
    Plumbing => "plumbing",
    Traffic => "traffic",
    Water => "water",
    Road => "road",
    Sanitation => "sanitation",
    Landscaping => "landscaping",
    Structural => "structural",
    Other => "other",
});

impl PackageType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Wiring => "Electrical Wiring",
            Self::Plumbing => "Plumbing",
            Self::Traffic => "Traffic Management",
            Self::Water => "Water Works",
            Self::Road => "Road Construction",
            Self::Sanitation => "Sanitation",
            Self::Landscaping => "Landscaping",
            Self::Structural => "Structural Works",
            Self::Other => "Other",
        }
    }
}

/// Package status enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PackageStatus {
    #[default]
    Open,
    InProgress,
    Awarded,
    Completed,
    Cancelled,
}

string_enum!(PackageStatus, "package status" {
    Open => "open",
    InProgress => "in_progress",
    Awarded => "awarded",
    Completed => "completed",
    Cancelled => "cancelled",
});

impl PackageStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Open => "Open for Bidding",
            Self::InProgress => "In Progress",
            Self::Awarded => "Awarded",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Statuses that follow an award and therefore count as contracted work.
    pub fn is_contracted(&self) -> bool {
        matches!(self, Self::Awarded | Self::InProgress | Self::Completed)
    }
}

/// Work package entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: String,
    pub package_type: PackageType,
    pub estimated_cost: Option<Decimal>,
    pub deadline: DateTime<Utc>,
    pub status: PackageStatus,
    pub awarded_bid_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Package {
    pub fn is_deadline_passed(&self, now: DateTime<Utc>) -> bool {
        now > self.deadline
    }

    /// Open status and a deadline still ahead.
    pub fn accepts_bids(&self, now: DateTime<Utc>) -> bool {
        self.status == PackageStatus::Open && !self.is_deadline_passed(now)
    }
}

/// Request DTO for creating a package
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePackageRequest {
    pub title: String,
    pub description: String,
    pub package_type: PackageType,
    #[serde(default)]
    pub estimated_cost: Option<Decimal>,
    pub deadline: DateTime<Utc>,
}

impl CreatePackageRequest {
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors
            .require_text(&self.title, "title")
            .require_text(&self.description, "description")
            .check(
                self.estimated_cost.map_or(true, |c| !c.is_sign_negative()),
                "estimated_cost",
                "Estimated cost cannot be negative.",
            )
            .check(
                self.deadline > now,
                "deadline",
                "Deadline must be in the future.",
            );
        errors.into_result()
    }
}

/// Request DTO for updating a package
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePackageRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub package_type: Option<PackageType>,
    #[serde(default)]
    pub estimated_cost: Option<Decimal>,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<PackageStatus>,
}

impl UpdatePackageRequest {
    /// Award status is owned by the bid workflow: it can only be reached by
    /// accepting a bid. Once awarded, a package only moves forward through
    /// contracted statuses and never leaves them.
    pub fn validate(&self, current: &Package, now: DateTime<Utc>) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(title) = &self.title {
            errors.require_text(title, "title");
        }
        if let Some(description) = &self.description {
            errors.require_text(description, "description");
        }
        if let Some(cost) = self.estimated_cost {
            errors.check(
                !cost.is_sign_negative(),
                "estimated_cost",
                "Estimated cost cannot be negative.",
            );
        }
        if let Some(deadline) = self.deadline {
            if deadline != current.deadline {
                errors.check(deadline > now, "deadline", "Deadline must be in the future.");
            }
        }
        if let Some(status) = self.status {
            if status != current.status {
                errors.check(
                    status != PackageStatus::Awarded,
                    "status",
                    "Packages are awarded by accepting a bid.",
                );
                match current.awarded_bid_id {
                    Some(_) => {
                        errors.check(
                            status.is_contracted(),
                            "status",
                            "An awarded package cannot be reopened or cancelled.",
                        );
                    }
                    None => {
                        errors.check(
                            !matches!(status, PackageStatus::InProgress | PackageStatus::Completed),
                            "status",
                            "Work can only start on an awarded package.",
                        );
                    }
                }
            }
        }
        errors.into_result()
    }

    pub fn apply(self, package: &mut Package) {
        if let Some(title) = self.title {
            package.title = title;
        }
        if let Some(description) = self.description {
            package.description = description;
        }
        if let Some(package_type) = self.package_type {
            package.package_type = package_type;
        }
        if let Some(cost) = self.estimated_cost {
            package.estimated_cost = Some(cost);
        }
        if let Some(deadline) = self.deadline {
            package.deadline = deadline;
        }
        if let Some(status) = self.status {
            package.status = status;
        }
    }
}

/// Package with bid counters, as listed under a project
#[derive(Debug, Clone, Serialize)]
pub struct PackageResponse {
    #[serde(flatten)]
    pub package: Package,
    pub package_type_label: &'static str,
    pub bid_count: i64,
    pub active_bid_count: i64,
}

/// Optional status filter on a contractor's awards
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AwardQuery {
    #[serde(default)]
    pub status: Option<PackageStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn package(status: PackageStatus, awarded: Option<Uuid>) -> Package {
        Package {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            title: "Drainage".into(),
            description: "Storm drains".into(),
            package_type: PackageType::Water,
            estimated_cost: Some(Decimal::from(5000)),
            deadline: Utc::now() + Duration::days(10),
            status,
            awarded_bid_id: awarded,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_create_rejects_past_deadline_and_negative_cost() {
        let now = Utc::now();
        let req = CreatePackageRequest {
            title: "Lighting".into(),
            description: "Street lights".into(),
            package_type: PackageType::Wiring,
            estimated_cost: Some(Decimal::from(-1)),
            deadline: now - Duration::hours(1),
        };
        let err = req.validate(now).unwrap_err();
        let fields: Vec<_> = err.fields().iter().map(|f| f.field).collect();
        assert_eq!(fields, vec!["estimated_cost", "deadline"]);
    }

    #[test]
    fn test_update_cannot_set_awarded_directly() {
        let current = package(PackageStatus::Open, None);
        let req = UpdatePackageRequest {
            status: Some(PackageStatus::Awarded),
            ..Default::default()
        };
        assert!(req.validate(&current, Utc::now()).is_err());
    }

    #[test]
    fn test_awarded_package_never_leaves_contracted_statuses() {
        let current = package(PackageStatus::Awarded, Some(Uuid::new_v4()));
        for status in [PackageStatus::Open, PackageStatus::Cancelled] {
            let req = UpdatePackageRequest {
                status: Some(status),
                ..Default::default()
            };
            let err = req.validate(&current, Utc::now()).unwrap_err();
            assert_eq!(err.fields()[0].field, "status");
        }

        let mut started = current.clone();
        for status in [PackageStatus::InProgress, PackageStatus::Completed] {
            let req = UpdatePackageRequest {
                status: Some(status),
                ..Default::default()
            };
            assert!(req.validate(&started, Utc::now()).is_ok());
            req.apply(&mut started);
            assert!(started.status.is_contracted());
            assert!(started.awarded_bid_id.is_some());
        }

        let req = UpdatePackageRequest {
            status: Some(PackageStatus::Cancelled),
            ..Default::default()
        };
        assert!(req.validate(&started, Utc::now()).is_err());
    }

    #[test]
    fn test_unawarded_package_can_be_cancelled_but_not_started() {
        let current = package(PackageStatus::Open, None);
        let cancel = UpdatePackageRequest {
            status: Some(PackageStatus::Cancelled),
            ..Default::default()
        };
        assert!(cancel.validate(&current, Utc::now()).is_ok());

        let start = UpdatePackageRequest {
            status: Some(PackageStatus::InProgress),
            ..Default::default()
        };
        assert!(start.validate(&current, Utc::now()).is_err());
    }

    #[test]
    fn test_unchanged_past_deadline_is_not_revalidated() {
        let mut current = package(PackageStatus::Open, None);
        current.deadline = Utc::now() - Duration::days(1);
        let req = UpdatePackageRequest {
            deadline: Some(current.deadline),
            title: Some("Renamed".into()),
            ..Default::default()
        };
        assert!(req.validate(&current, Utc::now()).is_ok());
    }

    #[test]
    fn test_accepts_bids_only_while_open_and_before_deadline() {
        let now = Utc::now();
        let mut p = package(PackageStatus::Open, None);
        assert!(p.accepts_bids(now));
        p.deadline = now - Duration::minutes(1);
        assert!(!p.accepts_bids(now));
        p.deadline = now + Duration::days(1);
        p.status = PackageStatus::Cancelled;
        assert!(!p.accepts_bids(now));
    }
}
