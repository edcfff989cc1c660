use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::string_enum;
use super::{PackageResponse, PackageType};
use crate::validation::ValidationErrors;

/// Project status enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Draft,
    Published,
    InProgress,
    Completed,
    Cancelled,
}

string_enum!(ProjectStatus, "project status" {
    Draft => "draft",
    Published => "published",
    InProgress => "in_progress",
    Completed => "completed",
    Cancelled => "cancelled",
});

impl ProjectStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Published => "Published",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Statuses in which a public project shows up for contractors.
    pub fn is_listed_for_contractors(&self) -> bool {
        matches!(self, Self::Published | Self::InProgress)
    }
}

/// Project entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub council_id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub budget_range: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: ProjectStatus,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Planned duration in whole days.
    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.council_id == user_id
    }

    /// Whether a contractor may browse this project and bid on its packages.
    pub fn is_visible_to_contractors(&self) -> bool {
        self.is_public && self.status.is_listed_for_contractors()
    }
}

/// Request DTO for creating a project
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProjectRequest {
    pub title: String,
    pub description: String,
    pub location: String,
    #[serde(default)]
    pub budget_range: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub status: Option<ProjectStatus>,
    #[serde(default)]
    pub is_public: Option<bool>,
}

impl CreateProjectRequest {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors
            .require_text(&self.title, "title")
            .require_text(&self.description, "description")
            .require_text(&self.location, "location")
            .check(
                self.start_date < self.end_date,
                "end_date",
                "End date must be after start date.",
            );
        errors.into_result()
    }
}

/// Request DTO for updating a project
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProjectRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub budget_range: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<ProjectStatus>,
    #[serde(default)]
    pub is_public: Option<bool>,
}

impl UpdateProjectRequest {
    /// Validates the request against the stored project so that a partial
    /// date change cannot invert the range.
    pub fn validate(&self, current: &Project) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        for (value, field) in [
            (&self.title, "title"),
            (&self.description, "description"),
            (&self.location, "location"),
        ] {
            if let Some(value) = value {
                errors.require_text(value, field);
            }
        }

        let start = self.start_date.unwrap_or(current.start_date);
        let end = self.end_date.unwrap_or(current.end_date);
        errors.check(start < end, "end_date", "End date must be after start date.");
        errors.into_result()
    }

    /// Applies the present fields onto `project`.
    pub fn apply(self, project: &mut Project) {
        if let Some(title) = self.title {
            project.title = title;
        }
        if let Some(description) = self.description {
            project.description = description;
        }
        if let Some(location) = self.location {
            project.location = location;
        }
        if let Some(budget_range) = self.budget_range {
            project.budget_range = budget_range;
        }
        if let Some(start_date) = self.start_date {
            project.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            project.end_date = end_date;
        }
        if let Some(status) = self.status {
            project.status = status;
        }
        if let Some(is_public) = self.is_public {
            project.is_public = is_public;
        }
    }
}

/// Optional status filter on list endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectQuery {
    #[serde(default)]
    pub status: Option<ProjectStatus>,
}

/// Ordering of the available-projects list
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AvailableSort {
    #[default]
    Newest,
    Oldest,
    /// Soonest open deadline first
    Deadline,
}

/// Filters for the contractor-facing list of projects taking bids
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AvailableProjectQuery {
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub package_type: Option<PackageType>,
    #[serde(default)]
    pub search: Option<String>,
    /// Matches projects with at least one package estimated at or above this
    #[serde(default)]
    pub min_budget: Option<Decimal>,
    #[serde(default)]
    pub max_budget: Option<Decimal>,
    #[serde(default)]
    pub sort: AvailableSort,
}

impl AvailableProjectQuery {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        for (field, bound) in [("min_budget", self.min_budget), ("max_budget", self.max_budget)] {
            errors.check(
                bound.map_or(true, |b| !b.is_sign_negative()),
                field,
                "Budget filters cannot be negative",
            );
        }
        if let (Some(min), Some(max)) = (self.min_budget, self.max_budget) {
            errors.check(min <= max, "max_budget", "Must not be below min_budget");
        }
        errors.into_result()
    }

    pub fn location(&self) -> Option<&str> {
        non_blank(&self.location)
    }

    pub fn search(&self) -> Option<&str> {
        non_blank(&self.search)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Project with its packages
#[derive(Debug, Clone, Serialize)]
pub struct ProjectDetailResponse {
    #[serde(flatten)]
    pub project: Project,
    pub status_label: &'static str,
    pub duration_days: i64,
    pub packages: Vec<PackageResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn project() -> Project {
        Project {
            id: Uuid::new_v4(),
            council_id: Uuid::new_v4(),
            title: "Ring road".into(),
            description: "Resurface".into(),
            location: "Leeds".into(),
            budget_range: String::new(),
            start_date: date(2026, 1, 1),
            end_date: date(2026, 3, 1),
            status: ProjectStatus::Published,
            is_public: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_create_rejects_inverted_dates() {
        let req = CreateProjectRequest {
            title: "Bridge".into(),
            description: "Repair".into(),
            location: "York".into(),
            budget_range: None,
            start_date: date(2026, 5, 1),
            end_date: date(2026, 5, 1),
            status: None,
            is_public: None,
        };
        let err = req.validate().unwrap_err();
        assert_eq!(err.fields().len(), 1);
        assert_eq!(err.fields()[0].field, "end_date");
    }

    #[test]
    fn test_update_checks_range_against_stored_dates() {
        let current = project();
        let req = UpdateProjectRequest {
            start_date: Some(date(2026, 4, 1)),
            ..Default::default()
        };
        assert!(req.validate(&current).is_err());

        let req = UpdateProjectRequest {
            end_date: Some(date(2026, 6, 1)),
            ..Default::default()
        };
        assert!(req.validate(&current).is_ok());
    }

    #[test]
    fn test_update_rejects_blank_title() {
        let req = UpdateProjectRequest {
            title: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(req.validate(&project()).unwrap_err().fields()[0].field, "title");
    }

    #[test]
    fn test_duration_and_visibility() {
        let mut p = project();
        assert_eq!(p.duration_days(), 59);
        assert!(p.is_visible_to_contractors());
        p.status = ProjectStatus::Draft;
        assert!(!p.is_visible_to_contractors());
        p.status = ProjectStatus::InProgress;
        p.is_public = false;
        assert!(!p.is_visible_to_contractors());
    }

    #[test]
    fn test_available_query_ignores_blank_text() {
        let query: AvailableProjectQuery = serde_json::from_value(serde_json::json!({
            "location": "  ",
            "search": " harbour ",
            "package_type": "wiring",
            "min_budget": "1000.50"
        }))
        .unwrap();

        assert_eq!(query.location(), None);
        assert_eq!(query.search(), Some("harbour"));
        assert_eq!(query.package_type, Some(PackageType::Wiring));
        assert_eq!(query.min_budget, Some(Decimal::new(100050, 2)));
        assert_eq!(query.sort, AvailableSort::Newest);
        assert!(query.validate().is_ok());
    }

    #[test]
    fn test_available_query_rejects_inverted_budget() {
        let query = AvailableProjectQuery {
            min_budget: Some(Decimal::from(5000)),
            max_budget: Some(Decimal::from(1000)),
            ..Default::default()
        };
        assert_eq!(query.validate().unwrap_err().fields()[0].field, "max_budget");

        let query = AvailableProjectQuery {
            min_budget: Some(Decimal::from(-1)),
            ..Default::default()
        };
        assert_eq!(query.validate().unwrap_err().fields()[0].field, "min_budget");
    }
}
