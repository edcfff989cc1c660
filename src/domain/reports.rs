use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::string_enum;
use crate::reporting::ReportData;
use crate::validation::ValidationErrors;

/// Report variant
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Progress,
    Financial,
    Quality,
    Completion,
}

string_enum!(ReportKind, "report type" {
    Progress => "progress",
    Financial => "financial",
    Quality => "quality",
    Completion => "completion",
});

impl ReportKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Progress => "Progress Report",
            Self::Financial => "Financial Report",
            Self::Quality => "Quality & Safety Report",
            Self::Completion => "Completion Report",
        }
    }

    /// Title given to an auto-generated report for `project_title`.
    pub fn generated_title(&self, project_title: &str) -> String {
        let prefix = match self {
            Self::Progress => "Progress Report",
            Self::Financial => "Financial Analysis",
            Self::Quality => "Quality & Safety Report",
            Self::Completion => "Completion Report",
        };
        format!("{} - {}", prefix, project_title)
    }

    pub fn generated_content(&self, project_title: &str) -> String {
        format!("Auto-generated {} report for {}", self.as_str(), project_title)
    }
}

/// Stored report entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub title: String,
    pub report_type: ReportKind,
    pub content: String,
    pub project_id: Option<Uuid>,
    pub package_id: Option<Uuid>,
    pub bid_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for auto-generating a report
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateReportRequest {
    pub project_id: Uuid,
    pub report_type: ReportKind,
}

/// Request DTO for editing a stored report's free text
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateReportRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl UpdateReportRequest {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(title) = &self.title {
            errors.require_text(title, "title");
        }
        errors.into_result()
    }
}

/// Stored report with its data computed from the current project state
#[derive(Debug, Clone, Serialize)]
pub struct ReportResponse {
    pub report: Report,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ReportData>,
}
