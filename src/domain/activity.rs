//! Activity log domain types
//!
//! Append-only audit trail of significant user actions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::string_enum;

/// Kind of action recorded in the activity log
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    ProfileCreated,
    ProfileUpdated,
    ProjectCreated,
    ProjectUpdated,
    ProjectPublished,
    ProjectDeleted,
    PackageCreated,
    PackageUpdated,
    PackageDeleted,
    BidDrafted,
    BidSubmitted,
    BidUpdated,
    BidReviewed,
    BidAwarded,
    BidRejected,
    BidWithdrawn,
    BidDeleted,
    TeamCreated,
    TeamUpdated,
    TeamMemberAdded,
    TeamMemberRemoved,
    ReportGenerated,
    ReportUpdated,
    ReportDeleted,
}

string_enum!(ActivityKind, "activity kind" {
    ProfileCreated => "profile_created",
    ProfileUpdated => "profile_updated",
    ProjectCreated => "project_created",
    ProjectUpdated => "project_updated",
    ProjectPublished => "project_published",
    ProjectDeleted => "project_deleted",
    PackageCreated => "package_created",
    PackageUpdated => "package_updated",
    PackageDeleted => "package_deleted",
    BidDrafted => "bid_drafted",
    BidSubmitted => "bid_submitted",
    BidUpdated => "bid_updated",
    BidReviewed => "bid_reviewed",
    BidAwarded => "bid_awarded",
    BidRejected => "bid_rejected",
    BidWithdrawn => "bid_withdrawn",
    BidDeleted => "bid_deleted",
    TeamCreated => "team_created",
    TeamUpdated => "team_updated",
    TeamMemberAdded => "team_member_added",
    TeamMemberRemoved => "team_member_removed",
    ReportGenerated => "report_generated",
    ReportUpdated => "report_updated",
    ReportDeleted => "report_deleted",
});

/// Stored activity log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub action: ActivityKind,
    pub details: String,
    pub created_at: DateTime<Utc>,
}

/// Activity entry waiting to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivity {
    pub user_id: Uuid,
    pub kind: ActivityKind,
    pub details: String,
}

impl NewActivity {
    pub fn new(user_id: Uuid, kind: ActivityKind, details: impl Into<String>) -> Self {
        Self {
            user_id,
            kind,
            details: details.into(),
        }
    }
}
