use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::string_enum;
use super::UserSummary;
use crate::validation::ValidationErrors;

/// Bid status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BidStatus {
    #[default]
    Draft,
    Submitted,
    UnderReview,
    Accepted,
    Rejected,
    Withdrawn,
}

string_enum!(BidStatus, "bid status" {
    Draft => "draft",
    Submitted => "submitted",
    UnderReview => "under_review",
    Accepted => "accepted",
    Rejected => "rejected",
    Withdrawn => "withdrawn",
});

impl BidStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Submitted => "Submitted",
            Self::UnderReview => "Under Review",
            Self::Accepted => "Accepted",
            Self::Rejected => "Rejected",
            Self::Withdrawn => "Withdrawn",
        }
    }

    /// Pre-terminal statuses the contractor may still withdraw from.
    pub fn is_withdrawable(&self) -> bool {
        matches!(self, Self::Draft | Self::Submitted | Self::UnderReview)
    }

    /// Statuses a council may accept or reject from.
    pub fn is_reviewable(&self) -> bool {
        matches!(self, Self::Submitted | Self::UnderReview)
    }

    /// Statuses in which the contractor may still edit the bid.
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Draft | Self::Submitted)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected | Self::Withdrawn)
    }
}

/// Bid entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bid {
    pub id: Uuid,
    pub package_id: Uuid,
    pub contractor_id: Uuid,
    pub bid_amount: Decimal,
    pub duration_days: i32,
    pub proposal_text: String,
    pub status: BidStatus,
    pub review_notes: String,
    pub reviewed_by: Option<Uuid>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn validate_terms(
    errors: &mut ValidationErrors,
    amount: Option<Decimal>,
    duration_days: Option<i32>,
    proposal_text: Option<&str>,
) {
    if let Some(amount) = amount {
        errors.check(
            !amount.is_sign_negative(),
            "bid_amount",
            "Bid amount cannot be negative.",
        );
    }
    if let Some(days) = duration_days {
        errors.check(days >= 1, "duration_days", "Duration must be at least 1 day.");
    }
    if let Some(text) = proposal_text {
        errors.require_text(text, "proposal_text");
    }
}

/// Request DTO for creating a bid
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBidRequest {
    pub bid_amount: Decimal,
    pub duration_days: i32,
    pub proposal_text: String,
    /// Keep the bid as a draft instead of submitting it straight away.
    #[serde(default)]
    pub as_draft: bool,
}

impl CreateBidRequest {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validate_terms(
            &mut errors,
            Some(self.bid_amount),
            Some(self.duration_days),
            Some(&self.proposal_text),
        );
        errors.into_result()
    }
}

/// Request DTO for updating a bid
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBidRequest {
    #[serde(default)]
    pub bid_amount: Option<Decimal>,
    #[serde(default)]
    pub duration_days: Option<i32>,
    #[serde(default)]
    pub proposal_text: Option<String>,
}

impl UpdateBidRequest {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validate_terms(
            &mut errors,
            self.bid_amount,
            self.duration_days,
            self.proposal_text.as_deref(),
        );
        errors.into_result()
    }

    pub fn apply(self, bid: &mut Bid) {
        if let Some(amount) = self.bid_amount {
            bid.bid_amount = amount;
        }
        if let Some(days) = self.duration_days {
            bid.duration_days = days;
        }
        if let Some(text) = self.proposal_text {
            bid.proposal_text = text;
        }
    }
}

/// Request DTO for council review actions
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewBidRequest {
    #[serde(default)]
    pub notes: Option<String>,
}

/// Optional status filter for bid listings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BidQuery {
    #[serde(default)]
    pub status: Option<BidStatus>,
}

/// Amount spread across every bid on a package
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct BidStatistics {
    pub lowest: Option<Decimal>,
    pub highest: Option<Decimal>,
    pub average: Option<Decimal>,
    pub bid_count: usize,
}

impl BidStatistics {
    pub fn from_amounts(amounts: &[Decimal]) -> Self {
        if amounts.is_empty() {
            return Self::default();
        }
        let total: Decimal = amounts.iter().copied().sum();
        Self {
            lowest: amounts.iter().copied().min(),
            highest: amounts.iter().copied().max(),
            average: Some((total / Decimal::from(amounts.len())).round_dp(2)),
            bid_count: amounts.len(),
        }
    }
}

/// A contractor's bidding history across all packages
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ContractorTrackRecord {
    pub total_bids: i64,
    pub accepted_bids: i64,
    pub pending_bids: i64,
}

/// Council-facing review view of a bid
#[derive(Debug, Clone, Serialize)]
pub struct BidReviewResponse {
    pub bid: Bid,
    pub package_title: String,
    pub contractor: UserSummary,
    /// Competing bids on the same package, cheapest first
    pub other_bids: Vec<Bid>,
    pub package_statistics: BidStatistics,
    pub contractor_record: ContractorTrackRecord,
}
