//! Bid commands and queries
//!
//! Every command runs in a transaction that locks the project, then the bid,
//! then the package, checks who is asking, runs the pure transition from
//! [`crate::workflow`], and persists the result. Taking the locks in that
//! order everywhere serialises each command against concurrent awards on the
//! same project. Accepting a bid is the only command with cascades.

use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::domain::{
    ActivityKind, Bid, BidQuery, BidReviewResponse, BidStatistics, BidStatus, CreateBidRequest,
    NewActivity, Package, Project, UpdateBidRequest, User,
};
use crate::error::{ApiError, ApiResult};
use crate::repo;
use crate::services::{ActivityRecorder, RedisCache};
use crate::workflow::{self, bid_lifecycle, AwardOutcome, Transition};

#[derive(Clone)]
pub struct BidService {
    db: PgPool,
    cache: RedisCache,
    activity: ActivityRecorder,
}

/// A bid with the package and project it belongs to
struct Scoped {
    bid: Bid,
    package: Package,
    project: Project,
}

async fn load_scope(conn: &mut PgConnection, bid_id: Uuid) -> ApiResult<Scoped> {
    let bid = repo::bids::find(&mut *conn, bid_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Bid"))?;
    let package = repo::packages::find(&mut *conn, bid.package_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Package"))?;
    let project = repo::projects::find(&mut *conn, package.project_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Project"))?;
    Ok(Scoped {
        bid,
        package,
        project,
    })
}

/// [`load_scope`] for writers: locks project, bid and package `FOR UPDATE`
/// in that order. Must run inside a transaction.
async fn lock_scope(conn: &mut PgConnection, bid_id: Uuid) -> ApiResult<Scoped> {
    let unlocked = load_scope(&mut *conn, bid_id).await?;

    let project = repo::projects::lock(&mut *conn, unlocked.project.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Project"))?;
    let bid = repo::bids::lock(&mut *conn, bid_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Bid"))?;
    let package = repo::packages::lock(&mut *conn, bid.package_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Package"))?;
    Ok(Scoped {
        bid,
        package,
        project,
    })
}

fn ensure_bid_owner(bid: &Bid, user: &User) -> ApiResult<()> {
    if bid.contractor_id != user.id {
        return Err(ApiError::forbidden("You can only manage your own bids"));
    }
    Ok(())
}

fn ensure_project_owner(project: &Project, user: &User) -> ApiResult<()> {
    if !project.is_owned_by(user.id) {
        return Err(ApiError::forbidden(
            "Only the council that owns this project can review its bids",
        ));
    }
    Ok(())
}

impl BidService {
    pub fn new(db: PgPool, cache: RedisCache, activity: ActivityRecorder) -> Self {
        Self { db, cache, activity }
    }

    /// Places a contractor's bid on an open package.
    pub async fn create(
        &self,
        contractor: &User,
        package_id: Uuid,
        req: CreateBidRequest,
    ) -> ApiResult<Bid> {
        req.validate()?;
        let now = Utc::now();
        let mut tx = self.db.begin().await?;

        let project_id = repo::packages::find(&mut *tx, package_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Package"))?
            .project_id;
        let project = repo::projects::lock(&mut *tx, project_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Project"))?;
        let package = repo::packages::lock(&mut *tx, package_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Package"))?;

        if !project.is_visible_to_contractors() {
            return Err(ApiError::not_found("Package"));
        }
        if package.is_deadline_passed(now) {
            return Err(ApiError::invalid(
                "deadline",
                "The bidding deadline for this package has passed.",
            ));
        }
        if !package.accepts_bids(now) {
            return Err(ApiError::conflict(format!(
                "Package is {} and not accepting bids",
                package.status.label()
            )));
        }
        if repo::bids::exists_for(&mut *tx, package.id, contractor.id).await? {
            return Err(ApiError::conflict("You have already placed a bid on this package"));
        }

        let (status, submitted_at) = if req.as_draft {
            (BidStatus::Draft, None)
        } else {
            (BidStatus::Submitted, Some(now))
        };
        let bid = repo::bids::insert(
            &mut *tx,
            &Bid {
                id: Uuid::new_v4(),
                package_id: package.id,
                contractor_id: contractor.id,
                bid_amount: req.bid_amount,
                duration_days: req.duration_days,
                proposal_text: req.proposal_text,
                status,
                review_notes: String::new(),
                reviewed_by: None,
                submitted_at,
                reviewed_at: None,
                created_at: now,
                updated_at: now,
            },
        )
        .await?;
        tx.commit().await?;

        tracing::info!(
            bid_id = %bid.id,
            package_id = %package.id,
            contractor_id = %contractor.id,
            status = %bid.status,
            "Bid created"
        );

        let kind = if req.as_draft {
            ActivityKind::BidDrafted
        } else {
            ActivityKind::BidSubmitted
        };
        self.activity.record(NewActivity::new(
            contractor.id,
            kind,
            format!("Bid of {} on package '{}'", bid.bid_amount, package.title),
        ));
        self.cache.invalidate_project(project.id).await;

        Ok(bid)
    }

    pub async fn edit(&self, contractor: &User, bid_id: Uuid, req: UpdateBidRequest) -> ApiResult<Bid> {
        req.validate()?;
        let mut tx = self.db.begin().await?;
        let Scoped { mut bid, package, .. } = lock_scope(&mut *tx, bid_id).await?;
        ensure_bid_owner(&bid, contractor)?;

        if !bid.status.is_editable() {
            return Err(ApiError::InvalidTransition(format!(
                "cannot edit a bid that is {}",
                bid.status
            )));
        }

        req.apply(&mut bid);
        let bid = repo::bids::update(&mut *tx, &bid).await?;
        tx.commit().await?;

        self.activity.record(NewActivity::new(
            contractor.id,
            ActivityKind::BidUpdated,
            format!("Updated bid on package '{}'", package.title),
        ));
        Ok(bid)
    }

    /// Only withdrawn bids may be deleted, and only by their contractor.
    pub async fn delete(&self, contractor: &User, bid_id: Uuid) -> ApiResult<()> {
        let mut tx = self.db.begin().await?;
        let Scoped { bid, package, project } = lock_scope(&mut *tx, bid_id).await?;
        ensure_bid_owner(&bid, contractor)?;

        if bid.status != BidStatus::Withdrawn {
            return Err(ApiError::InvalidTransition(format!(
                "cannot delete a bid that is {}; withdraw it first",
                bid.status
            )));
        }

        repo::bids::delete(&mut *tx, bid.id).await?;
        tx.commit().await?;

        self.activity.record(NewActivity::new(
            contractor.id,
            ActivityKind::BidDeleted,
            format!("Deleted withdrawn bid on package '{}'", package.title),
        ));
        self.cache.invalidate_project(project.id).await;
        Ok(())
    }

    /// Submits a draft while the package is still taking bids.
    pub async fn submit(&self, contractor: &User, bid_id: Uuid) -> ApiResult<Bid> {
        let now = Utc::now();
        let mut tx = self.db.begin().await?;
        let Scoped { mut bid, package, project } = lock_scope(&mut *tx, bid_id).await?;
        ensure_bid_owner(&bid, contractor)?;

        let transition = bid_lifecycle::submit(&mut bid, now)?;
        if !package.accepts_bids(now) {
            return Err(ApiError::conflict("Package is no longer accepting bids"));
        }

        let bid = repo::bids::update(&mut *tx, &bid).await?;
        tx.commit().await?;
        self.after_transition(contractor, &transition, &package, &project, ActivityKind::BidSubmitted)
            .await;
        Ok(bid)
    }

    pub async fn withdraw(&self, contractor: &User, bid_id: Uuid) -> ApiResult<Bid> {
        let mut tx = self.db.begin().await?;
        let Scoped { mut bid, package, project } = lock_scope(&mut *tx, bid_id).await?;
        ensure_bid_owner(&bid, contractor)?;

        let transition = bid_lifecycle::withdraw(&mut bid, Utc::now())?;
        let bid = repo::bids::update(&mut *tx, &bid).await?;
        tx.commit().await?;

        self.after_transition(contractor, &transition, &package, &project, ActivityKind::BidWithdrawn)
            .await;
        Ok(bid)
    }

    /// Marks a submitted bid as under review by the owning council.
    pub async fn start_review(
        &self,
        council: &User,
        bid_id: Uuid,
        notes: Option<String>,
    ) -> ApiResult<Bid> {
        let mut tx = self.db.begin().await?;
        let Scoped { mut bid, package, project } = lock_scope(&mut *tx, bid_id).await?;
        ensure_project_owner(&project, council)?;

        let transition =
            bid_lifecycle::start_review(&mut bid, council.id, notes.as_deref(), Utc::now())?;
        let bid = repo::bids::update(&mut *tx, &bid).await?;
        tx.commit().await?;

        self.after_transition(council, &transition, &package, &project, ActivityKind::BidReviewed)
            .await;
        Ok(bid)
    }

    pub async fn reject(&self, council: &User, bid_id: Uuid, notes: Option<String>) -> ApiResult<Bid> {
        let mut tx = self.db.begin().await?;
        let Scoped { mut bid, package, project } = lock_scope(&mut *tx, bid_id).await?;
        ensure_project_owner(&project, council)?;

        let transition = bid_lifecycle::reject(&mut bid, council.id, notes.as_deref(), Utc::now())?;
        let bid = repo::bids::update(&mut *tx, &bid).await?;
        tx.commit().await?;

        self.after_transition(council, &transition, &package, &project, ActivityKind::BidRejected)
            .await;
        Ok(bid)
    }

    /// Accepts a bid, awards its package and enrolls the contractor on the
    /// project team.
    ///
    /// The project row is locked first so concurrent awards on one project
    /// run one after the other; nothing is written unless every step passes.
    pub async fn accept(
        &self,
        council: &User,
        bid_id: Uuid,
        notes: Option<String>,
    ) -> ApiResult<AwardOutcome> {
        let now = Utc::now();
        let mut tx = self.db.begin().await?;

        let Scoped {
            mut bid,
            mut package,
            project,
        } = lock_scope(&mut *tx, bid_id).await?;
        ensure_project_owner(&project, council)?;
        let roster = repo::teams::find_for_project(&mut *tx, project.id).await?;

        let mut outcome = workflow::award(
            &mut bid,
            &mut package,
            &project,
            roster,
            council.id,
            notes.as_deref(),
            now,
        )?;

        outcome.bid = repo::bids::update(&mut *tx, &outcome.bid).await?;
        outcome.package = repo::packages::award(&mut *tx, &outcome.package).await?;

        let formation = &outcome.formation;
        if formation.team_created {
            repo::teams::insert(&mut *tx, &formation.roster.team).await?;
        } else if formation.lead_assigned {
            repo::teams::update(&mut *tx, &formation.roster.team).await?;
        }
        if let Some(member) = &formation.member_added {
            repo::teams::insert_member(&mut *tx, member).await?;
        }

        tx.commit().await?;

        tracing::info!(
            bid_id = %outcome.bid.id,
            package_id = %outcome.package.id,
            project_id = %project.id,
            team_id = %formation.roster.team.id,
            team_created = formation.team_created,
            member_added = formation.member_added.is_some(),
            lead_assigned = formation.lead_assigned,
            "Bid accepted and package awarded"
        );

        let mut entries = vec![NewActivity::new(
            council.id,
            ActivityKind::BidAwarded,
            format!(
                "Accepted bid of {} on package '{}'",
                outcome.bid.bid_amount, outcome.package.title
            ),
        )];
        if formation.team_created {
            entries.push(NewActivity::new(
                council.id,
                ActivityKind::TeamCreated,
                format!("Formed team '{}'", formation.roster.team.name),
            ));
        }
        if formation.member_added.is_some() {
            entries.push(NewActivity::new(
                council.id,
                ActivityKind::TeamMemberAdded,
                format!("Added awarded contractor to team '{}'", formation.roster.team.name),
            ));
        }
        self.activity.record_all(entries);
        self.cache.invalidate_project(project.id).await;

        Ok(outcome)
    }

    async fn after_transition(
        &self,
        actor: &User,
        transition: &Transition,
        package: &Package,
        project: &Project,
        kind: ActivityKind,
    ) {
        tracing::info!(
            bid_id = %transition.bid_id,
            action = %transition.action,
            from = %transition.from,
            to = %transition.to,
            user_id = %actor.id,
            "Bid transitioned"
        );
        self.activity.record(NewActivity::new(
            actor.id,
            kind,
            format!(
                "Bid on package '{}' moved from {} to {}",
                package.title,
                transition.from.label(),
                transition.to.label()
            ),
        ));
        self.cache.invalidate_project(project.id).await;
    }

    /// A contractor's own bids.
    pub async fn list_mine(
        &self,
        contractor: &User,
        query: &BidQuery,
        limit: i64,
        offset: i64,
    ) -> ApiResult<(Vec<Bid>, i64)> {
        let mut conn = self.db.acquire().await?;
        Ok(repo::bids::list_for_contractor(&mut conn, contractor.id, query.status, limit, offset).await?)
    }

    /// Bids across every project the council owns.
    pub async fn review_queue(
        &self,
        council: &User,
        query: &BidQuery,
        limit: i64,
        offset: i64,
    ) -> ApiResult<(Vec<Bid>, i64)> {
        let mut conn = self.db.acquire().await?;
        Ok(repo::bids::list_for_council(&mut conn, council.id, query.status, limit, offset).await?)
    }

    pub async fn list_for_package(&self, council: &User, package_id: Uuid) -> ApiResult<Vec<Bid>> {
        let mut conn = self.db.acquire().await?;
        let package = repo::packages::find(&mut conn, package_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Package"))?;
        let project = repo::projects::find(&mut conn, package.project_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Project"))?;
        ensure_project_owner(&project, council)?;

        Ok(repo::bids::list_for_package(&mut conn, package.id).await?)
    }

    /// Bid detail for the owning council, with the package's amount spread
    /// and the contractor's history.
    pub async fn review_detail(&self, council: &User, bid_id: Uuid) -> ApiResult<BidReviewResponse> {
        let mut conn = self.db.acquire().await?;
        let Scoped { bid, package, project } = load_scope(&mut conn, bid_id).await?;
        ensure_project_owner(&project, council)?;

        let contractor = repo::users::find(&mut conn, bid.contractor_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Contractor"))?;
        let package_bids = repo::bids::list_for_package(&mut conn, package.id).await?;
        let amounts: Vec<_> = package_bids.iter().map(|b| b.bid_amount).collect();
        let contractor_record = repo::bids::track_record(&mut conn, contractor.id).await?;

        Ok(BidReviewResponse {
            package_statistics: BidStatistics::from_amounts(&amounts),
            other_bids: package_bids.into_iter().filter(|b| b.id != bid.id).collect(),
            package_title: package.title,
            contractor: contractor.summary(),
            contractor_record,
            bid,
        })
    }

    /// A bid as seen by its contractor or by the owning council.
    pub async fn get(&self, user: &User, bid_id: Uuid) -> ApiResult<Bid> {
        let mut conn = self.db.acquire().await?;
        let Scoped { bid, project, .. } = load_scope(&mut conn, bid_id).await?;
        if bid.contractor_id != user.id && !project.is_owned_by(user.id) {
            return Err(ApiError::not_found("Bid"));
        }
        Ok(bid)
    }
}
