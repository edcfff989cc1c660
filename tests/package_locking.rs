//! Postgres-backed checks that an award cannot be overwritten by a stale
//! writer.
//!
//! These need a live database. Run with
//! `DATABASE_URL=postgres://... cargo test --test package_locking -- --ignored`.

mod common;

use assert_matches::assert_matches;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use common::{bid, contractor, council, package, project};
use council_procurement::domain::{Bid, BidStatus, Package, PackageStatus};
use council_procurement::repo;
use council_procurement::workflow::bid_lifecycle;

/// Postgres SQLSTATE for a violated CHECK constraint
const CHECK_VIOLATION: &str = "23514";
/// Postgres SQLSTATE raised when `lock_timeout` expires
const LOCK_NOT_AVAILABLE: &str = "55P03";

/// Stores a council, a contractor, one published project with one open
/// package, and a submitted bid on it. Returns the package, the bid and the
/// council's id.
async fn seed(pool: &PgPool) -> (Package, Bid, Uuid) {
    let mut conn = pool.acquire().await.unwrap();
    let owner = repo::users::insert(&mut *conn, &council("Leeds City Council"))
        .await
        .unwrap();
    let bidder = repo::users::insert(&mut *conn, &contractor("Aire Groundworks"))
        .await
        .unwrap();
    let project = repo::projects::insert(&mut *conn, &project(owner.id)).await.unwrap();
    let package = repo::packages::insert(&mut *conn, &package(&project, "Drainage", 20_000))
        .await
        .unwrap();
    let bid = repo::bids::insert(&mut *conn, &bid(&package, bidder.id, 18_500))
        .await
        .unwrap();
    (package, bid, owner.id)
}

/// Accepts `bid` and stores the award the way the bid service does.
async fn award(pool: &PgPool, package: &Package, bid: &Bid, reviewer: Uuid) -> Package {
    let mut package = package.clone();
    let mut bid = bid.clone();
    bid_lifecycle::accept(&mut bid, &mut package, reviewer, None, Utc::now()).unwrap();

    let mut tx = pool.begin().await.unwrap();
    repo::bids::update(&mut *tx, &bid).await.unwrap();
    let package = repo::packages::award(&mut *tx, &package).await.unwrap();
    tx.commit().await.unwrap();
    package
}

#[sqlx::test]
#[ignore = "needs a live Postgres via DATABASE_URL"]
async fn test_stale_package_edit_cannot_reopen_an_award(pool: PgPool) {
    let (stale, bid, reviewer) = seed(&pool).await;
    award(&pool, &stale, &bid, reviewer).await;

    // An edit computed before the award still carries `open`.
    let mut edit = stale.clone();
    edit.title = "Drainage and culverts".into();
    let mut conn = pool.acquire().await.unwrap();
    let err = repo::packages::update(&mut *conn, &edit).await.unwrap_err();
    assert_matches!(
        err,
        sqlx::Error::Database(ref db) if db.code().as_deref() == Some(CHECK_VIOLATION)
    );

    let stored = repo::packages::find(&mut *conn, stale.id).await.unwrap().unwrap();
    assert_eq!(stored.status, PackageStatus::Awarded);
    assert_eq!(stored.awarded_bid_id, Some(bid.id));
    assert_eq!(stored.title, "Drainage");
}

#[sqlx::test]
#[ignore = "needs a live Postgres via DATABASE_URL"]
async fn test_package_edit_leaves_award_reference_alone(pool: PgPool) {
    let (package, bid, reviewer) = seed(&pool).await;
    let awarded = award(&pool, &package, &bid, reviewer).await;

    let mut edit = awarded.clone();
    edit.awarded_bid_id = None;
    edit.status = PackageStatus::InProgress;
    let mut conn = pool.acquire().await.unwrap();
    let stored = repo::packages::update(&mut *conn, &edit).await.unwrap();

    assert_eq!(stored.status, PackageStatus::InProgress);
    assert_eq!(stored.awarded_bid_id, Some(bid.id));
}

#[sqlx::test]
#[ignore = "needs a live Postgres via DATABASE_URL"]
async fn test_second_award_on_stale_copy_matches_nothing(pool: PgPool) {
    let (stale, first, reviewer) = seed(&pool).await;
    award(&pool, &stale, &first, reviewer).await;

    let mut conn = pool.acquire().await.unwrap();
    let mut rival_package = stale.clone();
    rival_package.status = PackageStatus::Awarded;
    rival_package.awarded_bid_id = Some(Uuid::new_v4());
    let err = repo::packages::award(&mut *conn, &rival_package).await.unwrap_err();
    assert_matches!(err, sqlx::Error::RowNotFound);

    let stored = repo::packages::find(&mut *conn, stale.id).await.unwrap().unwrap();
    assert_eq!(stored.awarded_bid_id, Some(first.id));
    let winner = repo::bids::find(&mut *conn, first.id).await.unwrap().unwrap();
    assert_eq!(winner.status, BidStatus::Accepted);
}

#[sqlx::test]
#[ignore = "needs a live Postgres via DATABASE_URL"]
async fn test_project_lock_blocks_a_second_writer(pool: PgPool) {
    let (package, _, _) = seed(&pool).await;

    let mut holder = pool.begin().await.unwrap();
    repo::projects::lock(&mut *holder, package.project_id)
        .await
        .unwrap()
        .unwrap();

    let mut waiter = pool.begin().await.unwrap();
    sqlx::query("SET LOCAL lock_timeout = '200ms'")
        .execute(&mut *waiter)
        .await
        .unwrap();
    let err = repo::projects::lock(&mut *waiter, package.project_id)
        .await
        .unwrap_err();
    assert_matches!(
        err,
        sqlx::Error::Database(ref db) if db.code().as_deref() == Some(LOCK_NOT_AVAILABLE)
    );

    waiter.rollback().await.unwrap();
    holder.rollback().await.unwrap();
}
