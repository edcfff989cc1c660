//! Postgres-backed checks for the queries behind dashboards, awards and
//! profile-driven report invalidation.
//!
//! These need a live database. Run with
//! `DATABASE_URL=postgres://... cargo test --test dashboard_queries -- --ignored`.

mod common;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use common::{bid, contractor, council, package, project};
use council_procurement::domain::{
    AvailableProjectQuery, ContractorTeam, MemberRole, PackageStatus, PackageType, Project,
    ProjectStatus, TeamMember, TeamStatus,
};
use council_procurement::repo;
use council_procurement::workflow::bid_lifecycle;

async fn store_project(pool: &PgPool, council_id: Uuid, title: &str) -> Project {
    let mut conn = pool.acquire().await.unwrap();
    let mut draft = project(council_id);
    draft.title = title.into();
    repo::projects::insert(&mut *conn, &draft).await.unwrap()
}

#[sqlx::test]
#[ignore = "needs a live Postgres via DATABASE_URL"]
async fn test_profile_touches_bid_on_staffed_and_owned_projects(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    let owner = repo::users::insert(&mut *conn, &council("York Council")).await.unwrap();
    let builder = repo::users::insert(&mut *conn, &contractor("Ouse Civils")).await.unwrap();
    drop(conn);

    let bid_on = store_project(&pool, owner.id, "Bridge Street").await;
    let staffed = store_project(&pool, owner.id, "Museum Gardens").await;
    let unrelated = store_project(&pool, owner.id, "Station Rise").await;

    let mut conn = pool.acquire().await.unwrap();
    let lot = repo::packages::insert(&mut *conn, &package(&bid_on, "Parapets", 9_000))
        .await
        .unwrap();
    repo::bids::insert(&mut *conn, &bid(&lot, builder.id, 8_000))
        .await
        .unwrap();

    let team = ContractorTeam {
        id: Uuid::new_v4(),
        project_id: staffed.id,
        name: "Gardens crew".into(),
        lead_contractor_id: None,
        status: TeamStatus::Forming,
        notes: String::new(),
        assigned_by: Some(owner.id),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    repo::teams::insert(&mut *conn, &team).await.unwrap();
    repo::teams::insert_member(
        &mut *conn,
        &TeamMember {
            id: Uuid::new_v4(),
            team_id: team.id,
            contractor_id: builder.id,
            role: MemberRole::Member,
            assigned_at: Utc::now(),
        },
    )
    .await
    .unwrap();

    let mut ids = repo::projects::ids_involving_user(&mut *conn, builder.id)
        .await
        .unwrap();
    ids.sort();
    let mut expected = vec![bid_on.id, staffed.id];
    expected.sort();
    assert_eq!(ids, expected);
    assert!(!ids.contains(&unrelated.id));

    let owned = repo::projects::ids_involving_user(&mut *conn, owner.id)
        .await
        .unwrap();
    assert_eq!(owned.len(), 3);
}

#[sqlx::test]
#[ignore = "needs a live Postgres via DATABASE_URL"]
async fn test_awarded_to_lists_only_the_winners_contracts(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    let owner = repo::users::insert(&mut *conn, &council("Hull Council")).await.unwrap();
    let winner = repo::users::insert(&mut *conn, &contractor("Humber Build")).await.unwrap();
    let loser = repo::users::insert(&mut *conn, &contractor("Wolds Paving")).await.unwrap();
    let site = repo::projects::insert(&mut *conn, &project(owner.id)).await.unwrap();
    let lot = repo::packages::insert(&mut *conn, &package(&site, "Kerbs", 12_000))
        .await
        .unwrap();
    let mut winning = repo::bids::insert(&mut *conn, &bid(&lot, winner.id, 11_250))
        .await
        .unwrap();
    repo::bids::insert(&mut *conn, &bid(&lot, loser.id, 11_900))
        .await
        .unwrap();

    let mut awarded = lot.clone();
    bid_lifecycle::accept(&mut winning, &mut awarded, owner.id, None, Utc::now()).unwrap();
    repo::bids::update(&mut *conn, &winning).await.unwrap();
    repo::packages::award(&mut *conn, &awarded).await.unwrap();

    let awards = repo::packages::awarded_to(&mut *conn, winner.id).await.unwrap();
    assert_eq!(awards.len(), 1);
    assert_eq!(awards[0].package.status, PackageStatus::Awarded);
    assert_eq!(awards[0].bid_id, winning.id);
    assert_eq!(awards[0].bid_amount, Decimal::from(11_250));
    assert_eq!(awards[0].project_title, site.title);
    assert!(awards[0].awarded_at.is_some());

    let none = repo::packages::awarded_to(&mut *conn, loser.id).await.unwrap();
    assert!(none.is_empty());
}

#[sqlx::test]
#[ignore = "needs a live Postgres via DATABASE_URL"]
async fn test_available_projects_need_an_open_package(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    let owner = repo::users::insert(&mut *conn, &council("Bath Council")).await.unwrap();

    let mut open_site = project(owner.id);
    open_site.title = "Pulteney Weir".into();
    let open_site = repo::projects::insert(&mut *conn, &open_site).await.unwrap();
    let mut soon = package(&open_site, "Sluice gates", 40_000);
    soon.deadline = Utc::now() + Duration::days(3);
    soon.package_type = PackageType::Water;
    repo::packages::insert(&mut *conn, &soon).await.unwrap();
    repo::packages::insert(&mut *conn, &package(&open_site, "Railings", 4_000))
        .await
        .unwrap();

    let mut closed_site = project(owner.id);
    closed_site.title = "Royal Crescent".into();
    let closed_site = repo::projects::insert(&mut *conn, &closed_site).await.unwrap();
    let mut done = package(&closed_site, "Lamps", 2_000);
    done.status = PackageStatus::Cancelled;
    repo::packages::insert(&mut *conn, &done).await.unwrap();

    let mut draft = project(owner.id);
    draft.status = ProjectStatus::Draft;
    let draft = repo::projects::insert(&mut *conn, &draft).await.unwrap();
    repo::packages::insert(&mut *conn, &package(&draft, "Survey", 1_000))
        .await
        .unwrap();

    let (listed, total) = repo::projects::list_available(
        &mut *conn,
        &AvailableProjectQuery::default(),
        Utc::now(),
        20,
        0,
    )
    .await
    .unwrap();
    assert_eq!(total, 1);
    assert_eq!(listed[0].project.id, open_site.id);
    assert_eq!(listed[0].open_packages, 2);
    assert_eq!(listed[0].closing_soon, 1);
    assert!(listed[0].next_deadline.is_some());

    let water = AvailableProjectQuery {
        package_type: Some(PackageType::Water),
        search: Some("weir".into()),
        min_budget: Some(Decimal::from(30_000)),
        ..Default::default()
    };
    let (_, total) = repo::projects::list_available(&mut *conn, &water, Utc::now(), 20, 0)
        .await
        .unwrap();
    assert_eq!(total, 1);

    let too_cheap = AvailableProjectQuery {
        max_budget: Some(Decimal::from(1_000)),
        ..Default::default()
    };
    let (_, total) = repo::projects::list_available(&mut *conn, &too_cheap, Utc::now(), 20, 0)
        .await
        .unwrap();
    assert_eq!(total, 0);
}
