//! Integration tests for catalog and APO CRUD operations.
//!
//! These tests require Docker (for the shared testcontainers PostgreSQL
//! instance) or a PostgreSQL reachable via `APO_TEST_PG_URL`. Each test
//! creates a unique database, runs migrations, and drops it on completion.

use uuid::Uuid;

use apo_db::models::{ApoStatus, EstimateStatus};
use apo_db::queries::{activities, headers, items, plantations};
use apo_test_utils::{create_test_db, drop_test_db};

#[tokio::test]
async fn insert_and_get_plantation() {
    let (pool, db_name) = create_test_db().await;

    let plantation = plantations::insert_plantation(&pool, "Block A", "Teak", 2022, 12.5)
        .await
        .expect("insert_plantation should succeed");

    assert_eq!(plantation.name, "Block A");
    assert_eq!(plantation.species, "Teak");
    assert_eq!(plantation.year_of_planting, 2022);
    assert_eq!(plantation.total_area_ha, 12.5);

    let fetched = plantations::get_plantation(&pool, plantation.id)
        .await
        .expect("get_plantation should succeed")
        .expect("plantation should exist");
    assert_eq!(fetched.id, plantation.id);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn get_missing_plantation_returns_none() {
    let (pool, db_name) = create_test_db().await;

    let fetched = plantations::get_plantation(&pool, Uuid::new_v4())
        .await
        .expect("get_plantation should succeed");
    assert!(fetched.is_none());

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn header_starts_in_draft_with_zero_total() {
    let (pool, db_name) = create_test_db().await;

    let plantation = plantations::insert_plantation(&pool, "Block B", "Teak", 2021, 8.0)
        .await
        .expect("insert_plantation should succeed");

    let mut tx = pool.begin().await.expect("begin should succeed");
    let header = headers::insert_header(&mut *tx, plantation.id, "2026-27", None)
        .await
        .expect("insert_header should succeed");
    tx.commit().await.expect("commit should succeed");

    assert_eq!(header.status, ApoStatus::Draft);
    assert_eq!(header.total_sanctioned_amount, 0.0);
    assert!(header.approved_by.is_none());

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn item_total_cost_computed_on_insert() {
    let (pool, db_name) = create_test_db().await;

    let plantation = plantations::insert_plantation(&pool, "Block C", "Teak", 2021, 8.0)
        .await
        .expect("insert_plantation should succeed");
    let activity = activities::insert_activity(&pool, "Weeding", "Maintenance", "Per Hectare", None)
        .await
        .expect("insert_activity should succeed");

    let mut tx = pool.begin().await.expect("begin should succeed");
    let header = headers::insert_header(&mut *tx, plantation.id, "2026-27", None)
        .await
        .expect("insert_header should succeed");
    let item = items::insert_item(
        &mut *tx,
        header.id,
        activity.id,
        &activity.name,
        &activity.unit,
        8.0,
        500.0,
    )
    .await
    .expect("insert_item should succeed");
    tx.commit().await.expect("commit should succeed");

    assert_eq!(item.total_cost, 4000.0);
    assert_eq!(item.estimate_status, EstimateStatus::Draft);
    assert!(item.revised_qty.is_none());
    assert_eq!(item.effective_qty(), 8.0);
    assert_eq!(item.effective_cost(), 4000.0);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn header_transition_guard_rejects_stale_status() {
    let (pool, db_name) = create_test_db().await;

    let plantation = plantations::insert_plantation(&pool, "Block D", "Teak", 2021, 8.0)
        .await
        .expect("insert_plantation should succeed");
    let mut tx = pool.begin().await.expect("begin should succeed");
    let header = headers::insert_header(&mut *tx, plantation.id, "2026-27", None)
        .await
        .expect("insert_header should succeed");
    tx.commit().await.expect("commit should succeed");

    // Guard matches: DRAFT -> PENDING_DM_APPROVAL.
    let moved = headers::transition_header_status(
        &pool,
        header.id,
        ApoStatus::Draft,
        ApoStatus::PendingDmApproval,
        None,
    )
    .await
    .expect("transition should succeed")
    .expect("guard should match");
    assert_eq!(moved.status, ApoStatus::PendingDmApproval);

    // Stale guard: the header is no longer DRAFT.
    let stale = headers::transition_header_status(
        &pool,
        header.id,
        ApoStatus::Draft,
        ApoStatus::PendingDmApproval,
        None,
    )
    .await
    .expect("transition should succeed");
    assert!(stale.is_none());

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn sanction_stamps_approved_by() {
    let (pool, db_name) = create_test_db().await;

    let plantation = plantations::insert_plantation(&pool, "Block E", "Teak", 2021, 8.0)
        .await
        .expect("insert_plantation should succeed");
    let mut tx = pool.begin().await.expect("begin should succeed");
    let header = headers::insert_header(&mut *tx, plantation.id, "2026-27", None)
        .await
        .expect("insert_header should succeed");
    tx.commit().await.expect("commit should succeed");

    for (from, to) in [
        (ApoStatus::Draft, ApoStatus::PendingDmApproval),
        (ApoStatus::PendingDmApproval, ApoStatus::PendingHoApproval),
    ] {
        headers::transition_header_status(&pool, header.id, from, to, None)
            .await
            .expect("transition should succeed")
            .expect("guard should match");
    }

    let actor = Uuid::new_v4();
    let sanctioned = headers::transition_header_status(
        &pool,
        header.id,
        ApoStatus::PendingHoApproval,
        ApoStatus::Sanctioned,
        Some(actor),
    )
    .await
    .expect("transition should succeed")
    .expect("guard should match");
    assert_eq!(sanctioned.status, ApoStatus::Sanctioned);
    assert_eq!(sanctioned.approved_by, Some(actor));

    let sanctioned_list = headers::list_sanctioned_for_plantation(&pool, plantation.id)
        .await
        .expect("list should succeed");
    assert_eq!(sanctioned_list.len(), 1);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn item_transition_guard_rejects_stale_status() {
    let (pool, db_name) = create_test_db().await;

    let plantation = plantations::insert_plantation(&pool, "Block F", "Teak", 2021, 8.0)
        .await
        .expect("insert_plantation should succeed");
    let activity = activities::insert_activity(&pool, "Weeding", "Maintenance", "Per Hectare", None)
        .await
        .expect("insert_activity should succeed");
    let mut tx = pool.begin().await.expect("begin should succeed");
    let header = headers::insert_header(&mut *tx, plantation.id, "2026-27", None)
        .await
        .expect("insert_header should succeed");
    let item = items::insert_item(
        &mut *tx,
        header.id,
        activity.id,
        &activity.name,
        &activity.unit,
        8.0,
        500.0,
    )
    .await
    .expect("insert_item should succeed");
    tx.commit().await.expect("commit should succeed");

    let submitted = items::transition_estimate_status(
        &pool,
        item.id,
        EstimateStatus::Draft,
        EstimateStatus::Submitted,
    )
    .await
    .expect("transition should succeed")
    .expect("guard should match");
    assert_eq!(submitted.estimate_status, EstimateStatus::Submitted);

    let stale = items::transition_estimate_status(
        &pool,
        item.id,
        EstimateStatus::Draft,
        EstimateStatus::Submitted,
    )
    .await
    .expect("transition should succeed");
    assert!(stale.is_none());

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn revised_qty_persists() {
    let (pool, db_name) = create_test_db().await;

    let plantation = plantations::insert_plantation(&pool, "Block G", "Teak", 2021, 8.0)
        .await
        .expect("insert_plantation should succeed");
    let activity = activities::insert_activity(&pool, "Weeding", "Maintenance", "Per Hectare", None)
        .await
        .expect("insert_activity should succeed");
    let mut tx = pool.begin().await.expect("begin should succeed");
    let header = headers::insert_header(&mut *tx, plantation.id, "2026-27", None)
        .await
        .expect("insert_header should succeed");
    let item = items::insert_item(
        &mut *tx,
        header.id,
        activity.id,
        &activity.name,
        &activity.unit,
        8.0,
        500.0,
    )
    .await
    .expect("insert_item should succeed");
    tx.commit().await.expect("commit should succeed");

    let mut tx = pool.begin().await.expect("begin should succeed");
    let revised = items::set_revised_qty(&mut *tx, item.id, 6.0)
        .await
        .expect("set_revised_qty should succeed");
    tx.commit().await.expect("commit should succeed");

    assert_eq!(revised.revised_qty, Some(6.0));
    assert_eq!(revised.effective_qty(), 6.0);
    assert_eq!(revised.effective_cost(), 3000.0);
    // The sanctioned figures never move.
    assert_eq!(revised.sanctioned_qty, 8.0);
    assert_eq!(revised.total_cost, 4000.0);

    pool.close().await;
    drop_test_db(&db_name).await;
}
