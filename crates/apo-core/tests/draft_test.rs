//! Integration tests for draft generation: norm resolution against real
//! catalog rows, quantity defaults and overrides, and the single-transaction
//! write of header plus items.

use std::collections::HashMap;

use chrono::{Datelike, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use apo_core::draft::generate_draft;
use apo_core::error::CoreError;
use apo_db::models::ApoStatus;
use apo_db::queries::{activities, norms, plantations};
use apo_test_utils::{create_test_db, drop_test_db};

async fn seed_activity(pool: &PgPool, name: &str) -> Uuid {
    activities::insert_activity(pool, name, "Maintenance", "Per Hectare", None)
        .await
        .expect("insert_activity should succeed")
        .id
}

/// A plantation whose age this year is `age`.
async fn seed_plantation(pool: &PgPool, species: &str, age: i32, area: f64) -> Uuid {
    let year = Utc::now().year() - age;
    plantations::insert_plantation(pool, "Block A", species, year, area)
        .await
        .expect("insert_plantation should succeed")
        .id
}

#[tokio::test]
async fn draft_prices_items_from_norms() {
    let (pool, db_name) = create_test_db().await;

    let plantation_id = seed_plantation(&pool, "Teak", 3, 10.0).await;
    let weeding = seed_activity(&pool, "Weeding").await;
    let watering = seed_activity(&pool, "Watering").await;
    norms::insert_norm(&pool, weeding, 3, None, 500.0, "2026-27")
        .await
        .expect("insert_norm should succeed");
    norms::insert_norm(&pool, watering, 3, None, 300.0, "2026-27")
        .await
        .expect("insert_norm should succeed");

    let mut quantities = HashMap::new();
    quantities.insert(weeding, 8.0);

    let draft = generate_draft(&pool, plantation_id, "2026-27", &quantities, None)
        .await
        .expect("generate_draft should succeed");

    assert_eq!(draft.header.status, ApoStatus::Draft);
    assert_eq!(draft.header.financial_year, "2026-27");
    assert_eq!(draft.items.len(), 2);

    let weeding_item = draft
        .items
        .iter()
        .find(|i| i.activity_id == weeding)
        .expect("weeding item should exist");
    assert_eq!(weeding_item.sanctioned_qty, 8.0);
    assert_eq!(weeding_item.total_cost, 4000.0);

    // Watering had no override; the quantity defaults to the area.
    let watering_item = draft
        .items
        .iter()
        .find(|i| i.activity_id == watering)
        .expect("watering item should exist");
    assert_eq!(watering_item.sanctioned_qty, 10.0);
    assert_eq!(watering_item.total_cost, 3000.0);

    assert_eq!(draft.header.total_sanctioned_amount, 7000.0);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn draft_without_norms_rejected() {
    let (pool, db_name) = create_test_db().await;
    let plantation_id = seed_plantation(&pool, "Teak", 3, 10.0).await;

    let err = generate_draft(&pool, plantation_id, "2026-27", &HashMap::new(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn draft_for_unknown_plantation_rejected() {
    let (pool, db_name) = create_test_db().await;

    let err = generate_draft(&pool, Uuid::new_v4(), "2026-27", &HashMap::new(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn quantity_for_uncovered_activity_rejected() {
    let (pool, db_name) = create_test_db().await;

    let plantation_id = seed_plantation(&pool, "Teak", 3, 10.0).await;
    let weeding = seed_activity(&pool, "Weeding").await;
    norms::insert_norm(&pool, weeding, 3, None, 500.0, "2026-27")
        .await
        .expect("insert_norm should succeed");

    let mut quantities = HashMap::new();
    quantities.insert(Uuid::new_v4(), 5.0);

    let err = generate_draft(&pool, plantation_id, "2026-27", &quantities, None)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn falls_back_to_nearest_lower_normed_age() {
    let (pool, db_name) = create_test_db().await;

    // Age 4 plantation, norms only at ages 2 and 6.
    let plantation_id = seed_plantation(&pool, "Teak", 4, 10.0).await;
    let weeding = seed_activity(&pool, "Weeding").await;
    norms::insert_norm(&pool, weeding, 2, None, 450.0, "2026-27")
        .await
        .expect("insert_norm should succeed");
    norms::insert_norm(&pool, weeding, 6, None, 350.0, "2026-27")
        .await
        .expect("insert_norm should succeed");

    let draft = generate_draft(&pool, plantation_id, "2026-27", &HashMap::new(), None)
        .await
        .expect("generate_draft should succeed");

    // The age-2 rate applies, not the age-6 one.
    assert_eq!(draft.items.len(), 1);
    assert_eq!(draft.items[0].sanctioned_rate, 450.0);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn species_specific_norm_beats_agnostic() {
    let (pool, db_name) = create_test_db().await;

    let plantation_id = seed_plantation(&pool, "Teak", 3, 10.0).await;
    let weeding = seed_activity(&pool, "Weeding").await;
    norms::insert_norm(&pool, weeding, 3, None, 500.0, "2026-27")
        .await
        .expect("insert_norm should succeed");
    norms::insert_norm(&pool, weeding, 3, Some("Teak"), 520.0, "2026-27")
        .await
        .expect("insert_norm should succeed");
    norms::insert_norm(&pool, weeding, 3, Some("Bamboo"), 480.0, "2026-27")
        .await
        .expect("insert_norm should succeed");

    let draft = generate_draft(&pool, plantation_id, "2026-27", &HashMap::new(), None)
        .await
        .expect("generate_draft should succeed");

    assert_eq!(draft.items.len(), 1, "one item per activity");
    assert_eq!(draft.items[0].sanctioned_rate, 520.0);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn repeated_drafts_are_independent() {
    let (pool, db_name) = create_test_db().await;

    let plantation_id = seed_plantation(&pool, "Teak", 3, 10.0).await;
    let weeding = seed_activity(&pool, "Weeding").await;
    norms::insert_norm(&pool, weeding, 3, None, 500.0, "2026-27")
        .await
        .expect("insert_norm should succeed");

    let first = generate_draft(&pool, plantation_id, "2026-27", &HashMap::new(), None)
        .await
        .expect("first draft should succeed");
    let second = generate_draft(&pool, plantation_id, "2026-27", &HashMap::new(), None)
        .await
        .expect("second draft should succeed");

    assert_ne!(first.header.id, second.header.id);
    assert_eq!(
        first.header.total_sanctioned_amount,
        second.header.total_sanctioned_amount
    );

    pool.close().await;
    drop_test_db(&db_name).await;
}
