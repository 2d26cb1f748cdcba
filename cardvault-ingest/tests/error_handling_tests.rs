//! Import failure modes
//!
//! Every fatal condition surfaces the first error; writes already committed
//! stay committed and a corrected re-run converges.

mod helpers;

use cardvault_common::config::ImportSettings;
use cardvault_ingest::{ImportCoordinator, ImportError};
use helpers::{card, count_rows, create_test_db, document, import_document, set, test_settings};
use serde_json::json;
use std::io::Cursor;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_truncated_document_is_structural_error() {
    let (_temp_dir, pool) = create_test_db().await.unwrap();

    let mut doc = document(vec![("10E", set("10E", vec![card("10E", "1", "Foo")]))]);
    doc.truncate(doc.len() - 10);

    let result = import_document(&pool, doc).await;
    assert!(
        matches!(result, Err(ImportError::StructuralParse { .. })),
        "{:?}",
        result
    );
}

#[tokio::test]
async fn test_document_without_data_is_structural_error() {
    let (_temp_dir, pool) = create_test_db().await.unwrap();

    let result = import_document(&pool, br#"{"meta": {"version": "5"}}"#.to_vec()).await;
    assert!(matches!(result, Err(ImportError::StructuralParse { .. })));
    assert_eq!(count_rows(&pool, "card_sets").await, 0);
}

#[tokio::test]
async fn test_non_numeric_multiverse_id_is_mapping_error() {
    let (_temp_dir, pool) = create_test_db().await.unwrap();

    let mut bad = card("10E", "2", "Bar");
    bad["identifiers"] = json!({"multiverseId": "not-a-number"});
    let doc = document(vec![("10E", set("10E", vec![card("10E", "1", "Foo"), bad]))]);

    match import_document(&pool, doc).await {
        Err(ImportError::Mapping { entity, .. }) => assert_eq!(entity, "card 10E#2"),
        other => panic!("expected mapping error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_rarity_is_validation_error() {
    let (_temp_dir, pool) = create_test_db().await.unwrap();

    let mut bad = card("10E", "1", "Foo");
    bad["rarity"] = json!(null);

    let result = import_document(&pool, document(vec![("10E", set("10E", vec![bad]))])).await;
    assert!(matches!(result, Err(ImportError::Validation { .. })));
}

#[tokio::test]
async fn test_blank_set_type_is_validation_error() {
    let (_temp_dir, pool) = create_test_db().await.unwrap();

    let mut bad = set("10E", vec![]);
    bad["type"] = json!("  ");

    let result = import_document(&pool, document(vec![("10E", bad)])).await;
    assert!(matches!(result, Err(ImportError::Validation { .. })));
    assert_eq!(count_rows(&pool, "card_sets").await, 0);
}

#[tokio::test]
async fn test_failed_import_converges_on_rerun() {
    let (_temp_dir, pool) = create_test_db().await.unwrap();

    let mut bad = card("10E", "3", "Baz");
    bad["identifiers"] = json!({"multiverseId": "??"});
    let broken = document(vec![(
        "10E",
        set("10E", vec![card("10E", "1", "Foo"), card("10E", "2", "Bar"), bad]),
    )]);
    assert!(import_document(&pool, broken).await.is_err());

    let fixed = document(vec![(
        "10E",
        set(
            "10E",
            vec![card("10E", "1", "Foo"), card("10E", "2", "Bar"), card("10E", "3", "Baz")],
        ),
    )]);
    let report = import_document(&pool, fixed.clone()).await.unwrap();
    assert_eq!(report.card_count, 3);
    assert_eq!(report.set_count, 1);

    let again = import_document(&pool, fixed).await.unwrap();
    assert_eq!(again.stats.total_mutations(), 0);
}

#[tokio::test]
async fn test_cancelled_import_reports_cancelled() {
    let (_temp_dir, pool) = create_test_db().await.unwrap();
    let doc = document(vec![("10E", set("10E", vec![card("10E", "1", "Foo")]))]);

    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = ImportCoordinator::new(pool.clone(), test_settings())
        .run(Cursor::new(doc), cancel)
        .await;

    assert!(matches!(result, Err(ImportError::Cancelled)));
    assert_eq!(count_rows(&pool, "cards").await, 0);
}

#[tokio::test]
async fn test_non_set_keys_in_data_are_ignored() {
    let (_temp_dir, pool) = create_test_db().await.unwrap();

    let doc = json!({
        "data": {
            "x": {"cards": [{"name": "Hidden"}]},
            "10E": {"code": "10E", "type": "core", "cards": [card("10E", "1", "Foo")]}
        },
        "trailer": [1, 2, 3]
    });

    let report = import_document(&pool, serde_json::to_vec(&doc).unwrap()).await.unwrap();
    assert_eq!(report.card_count, 1);
    assert_eq!(report.set_count, 1);
}

#[tokio::test]
async fn test_no_card_dispatched_after_task_failure() {
    let (_temp_dir, pool) = create_test_db().await.unwrap();

    // Translation writes fail, so the first card with foreign data fails its task
    sqlx::query("DROP TABLE face_translations")
        .execute(&pool)
        .await
        .unwrap();

    let mut first = card("10E", "1", "Foo");
    first["foreignData"] = json!([{"language": "German", "name": "Fu"}]);
    let mut cards = vec![first];
    for number in 2..=9 {
        cards.push(card("10E", &number.to_string(), &format!("Card {}", number)));
    }
    let doc = document(vec![("10E", set("10E", cards))]);

    let settings = ImportSettings {
        workers: 1,
        ..test_settings()
    };
    let result = ImportCoordinator::new(pool.clone(), settings)
        .run(Cursor::new(doc), CancellationToken::new())
        .await;

    assert!(matches!(result, Err(ImportError::Database(_))), "{:?}", result);
    // Card #1 committed its card scope; nothing after it was reconciled
    let numbers: Vec<String> = sqlx::query_scalar("SELECT number FROM cards")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(numbers, vec!["1"]);
}

#[tokio::test]
async fn test_face_count_mismatch_is_consistency_error() {
    let (_temp_dir, pool) = create_test_db().await.unwrap();

    // Every stored face drags an unexpected sibling along
    sqlx::query(
        r#"
        CREATE TRIGGER extra_face AFTER INSERT ON card_faces
        WHEN NEW.name <> 'Ghost'
        BEGIN
            INSERT INTO card_faces (card_id, position, name) VALUES (NEW.card_id, 99, 'Ghost');
        END
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();

    let doc = document(vec![("10E", set("10E", vec![card("10E", "1", "Foo")]))]);

    match import_document(&pool, doc).await {
        Err(ImportError::Consistency(message)) => assert!(message.contains("10E#1"), "{}", message),
        other => panic!("expected consistency error, got {:?}", other),
    }

    // Card and faces share one transaction, so neither survives
    assert_eq!(count_rows(&pool, "cards").await, 0);
    assert_eq!(count_rows(&pool, "card_faces").await, 0);
}
