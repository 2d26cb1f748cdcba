//! Face matching, orphan deletion and multi-face collation

mod helpers;

use cardvault_ingest::ImportError;
use helpers::{card, count_rows, create_test_db, document, import_document, set};
use serde_json::{json, Value};

fn fragments(set_code: &str, number: &str, faces: &[&str]) -> Vec<Value> {
    let name = faces.join(" // ");
    faces
        .iter()
        .map(|face| {
            let mut fragment = card(set_code, number, &name);
            fragment["faceName"] = json!(face);
            fragment["layout"] = json!("split");
            fragment["foreignData"] = json!([{"language": "German", "name": format!("{} (de)", face)}]);
            fragment
        })
        .collect()
}

#[tokio::test]
async fn test_changed_text_updates_same_face() {
    let (_temp_dir, pool) = create_test_db().await.unwrap();

    let mut old = card("10E", "1", "A");
    old["text"] = json!("old");
    import_document(&pool, document(vec![("10E", set("10E", vec![old]))]))
        .await
        .unwrap();
    let face_id: i64 = sqlx::query_scalar("SELECT id FROM card_faces")
        .fetch_one(&pool)
        .await
        .unwrap();

    let mut new = card("10E", "1", "A");
    new["text"] = json!("new");
    let report = import_document(&pool, document(vec![("10E", set("10E", vec![new]))]))
        .await
        .unwrap();

    assert_eq!(report.stats.faces_updated, 1);
    assert_eq!(report.stats.faces_created, 0);
    assert_eq!(report.stats.faces_deleted, 0);

    let (id, text): (i64, String) = sqlx::query_as("SELECT id, text FROM card_faces")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(id, face_id);
    assert_eq!(text, "new");
}

#[tokio::test]
async fn test_three_fragments_make_one_card() {
    let (_temp_dir, pool) = create_test_db().await.unwrap();

    let doc = document(vec![("ISD", set("ISD", fragments("ISD", "7", &["A", "B", "C"])))]);
    let report = import_document(&pool, doc).await.unwrap();

    assert_eq!(report.card_count, 1);
    assert_eq!(report.stats.faces_created, 3);

    let faces: Vec<(i64, String)> =
        sqlx::query_as("SELECT position, name FROM card_faces ORDER BY position")
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(
        faces,
        vec![(0, "A".to_string()), (1, "B".to_string()), (2, "C".to_string())]
    );
    assert_eq!(count_rows(&pool, "face_translations").await, 3);
    assert_eq!(count_rows(&pool, "face_card_types").await, 3);
}

#[tokio::test]
async fn test_missing_fragment_is_collation_error() {
    let (_temp_dir, pool) = create_test_db().await.unwrap();

    let mut cards = fragments("ISD", "7", &["A", "B", "C"]);
    cards.pop();
    cards.push(card("ISD", "8", "Complete Card"));
    let doc = document(vec![("ISD", set("ISD", cards))]);

    match import_document(&pool, doc).await {
        Err(ImportError::Collation(keys)) => assert_eq!(keys, vec!["ISD#7".to_string()]),
        other => panic!("expected collation error, got {:?}", other),
    }

    // Never a two-faced card
    let partial: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cards WHERE number = '7'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(partial, 0);
    assert_eq!(count_rows(&pool, "cards").await, 1);
}

#[tokio::test]
async fn test_meld_card_is_single_faced() {
    let (_temp_dir, pool) = create_test_db().await.unwrap();

    let mut meld = card("EMN", "15a", "Bruna, the Fading Light // Brisela, Voice of Nightmares");
    meld["faceName"] = json!("Bruna, the Fading Light");
    meld["layout"] = json!("meld");

    let report = import_document(&pool, document(vec![("EMN", set("EMN", vec![meld]))]))
        .await
        .unwrap();

    assert_eq!(report.card_count, 1);
    assert_eq!(count_rows(&pool, "card_faces").await, 1);
}

#[tokio::test]
async fn test_removed_face_is_deleted_with_children() {
    let (_temp_dir, pool) = create_test_db().await.unwrap();

    let doc = document(vec![("ISD", set("ISD", fragments("ISD", "7", &["A", "B"])))]);
    import_document(&pool, doc).await.unwrap();
    assert_eq!(count_rows(&pool, "face_translations").await, 2);

    // Same card now arrives single-faced
    let mut single = card("ISD", "7", "A");
    single["layout"] = json!("split");
    single["foreignData"] = json!([{"language": "German", "name": "A (de)"}]);
    let report = import_document(&pool, document(vec![("ISD", set("ISD", vec![single]))]))
        .await
        .unwrap();

    assert_eq!(report.stats.faces_deleted, 1);
    assert_eq!(report.stats.cards_updated, 1);

    let names: Vec<String> = sqlx::query_scalar("SELECT name FROM card_faces")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(names, vec!["A"]);
    assert_eq!(count_rows(&pool, "face_translations").await, 1);
    assert_eq!(count_rows(&pool, "face_card_types").await, 1);
    assert_eq!(count_rows(&pool, "face_sub_types").await, 1);
}

#[tokio::test]
async fn test_exact_match_preferred_when_faces_swap() {
    let (_temp_dir, pool) = create_test_db().await.unwrap();

    let doc = document(vec![("ISD", set("ISD", fragments("ISD", "7", &["A", "B"])))]);
    import_document(&pool, doc).await.unwrap();
    let ids: Vec<(String, i64)> = sqlx::query_as("SELECT name, id FROM card_faces ORDER BY name")
        .fetch_all(&pool)
        .await
        .unwrap();

    // Same card name, faces delivered in the opposite order
    let mut swapped = fragments("ISD", "7", &["A", "B"]);
    swapped.reverse();
    let report = import_document(&pool, document(vec![("ISD", set("ISD", swapped))]))
        .await
        .unwrap();

    assert_eq!(report.stats.faces_created, 0);
    assert_eq!(report.stats.faces_deleted, 0);
    assert_eq!(report.stats.faces_updated, 2);

    let after: Vec<(String, i64)> = sqlx::query_as("SELECT name, id FROM card_faces ORDER BY name")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(after, ids);
}
