//! PostgreSQL note repository tests.
//!
//! Run with a database available:
//! `DATABASE_URL=postgres://... cargo test -p notex-db -- --ignored`

use notex_db::test_fixtures::TestDatabase;
use notex_db::{CreateNoteRequest, Error, NoteRepository, UpdateNoteRequest};

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_insert_applies_defaults_and_timestamps() {
    let test_db = TestDatabase::new().await;

    let new_note = CreateNoteRequest::new("A").validate().unwrap();
    let note = test_db.notes.insert(new_note).await.unwrap();

    assert!(note.id > 0);
    assert_eq!(note.name, "A");
    assert_eq!(note.description, "");
    assert_eq!(note.bg_color, "#ffffff");
    assert!(note.created_at.is_some());
    assert!(note.updated_at.is_some());

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_update_merges_partial_changes() {
    let test_db = TestDatabase::new().await;

    let note = test_db
        .notes
        .insert(
            CreateNoteRequest::new("X")
                .description("keep me")
                .validate()
                .unwrap(),
        )
        .await
        .unwrap();

    let changes = UpdateNoteRequest {
        bg_color: Some("#000000".to_string()),
        ..Default::default()
    }
    .validate()
    .unwrap();
    let updated = test_db.notes.update(note.id, changes).await.unwrap();

    assert_eq!(updated.name, "X");
    assert_eq!(updated.description, "keep me");
    assert_eq!(updated.bg_color, "#000000");
    assert_eq!(updated.created_at, note.created_at);
    assert!(updated.updated_at >= note.updated_at);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_list_orders_by_updated_at_desc() {
    let test_db = TestDatabase::new().await;

    let first = test_db
        .notes
        .insert(CreateNoteRequest::new("first").validate().unwrap())
        .await
        .unwrap();
    test_db
        .notes
        .insert(CreateNoteRequest::new("second").validate().unwrap())
        .await
        .unwrap();
    test_db
        .notes
        .update(first.id, Default::default())
        .await
        .unwrap();

    let names: Vec<String> = test_db
        .notes
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|n| n.name)
        .collect();
    assert_eq!(names, vec!["first", "second"]);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_missing_note_is_not_found() {
    let test_db = TestDatabase::new().await;

    assert!(matches!(
        test_db.notes.fetch(999_999).await,
        Err(Error::NoteNotFound(999_999))
    ));
    assert!(test_db
        .notes
        .update(999_999, Default::default())
        .await
        .unwrap_err()
        .is_not_found());
    assert!(test_db.notes.delete(999_999).await.unwrap_err().is_not_found());

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_delete_then_fetch_is_not_found() {
    let test_db = TestDatabase::new().await;

    let note = test_db
        .notes
        .insert(CreateNoteRequest::new("temp").validate().unwrap())
        .await
        .unwrap();
    test_db.notes.delete(note.id).await.unwrap();

    assert!(test_db.notes.fetch(note.id).await.unwrap_err().is_not_found());

    test_db.cleanup().await;
}
