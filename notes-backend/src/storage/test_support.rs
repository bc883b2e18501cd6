//! Behaviour every `NoteRepository` must share, run by each backend's tests
//! against a fresh, empty store.

use notes_types::{NewNote, UpdateNoteRequest};
use std::collections::HashSet;

use super::NoteRepository;
use crate::error::NoteError;

fn new_note(title: &str, content: &str) -> NewNote {
    NewNote {
        title: title.to_string(),
        content: content.to_string(),
    }
}

pub async fn run_all(repo: &dyn NoteRepository) {
    create_then_get(repo).await;
    ids_are_unique(repo).await;
    update_title_only(repo).await;
    update_with_no_fields(repo).await;
    delete_removes_note(repo).await;
    missing_ids(repo).await;
    search_semantics(repo).await;
}

async fn create_then_get(repo: &dyn NoteRepository) {
    let created = repo.create(new_note("A", "B")).await.unwrap();
    assert_eq!(created.title, "A");
    assert_eq!(created.content, "B");
    assert_eq!(created.created_at, created.updated_at);

    let fetched = repo.get(created.id).await.unwrap();
    assert_eq!(fetched, created);
    assert!(repo.list().await.unwrap().contains(&created));
}

async fn ids_are_unique(repo: &dyn NoteRepository) {
    let before = repo.count().await.unwrap();
    let mut ids: HashSet<i64> = repo.list().await.unwrap().iter().map(|n| n.id).collect();

    for i in 0..5 {
        let note = repo.create(new_note(&format!("note {}", i), "body")).await.unwrap();
        assert!(ids.insert(note.id), "id {} issued twice", note.id);
    }
    assert_eq!(repo.count().await.unwrap(), before + 5);
}

async fn update_title_only(repo: &dyn NoteRepository) {
    let created = repo.create(new_note("Draft", "keep me")).await.unwrap();

    let patch = UpdateNoteRequest {
        title: Some("Final".to_string()),
        content: None,
    };
    let updated = repo.update(created.id, patch).await.unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.title, "Final");
    assert_eq!(updated.content, "keep me");
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at >= created.updated_at);
    assert_eq!(repo.get(created.id).await.unwrap(), updated);
}

async fn update_with_no_fields(repo: &dyn NoteRepository) {
    let created = repo.create(new_note("Same", "Same body")).await.unwrap();
    let updated = repo.update(created.id, UpdateNoteRequest::default()).await.unwrap();

    assert_eq!(updated.title, created.title);
    assert_eq!(updated.content, created.content);
    assert!(updated.updated_at >= created.updated_at);
}

async fn delete_removes_note(repo: &dyn NoteRepository) {
    let created = repo.create(new_note("Temporary", "gone soon")).await.unwrap();
    let before = repo.count().await.unwrap();

    repo.delete(created.id).await.unwrap();

    assert_eq!(repo.count().await.unwrap(), before - 1);
    assert!(matches!(repo.get(created.id).await, Err(NoteError::NotFound(id)) if id == created.id));
    assert!(matches!(repo.delete(created.id).await, Err(NoteError::NotFound(_))));
}

async fn missing_ids(repo: &dyn NoteRepository) {
    let missing = 9_999_999;
    assert!(matches!(repo.get(missing).await, Err(NoteError::NotFound(_))));
    assert!(matches!(
        repo.update(missing, UpdateNoteRequest::default()).await,
        Err(NoteError::NotFound(_))
    ));
    assert!(matches!(repo.delete(missing).await, Err(NoteError::NotFound(_))));
}

async fn search_semantics(repo: &dyn NoteRepository) {
    let groceries = repo.create(new_note("Groceries", "eggs and milk")).await.unwrap();
    let recipe = repo.create(new_note("Pancakes", "needs MILK")).await.unwrap();

    let by_title = repo.search("grocer").await.unwrap();
    assert_eq!(by_title, vec![groceries.clone()]);

    let by_content: HashSet<i64> = repo.search("Milk").await.unwrap().iter().map(|n| n.id).collect();
    assert_eq!(by_content, HashSet::from([groceries.id, recipe.id]));

    assert!(repo.search("").await.unwrap().is_empty());
    assert!(repo.search("   ").await.unwrap().is_empty());
    assert!(repo.search("zzz-no-such-token").await.unwrap().is_empty());
}
