use super::*;
use parley_server::models::internal::Role;
use parley_server::storage::{ConversationStore, RepositoryError};

// ============================================
// ConversationStore Tests
// ============================================

#[tokio::test]
async fn test_store_create_then_get() {
    let repo = create_test_repo().await;

    let created = repo.create("u1", "Hello").await.unwrap();
    let fetched = repo.get(&created.id, "u1").await.unwrap().unwrap();

    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.user_id, "u1");
    assert_eq!(fetched.history, vec![Turn::user("Hello")]);
}

#[tokio::test]
async fn test_store_ids_are_unique() {
    let repo = create_test_repo().await;

    let a = repo.create("u1", "one").await.unwrap();
    let b = repo.create("u1", "two").await.unwrap();

    assert_ne!(a.id, b.id);
}

#[tokio::test]
async fn test_store_get_is_owner_scoped() {
    let repo = create_test_repo().await;
    let conv = repo.create("u1", "Hello").await.unwrap();

    assert!(repo.get(&conv.id, "u2").await.unwrap().is_none());
    assert!(repo.get("missing", "u1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_store_appends_preserve_call_order() {
    let repo = create_test_repo().await;
    let conv = repo.create("u1", "Hello").await.unwrap();

    let ack = repo
        .append_turns(&conv.id, "u1", vec![Turn::model("Hi")])
        .await
        .unwrap();
    assert_eq!(ack.matched_count, 1);

    repo.append_turns(&conv.id, "u1", vec![Turn::user("Why?"), Turn::model("Because.")])
        .await
        .unwrap();
    repo.append_turns(&conv.id, "u1", vec![Turn::user("Ok"), Turn::model("Bye")])
        .await
        .unwrap();

    let history = repo.get(&conv.id, "u1").await.unwrap().unwrap().history;
    let texts: Vec<_> = history.iter().map(|t| (t.role, t.first_text().to_string())).collect();
    assert_eq!(
        texts,
        vec![
            (Role::User, "Hello".to_string()),
            (Role::Model, "Hi".to_string()),
            (Role::User, "Why?".to_string()),
            (Role::Model, "Because.".to_string()),
            (Role::User, "Ok".to_string()),
            (Role::Model, "Bye".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_store_append_unknown_pair_changes_nothing() {
    let repo = create_test_repo().await;
    let conv = repo.create("u1", "Hello").await.unwrap();

    let err = repo
        .append_turns(&conv.id, "u2", vec![Turn::model("intruder")])
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound(_)));

    let err = repo
        .append_turns("missing", "u1", vec![Turn::model("nobody")])
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let stored = repo.get(&conv.id, "u1").await.unwrap().unwrap();
    assert_eq!(stored.history, vec![Turn::user("Hello")]);
}

#[tokio::test]
async fn test_store_keeps_image_on_user_turn() {
    let repo = create_test_repo().await;
    let conv = repo.create("u1", "Hello").await.unwrap();

    let question = Turn::user_with_image("What is this?", Some("/uploads/cat.png".to_string()));
    repo.append_turns(&conv.id, "u1", vec![question.clone(), Turn::model("A cat")])
        .await
        .unwrap();

    let history = repo.get(&conv.id, "u1").await.unwrap().unwrap().history;
    assert_eq!(history[1], question);
    assert_eq!(history[2].img, None);
}

#[tokio::test]
async fn test_store_preserves_unicode_text() {
    let repo = create_test_repo().await;
    let text = "héllo 👋 — «quoted» \"text\"\nsecond line";

    let conv = repo.create("u1", text).await.unwrap();
    let fetched = repo.get(&conv.id, "u1").await.unwrap().unwrap();

    assert_eq!(fetched.history[0].first_text(), text);
}
