use super::*;
use parley_server::models::internal::{ChatSummary, Role};
use parley_server::storage::{ConversationStore, UserIndex};
use std::collections::HashSet;

// ============================================
// Concurrent writer tests (file-backed pool)
// ============================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_entries_make_one_index() {
    let dir = tempfile::tempdir().unwrap();
    let repo = create_file_repo(&dir).await;

    let mut summaries = Vec::new();
    for i in 0..8 {
        let conv = repo.create("u1", &format!("chat {}", i)).await.unwrap();
        summaries.push(ChatSummary::for_conversation(&conv, 40));
    }

    let handles: Vec<_> = summaries
        .iter()
        .cloned()
        .map(|summary| {
            let repo = repo.clone();
            tokio::spawn(async move { repo.ensure_entry("u1", summary).await })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let entries = repo.list_entries("u1").await.unwrap();
    assert_eq!(entries.len(), 1, "one index entry per user");

    let listed: HashSet<_> = entries[0].chats.iter().map(|c| c.id.clone()).collect();
    let expected: HashSet<_> = summaries.into_iter().map(|s| s.id).collect();
    assert_eq!(listed, expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_chat_creation_for_one_user() {
    let dir = tempfile::tempdir().unwrap();
    let service = create_service(create_file_repo(&dir).await);

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let service = service.clone();
            tokio::spawn(async move { service.create_chat("u1", &format!("question {}", i)).await })
        })
        .collect();

    let mut ids = HashSet::new();
    for handle in handles {
        ids.insert(handle.await.unwrap().unwrap().id);
    }

    let entries = service.list_user_chats("u1").await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].chats.len(), 10);
    assert_eq!(
        entries[0].chats.iter().map(|c| c.id.clone()).collect::<HashSet<_>>(),
        ids
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_appends_keep_batches_whole() {
    let dir = tempfile::tempdir().unwrap();
    let repo = create_file_repo(&dir).await;
    let conv = repo.create("u1", "Hello").await.unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let repo = repo.clone();
            let id = conv.id.clone();
            tokio::spawn(async move {
                let batch = vec![Turn::user(format!("q{}", i)), Turn::model(format!("a{}", i))];
                repo.append_turns(&id, "u1", batch).await
            })
        })
        .collect();

    for handle in handles {
        let ack = handle.await.unwrap().unwrap();
        assert_eq!(ack.modified_count, 1);
    }

    let history = repo.get(&conv.id, "u1").await.unwrap().unwrap().history;
    assert_eq!(history.len(), 1 + 16, "no append lost");

    // Each question is immediately followed by its own answer
    let mut seen = HashSet::new();
    for pair in history[1..].chunks(2) {
        assert_eq!(pair[0].role, Role::User);
        assert_eq!(pair[1].role, Role::Model);
        let n = pair[0].first_text().trim_start_matches('q');
        assert_eq!(pair[1].first_text(), format!("a{}", n));
        assert!(seen.insert(n.to_string()));
    }
    assert_eq!(seen.len(), 8);
}
