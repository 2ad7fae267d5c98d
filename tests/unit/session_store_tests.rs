/*!
 * Tests for the conversation store under async load
 */

use std::sync::Arc;

use mtbridge::session::{Message, Role, SessionStore};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_append_fromManyTasks_shouldKeepEveryMessage() {
    let store = Arc::new(SessionStore::new());
    let id = store.get_or_create(None).id;

    let tasks: Vec<_> = (0..16)
        .map(|task| {
            let store = store.clone();
            let id = id.clone();
            tokio::spawn(async move {
                for i in 0..25 {
                    store.append(&id, Message::user(format!("{}-{}", task, i)));
                }
            })
        })
        .collect();
    for result in futures::future::join_all(tasks).await {
        result.unwrap();
    }

    let session = store.snapshot(&id).unwrap();
    assert_eq!(session.messages.len(), 16 * 25);

    // Per-task order survives interleaving
    for task in 0..16 {
        let prefix = format!("{}-", task);
        let own: Vec<usize> = session
            .messages
            .iter()
            .filter_map(|m| m.content.strip_prefix(&prefix))
            .map(|n| n.parse().unwrap())
            .collect();
        assert_eq!(own, (0..25).collect::<Vec<_>>());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_independentSessions_shouldNotSeeEachOther() {
    let store = Arc::new(SessionStore::new());

    let tasks: Vec<_> = (0..8)
        .map(|n| {
            let store = store.clone();
            tokio::spawn(async move {
                let id = format!("session-{}", n);
                store.set_system_prompt(&id, &format!("prompt {}", n));
                store.append(&id, Message::user("hello"));
                store.append(&id, Message::assistant(format!("reply {}", n)));
            })
        })
        .collect();
    for result in futures::future::join_all(tasks).await {
        result.unwrap();
    }

    assert_eq!(store.len(), 8);
    for n in 0..8 {
        let session = store.snapshot(&format!("session-{}", n)).unwrap();
        let expected = format!("prompt {}", n);
        assert_eq!(session.system_prompt(), Some(expected.as_str()));
        assert_eq!(session.messages.len(), 3);
        assert_eq!(session.messages[2].role, Role::Assistant);
        assert_eq!(session.messages[2].content, format!("reply {}", n));
    }
}

#[test]
fn test_clear_unknownSession_shouldReturnFalse() {
    let store = SessionStore::new();
    assert!(!store.clear("never-created"));
}
