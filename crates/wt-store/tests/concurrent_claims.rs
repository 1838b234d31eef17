//! Concurrent claim behavior of the state stores.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use wt_models::{JobId, TaskStatus, TranscodingTask};
use wt_store::{MemoryStore, RedisStore, StateStore, TaskFilter};

async fn seed(store: &dyn StateStore, n: usize) -> HashSet<String> {
    let job = JobId::new();
    let mut ids = HashSet::new();
    for i in 0..n {
        let task = TranscodingTask::new(job.clone(), format!("p{}", i), "in.mov");
        ids.insert(task.id.to_string());
        store.insert_task(&task).await.unwrap();
    }
    ids
}

async fn claim_concurrently(store: Arc<dyn StateStore>, n: usize) -> Vec<String> {
    let mut handles = Vec::new();
    for i in 0..n {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .claim_next_queued(&format!("worker-{}", i), Utc::now())
                .await
                .unwrap()
        }));
    }
    let mut claimed = Vec::new();
    for handle in handles {
        if let Some(task) = handle.await.unwrap() {
            assert_eq!(task.status, TaskStatus::Running);
            claimed.push(task.id.to_string());
        }
    }
    claimed
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_claims_never_return_the_same_task() {
    let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new());
    let seeded = seed(store.as_ref(), 32).await;

    let claimed = claim_concurrently(store.clone(), 32).await;

    let distinct: HashSet<_> = claimed.iter().cloned().collect();
    assert_eq!(claimed.len(), 32);
    assert_eq!(distinct, seeded);
    let left = store
        .find_tasks(&TaskFilter::with_status(TaskStatus::Queued))
        .await
        .unwrap();
    assert!(left.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn surplus_claims_come_back_empty() {
    let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new());
    seed(store.as_ref(), 3).await;

    let claimed = claim_concurrently(store.clone(), 10).await;
    assert_eq!(claimed.len(), 3);
    assert_eq!(store.count_tasks(TaskStatus::Running).await.unwrap(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires Redis"]
async fn redis_concurrent_claims_never_return_the_same_task() {
    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".into());
    let namespace = format!("wt-test-{}", uuid::Uuid::new_v4());
    let store: Arc<dyn StateStore> = Arc::new(RedisStore::new(&url, namespace).unwrap());
    let seeded = seed(store.as_ref(), 16).await;

    let claimed = claim_concurrently(store.clone(), 16).await;

    let distinct: HashSet<_> = claimed.into_iter().collect();
    assert_eq!(distinct, seeded);
    assert_eq!(store.count_tasks(TaskStatus::Queued).await.unwrap(), 0);
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn redis_transition_is_conditional() {
    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".into());
    let store = RedisStore::new(&url, format!("wt-test-{}", uuid::Uuid::new_v4())).unwrap();
    let task = TranscodingTask::new(JobId::new(), "baseline", "in.mov");
    store.insert_task(&task).await.unwrap();

    let prior = store
        .transition_task(&task.id, &[TaskStatus::Queued], TaskStatus::Cancelled, Utc::now())
        .await
        .unwrap();
    assert!(prior.is_some());
    assert!(store.claim_next_queued("w", Utc::now()).await.unwrap().is_none());
}
