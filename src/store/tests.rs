//! Tests for the KV store module.
//!
//! Each scenario runs against both backends through the `KvStore` handle.

use super::*;
use tempfile::TempDir;

/// Runs `check` against a fresh memory store and a fresh redb store.
async fn with_each_backend<F, Fut>(check: F)
where
    F: Fn(KvStore) -> Fut,
    Fut: std::future::Future<Output = ()>,
{
    check(KvStore::memory()).await;

    let tmp = TempDir::new().unwrap();
    let store = KvStore::file(tmp.path().join("test.redb")).unwrap();
    check(store).await;
}

#[tokio::test]
async fn test_set_and_get() {
    with_each_backend(|store| async move {
        store.set("key1", b"value1").await.unwrap();
        let value = store.get("key1").await.unwrap().unwrap();
        assert_eq!(value, b"value1");
    })
    .await;
}

#[tokio::test]
async fn test_get_nonexistent_key() {
    with_each_backend(|store| async move {
        assert!(store.get("nonexistent").await.unwrap().is_none());
    })
    .await;
}

#[tokio::test]
async fn test_delete_reports_absence() {
    with_each_backend(|store| async move {
        store.set("key1", b"value1").await.unwrap();
        assert!(store.delete("key1").await.unwrap());
        assert!(!store.delete("key1").await.unwrap());
        assert!(store.get("key1").await.unwrap().is_none());
    })
    .await;
}

#[tokio::test]
async fn test_empty_value() {
    with_each_backend(|store| async move {
        store.set("empty", b"").await.unwrap();
        let value = store.get("empty").await.unwrap().unwrap();
        assert_eq!(value, b"");
    })
    .await;
}

#[tokio::test]
async fn test_binary_data() {
    with_each_backend(|store| async move {
        let binary_data = vec![0u8, 1, 2, 3, 255, 128, 64];
        store.set("binary", &binary_data).await.unwrap();
        assert_eq!(store.get("binary").await.unwrap().unwrap(), binary_data);
    })
    .await;
}

#[tokio::test]
async fn test_group_insert_then_group_delete() {
    with_each_backend(|store| async move {
        let commit = store
            .atomic(vec![
                StoreOp::set_if_absent("order:7", b"{}".to_vec()),
                StoreOp::add_to_set("orders", "order:7"),
            ])
            .await
            .unwrap();
        assert!(commit.is_applied());
        assert!(store.is_member("orders", "order:7").await.unwrap());

        let commit = store
            .atomic(vec![
                StoreOp::delete("order:7"),
                StoreOp::remove_from_set("orders", "order:7"),
            ])
            .await
            .unwrap();
        assert!(commit.is_applied());
        assert!(store.get("order:7").await.unwrap().is_none());
        assert!(!store.is_member("orders", "order:7").await.unwrap());
    })
    .await;
}

#[tokio::test]
async fn test_group_delete_of_missing_key_is_discarded() {
    with_each_backend(|store| async move {
        store.add_to_set("orders", "order:9").await.unwrap();

        let commit = store
            .atomic(vec![
                StoreOp::delete("order:9"),
                StoreOp::remove_from_set("orders", "order:9"),
            ])
            .await
            .unwrap();

        assert_eq!(
            commit,
            Commit::Discarded {
                step: 0,
                rejection: Rejection::KeyMissing("order:9".to_string()),
            }
        );
        // The second step never ran.
        assert!(store.is_member("orders", "order:9").await.unwrap());
    })
    .await;
}

#[tokio::test]
async fn test_scan_pages_cover_every_member_once() {
    with_each_backend(|store| async move {
        for i in 0..7 {
            store.add_to_set("orders", &format!("order:{i}")).await.unwrap();
        }

        let mut seen = Vec::new();
        let mut cursor = 0;
        loop {
            let page = store.scan_set("orders", cursor, "*", 3).await.unwrap();
            assert!(page.members.len() <= 3);
            seen.extend(page.members);
            cursor = page.cursor;
            if cursor == 0 {
                break;
            }
        }

        seen.sort();
        let mut expected: Vec<String> = (0..7).map(|i| format!("order:{i}")).collect();
        expected.sort();
        assert_eq!(seen, expected);
    })
    .await;
}

#[tokio::test]
async fn test_scan_rejects_bad_pattern() {
    with_each_backend(|store| async move {
        let err = store.scan_set("orders", 0, "[", 10).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidPattern { .. }));
    })
    .await;
}

#[tokio::test]
async fn test_ping_then_close() {
    with_each_backend(|store| async move {
        store.ping().await.unwrap();
        let clone = store.clone();
        store.close().await.unwrap();
        assert!(matches!(clone.ping().await, Err(StoreError::Closed)));
    })
    .await;
}

#[tokio::test]
async fn test_custom_backend_is_shared() {
    let backend = MemoryBackend::new();
    let store = KvStore::custom(backend.clone());

    store.set("k", b"v").await.unwrap();
    assert_eq!(backend.len(), 1);
}
