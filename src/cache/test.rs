use std::sync::Arc;
use std::thread::sleep;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use super::Cache;

#[test]
fn set_and_get() {
    let cache = Cache::new();
    cache.set("a", 1);
    assert_eq!(Some(1), cache.get(&"a"));
    assert_eq!(None,    cache.get(&"b"));

    cache.set("a", 2);
    assert_eq!(Some(2), cache.get(&"a"));
}

#[test]
fn ttl_expires() {
    let cache = Cache::new();
    cache.set_ttl("k", "v", Duration::from_millis(100));
    assert_eq!(Some("v"), cache.get(&"k"));

    sleep(Duration::from_millis(150));

    assert_eq!(None, cache.get(&"k"));
    assert_eq!(0,    cache.len());
}

#[test]
fn remove_entry() {
    let cache = Cache::new();
    cache.set(1, "one");
    cache.remove(&1);
    assert_eq!(None, cache.get(&1));
    cache.remove(&1);
}

#[test]
fn pop_only_live_values() {
    let cache = Cache::new();
    cache.set("live", 1);
    cache.set_ttl("dead", 2, Duration::from_millis(10));

    sleep(Duration::from_millis(20));

    assert_eq!(Some(1), cache.pop(&"live"));
    assert_eq!(None,    cache.pop(&"live"));
    assert_eq!(None,    cache.pop(&"dead"));
    assert!(cache.is_empty());
}

#[test]
fn purge_drops_unread_entries() {
    let cache = Cache::new();
    cache.set("forever", 0);
    cache.set_ttl("a", 1, Duration::from_millis(10));
    cache.set_ttl("b", 2, Duration::from_millis(10));
    cache.set_ttl("c", 3, Duration::from_secs(60));

    sleep(Duration::from_millis(20));

    assert_eq!(2, cache.purge());
    assert_eq!(2, cache.len());
    assert_eq!(Some(0), cache.get(&"forever"));
}

#[tokio::test]
async fn sweep_runs_until_cancelled() {
    let cache  = Arc::new(Cache::with_sweep(Duration::from_millis(20)));
    let cancel = CancellationToken::new();

    cache.set_ttl("k", 1, Duration::from_millis(10));
    let task = tokio::spawn(cache.clone().sweep(cancel.clone()));

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(0, cache.len());

    cancel.cancel();
    assert!(task.await.is_ok());
}
