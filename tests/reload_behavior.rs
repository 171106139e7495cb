//! Watcher-driven reload behavior: last-good-wins, teardown, concurrency.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use liveconf::prelude::*;
use tempfile::TempDir;

const YAML_V1: &str = "hello: world
foo: bar
bob: true
age: 77
jersey: \"77\"
";

const YAML_V2: &str = "hello: universe
foo: bar
bob: false
age: 32
jersey: \"77\"
";

const JSON_V2: &str = r#"{
  "hello": "universe",
  "foo": "bar",
  "bob": "false",
  "age": 32,
  "jersey": "77"
}"#;

// Missing colon on the last entry; not JSON either.
const INVALID: &str = "hello: world
foo: bar
bob: true
age: 77
jersey \"77\"
";

fn temp_config(contents: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    fs::write(&path, contents).unwrap();
    (dir, path)
}

/// Poll `cond` until it holds or a generous deadline passes. Watcher events
/// arrive asynchronously, so observations are bounded rather than immediate.
async fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    false
}

#[tokio::test]
async fn rewrite_is_observed() {
    let (_dir, path) = temp_config(YAML_V1);
    let store = ConfigStore::new(&path).await.unwrap();
    assert_eq!(store.get_int("age", 12), 77);

    fs::write(&path, YAML_V2).unwrap();

    assert!(wait_for(|| store.get_int("age", 12) == 32).await);
    assert_eq!(store.get_bool("bob", true), false);
    assert_eq!(store.get_string("hello", "x"), "universe");
}

#[tokio::test]
async fn rewrite_in_the_other_format_is_observed() {
    let (_dir, path) = temp_config(YAML_V1);
    let store = ConfigStore::new(&path).await.unwrap();
    assert_eq!(store.get_int("age", 12), 77);

    fs::write(&path, JSON_V2).unwrap();

    assert!(wait_for(|| store.get_int("age", 12) == 32).await);
    assert_eq!(store.get_bool("bob", true), false);
}

#[tokio::test]
async fn malformed_rewrite_keeps_last_good_values() {
    let (_dir, path) = temp_config(YAML_V1);
    let store = ConfigStore::new(&path).await.unwrap();

    fs::write(&path, INVALID).unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert_eq!(store.get_int("age", 12), 77);
    assert_eq!(store.get_bool("bob", false), true);
    assert_eq!(store.get_string("hello", "def"), "world");

    // The reload loop survived the bad write and still applies good ones.
    fs::write(&path, YAML_V2).unwrap();
    assert!(wait_for(|| store.get_int("age", 12) == 32).await);
}

#[tokio::test]
async fn deleted_file_keeps_last_good_values() {
    let (_dir, path) = temp_config(YAML_V1);
    let store = ConfigStore::new(&path).await.unwrap();

    fs::remove_file(&path).unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert_eq!(store.get_int("age", 12), 77);
    assert_eq!(store.get_string("foo", "def"), "bar");
    assert_eq!(store.len(), 5);
}

#[tokio::test]
async fn manual_reload_surfaces_decode_errors() {
    let (_dir, path) = temp_config(YAML_V1);
    let store = ConfigStore::new(&path).await.unwrap();

    fs::write(&path, INVALID).unwrap();
    assert!(matches!(store.reload().await, Err(ConfigError::Decode(_))));
    assert_eq!(store.get_int("age", 12), 77);
}

#[tokio::test]
async fn subscribers_run_after_each_successful_swap() {
    let (_dir, path) = temp_config(YAML_V1);
    let store = ConfigStore::new(&path).await.unwrap();
    // Manual reloads only: keep the watcher from racing the counters below.
    store.close();

    let fired = Arc::new(AtomicUsize::new(0));
    let fired_clone = Arc::clone(&fired);
    let handle = store.subscribe(move || {
        fired_clone.fetch_add(1, Ordering::SeqCst);
    });

    store.reload().await.unwrap();
    store.reload().await.unwrap();
    assert_eq!(fired.load(Ordering::SeqCst), 2);

    // A failed reload must not notify.
    fs::write(&path, INVALID).unwrap();
    assert!(store.reload().await.is_err());
    assert_eq!(fired.load(Ordering::SeqCst), 2);

    fs::write(&path, YAML_V1).unwrap();
    drop(handle);
    store.reload().await.unwrap();
    assert_eq!(fired.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn subscriber_runs_on_watched_rewrite() {
    let (_dir, path) = temp_config(YAML_V1);
    let store = ConfigStore::new(&path).await.unwrap();

    let fired = Arc::new(AtomicUsize::new(0));
    let fired_clone = Arc::clone(&fired);
    let _handle = store.subscribe(move || {
        fired_clone.fetch_add(1, Ordering::SeqCst);
    });

    fs::write(&path, YAML_V2).unwrap();

    assert!(wait_for(|| fired.load(Ordering::SeqCst) >= 1).await);
    assert_eq!(store.get_int("age", 12), 32);
}

#[tokio::test]
async fn close_stops_observing_writes() {
    let (_dir, path) = temp_config(YAML_V1);
    let store = ConfigStore::new(&path).await.unwrap();
    store.close();

    fs::write(&path, YAML_V2).unwrap();
    tokio::time::sleep(Duration::from_millis(600)).await;

    // Frozen on the last published snapshot, still fully readable.
    assert_eq!(store.get_int("age", 12), 77);
    assert_eq!(store.get_string("hello", "def"), "world");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn readers_never_observe_torn_snapshots() {
    let (_dir, path) = temp_config(YAML_V1);
    let store = ConfigStore::new(&path).await.unwrap();
    let runtime = tokio::runtime::Handle::current();

    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..2000 {
                    let snapshot = store.snapshot();
                    match snapshot.get("hello") {
                        Some("world") => assert_eq!(snapshot.get("age"), Some("77")),
                        Some("universe") => assert_eq!(snapshot.get("age"), Some("32")),
                        other => panic!("torn or unexpected snapshot: {other:?}"),
                    }

                    let age = store.get_int("age", 0);
                    assert!(age == 77 || age == 32, "unexpected age {age}");
                }
            });
        }

        scope.spawn(|| {
            for round in 0..50 {
                let contents = if round % 2 == 0 { YAML_V2 } else { YAML_V1 };
                fs::write(&path, contents).unwrap();
                runtime.block_on(store.reload()).unwrap();
            }
        });
    });
}
