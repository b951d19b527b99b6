//! Integration tests for the recursive watcher
//!
//! These tests use temporary directories and real filesystem operations
//! to validate the watcher's behavior in realistic scenarios.

use fsync_watcher::{RecursiveWatcher, ShutdownHandle, WatchEvent, WatchEventKind, WatcherConfig};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tempfile::TempDir;

struct RunningWatcher {
    events: mpsc::Receiver<WatchEvent>,
    shutdown: ShutdownHandle,
    thread: JoinHandle<(Vec<PathBuf>, fsync_core::Result<()>)>,
}

impl RunningWatcher {
    fn stop(self) -> (Vec<PathBuf>, fsync_core::Result<()>) {
        self.shutdown.shutdown();
        self.thread.join().unwrap()
    }
}

/// Start a watcher on its own thread, forwarding events to a channel
fn start_watcher(root: &Path) -> RunningWatcher {
    start_watcher_with(root, WatcherConfig::default())
}

fn start_watcher_with(root: &Path, config: WatcherConfig) -> RunningWatcher {
    let mut watcher = RecursiveWatcher::new(config).unwrap();
    let shutdown = watcher.shutdown_handle();
    let (tx, events) = mpsc::channel();
    let root = root.to_path_buf();

    let thread = std::thread::spawn(move || {
        let result = watcher.watch(&root, |event| {
            let _ = tx.send(event);
        });
        (watcher.watched_dirs(), result)
    });

    // Wait a bit for the initial registration
    std::thread::sleep(Duration::from_millis(200));

    RunningWatcher {
        events,
        shutdown,
        thread,
    }
}

/// Wait until an event matching `predicate` arrives
fn wait_for<F>(events: &mpsc::Receiver<WatchEvent>, predicate: F) -> Option<WatchEvent>
where
    F: Fn(&WatchEvent) -> bool,
{
    let deadline = Instant::now() + Duration::from_secs(3);
    while let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
        match events.recv_timeout(remaining) {
            Ok(event) if predicate(&event) => return Some(event),
            Ok(_) => continue,
            Err(_) => return None,
        }
    }
    None
}

#[test]
fn test_initial_walk_registers_existing_directories() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().to_path_buf();
    std::fs::create_dir(root.join("a")).unwrap();
    std::fs::write(root.join("a/f.txt"), "hello").unwrap();

    let running = start_watcher(&root);
    let (watched, result) = running.stop();

    result.unwrap();
    assert_eq!(watched, vec![root.clone(), root.join("a")]);
}

#[test]
fn test_file_creation_detection() {
    let temp_dir = TempDir::new().unwrap();
    let running = start_watcher(temp_dir.path());

    let test_file = temp_dir.path().join("test.txt");
    std::fs::write(&test_file, "content").unwrap();

    let event = wait_for(&running.events, |e| e.path == test_file)
        .expect("Expected an event for the new file");
    assert_eq!(event.kind, WatchEventKind::Created);

    running.stop().1.unwrap();
}

#[test]
fn test_file_modification_detection() {
    let temp_dir = TempDir::new().unwrap();
    let test_file = temp_dir.path().join("test.txt");
    std::fs::write(&test_file, "before").unwrap();

    let running = start_watcher(temp_dir.path());
    std::fs::write(&test_file, "after").unwrap();

    let event = wait_for(&running.events, |e| {
        e.path == test_file && e.kind == WatchEventKind::Modified
    });
    assert!(event.is_some(), "Expected Modified event");

    running.stop().1.unwrap();
}

#[test]
fn test_file_deletion_detection() {
    let temp_dir = TempDir::new().unwrap();
    let test_file = temp_dir.path().join("test.txt");
    std::fs::write(&test_file, "doomed").unwrap();

    let running = start_watcher(temp_dir.path());
    std::fs::remove_file(&test_file).unwrap();

    let event = wait_for(&running.events, |e| {
        e.path == test_file && e.kind == WatchEventKind::Removed
    });
    assert!(event.is_some(), "Expected Removed event");

    running.stop().1.unwrap();
}

#[test]
fn test_new_directories_are_watched_without_restart() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().to_path_buf();
    std::fs::create_dir(root.join("a")).unwrap();
    std::fs::write(root.join("a/f.txt"), "hello").unwrap();

    let running = start_watcher(&root);

    let new_dir = root.join("a/b");
    std::fs::create_dir(&new_dir).unwrap();
    let dir_event = wait_for(&running.events, |e| e.path == new_dir)
        .expect("Expected an event for the new directory");
    assert_eq!(dir_event.kind, WatchEventKind::Created);

    // Give the watcher a moment to register the new directory
    std::thread::sleep(Duration::from_millis(200));

    let nested_file = new_dir.join("g.txt");
    std::fs::write(&nested_file, "nested").unwrap();
    let file_event = wait_for(&running.events, |e| e.path == nested_file)
        .expect("Expected an event from inside the new directory");
    assert_eq!(file_event.kind, WatchEventKind::Created);

    let (watched, result) = running.stop();
    result.unwrap();
    assert!(watched.contains(&new_dir));
}

#[test]
fn test_removed_directory_does_not_stop_the_loop() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().to_path_buf();
    std::fs::create_dir(root.join("gone")).unwrap();

    let running = start_watcher(&root);
    std::fs::remove_dir(root.join("gone")).unwrap();

    let survivor = root.join("after.txt");
    std::fs::write(&survivor, "still here").unwrap();
    assert!(wait_for(&running.events, |e| e.path == survivor).is_some());

    running.stop().1.unwrap();
}

#[test]
fn test_recreated_directory_is_watched_again() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().to_path_buf();
    let dir = root.join("a");
    std::fs::create_dir(&dir).unwrap();

    let running = start_watcher(&root);

    std::fs::remove_dir(&dir).unwrap();
    assert!(
        wait_for(&running.events, |e| e.path == dir && e.kind == WatchEventKind::Removed)
            .is_some(),
        "Expected Removed event for the directory"
    );

    std::fs::create_dir(&dir).unwrap();
    assert!(
        wait_for(&running.events, |e| e.path == dir && e.kind == WatchEventKind::Created)
            .is_some(),
        "Expected Created event for the re-created directory"
    );

    // Give the watcher a moment to register the directory again
    std::thread::sleep(Duration::from_millis(200));

    let nested_file = dir.join("g.txt");
    std::fs::write(&nested_file, "back").unwrap();
    assert!(
        wait_for(&running.events, |e| e.path == nested_file).is_some(),
        "Expected an event from inside the re-created directory"
    );

    let (watched, result) = running.stop();
    result.unwrap();
    assert!(watched.contains(&dir));
}

#[test]
fn test_created_directory_beyond_max_depth_is_not_watched() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().to_path_buf();
    std::fs::create_dir(root.join("a")).unwrap();

    let config = WatcherConfig::builder().max_depth(1).build();
    let running = start_watcher_with(&root, config);

    let deep = root.join("a/b");
    std::fs::create_dir(&deep).unwrap();
    let event = wait_for(&running.events, |e| e.path == deep)
        .expect("Expected an event for the new directory");
    assert_eq!(event.kind, WatchEventKind::Created);

    let (watched, result) = running.stop();
    result.unwrap();
    assert_eq!(watched, vec![root.clone(), root.join("a")]);
}
