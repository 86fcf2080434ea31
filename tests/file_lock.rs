use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use taskweave::errors::TaskweaveError;
use taskweave::fs::mock::MockFileSystem;
use taskweave::fs::FileSystem;
use taskweave::lock::{FileLock, LockHolder, LockOptions};
use taskweave_test_utils::fakes::StaticLiveness;

const LOCK: &str = "/state/.lock";
const GUARD: &str = "/state/.lock.reclaim";

fn quick_options() -> LockOptions {
    LockOptions {
        max_wait: Duration::from_millis(150),
        stale_after: Duration::from_secs(60),
        poll_interval: Duration::from_millis(10),
    }
}

fn lock_with(fs: &MockFileSystem, alive: &[u32]) -> FileLock<MockFileSystem> {
    FileLock::new(fs.clone(), LOCK, Arc::new(StaticLiveness::alive(alive)))
}

fn holder_aged(pid: u32, age: Duration) -> LockHolder {
    LockHolder {
        pid,
        acquired_at_ms: Utc::now().timestamp_millis() - age.as_millis() as i64,
    }
}

fn plant_holder(fs: &MockFileSystem, pid: u32, age: Duration) {
    fs.add_file(LOCK, holder_aged(pid, age).render());
}

fn leftover_tombstones(fs: &MockFileSystem) -> Vec<PathBuf> {
    fs.paths()
        .into_iter()
        .filter(|p| p.to_string_lossy().ends_with(".stale"))
        .collect()
}

/// Swaps in a fresh lock file right before the first rename away from the
/// lock path, like a competing process winning the race.
#[derive(Debug, Clone)]
struct ReplacingFs {
    inner: MockFileSystem,
    replacement: String,
    replaced: Arc<AtomicBool>,
}

impl FileSystem for ReplacingFs {
    fn read_optional(&self, path: &Path) -> anyhow::Result<Option<String>> {
        self.inner.read_optional(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> anyhow::Result<()> {
        self.inner.write(path, contents)
    }

    fn append(&self, path: &Path, contents: &[u8]) -> anyhow::Result<()> {
        self.inner.append(path, contents)
    }

    fn create_new(&self, path: &Path, contents: &[u8]) -> anyhow::Result<bool> {
        self.inner.create_new(path, contents)
    }

    fn rename(&self, from: &Path, to: &Path) -> anyhow::Result<()> {
        if from == Path::new(LOCK) && !self.replaced.swap(true, Ordering::SeqCst) {
            self.inner.write(from, self.replacement.as_bytes())?;
        }
        self.inner.rename(from, to)
    }

    fn remove_file(&self, path: &Path) -> anyhow::Result<bool> {
        self.inner.remove_file(path)
    }

    fn remove_all(&self, path: &Path) -> anyhow::Result<()> {
        self.inner.remove_all(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }

    fn read_dir(&self, path: &Path) -> anyhow::Result<Vec<PathBuf>> {
        self.inner.read_dir(path)
    }
}

#[test]
fn test_acquire_and_release() {
    let fs = MockFileSystem::new();
    let lock = lock_with(&fs, &[]);

    lock.acquire(&quick_options()).unwrap();
    let holder = lock.holder().unwrap().unwrap();
    assert_eq!(holder.pid, std::process::id());

    lock.release();
    assert!(!fs.exists(Path::new(LOCK)));
}

#[test]
fn test_dead_holder_is_reclaimed() {
    let fs = MockFileSystem::new();
    plant_holder(&fs, 4242, Duration::ZERO);
    let lock = lock_with(&fs, &[]);

    lock.acquire(&quick_options()).unwrap();
    assert_eq!(lock.holder().unwrap().unwrap().pid, std::process::id());
}

#[test]
fn test_stale_live_holder_is_reclaimed() {
    let fs = MockFileSystem::new();
    plant_holder(&fs, 4242, Duration::from_secs(120));
    let lock = lock_with(&fs, &[4242]);

    lock.acquire(&quick_options()).unwrap();
    assert_eq!(lock.holder().unwrap().unwrap().pid, std::process::id());
}

#[test]
fn test_fresh_live_holder_times_out() {
    let fs = MockFileSystem::new();
    plant_holder(&fs, 4242, Duration::ZERO);
    let lock = lock_with(&fs, &[4242]);

    let started = Instant::now();
    let err = lock.acquire(&quick_options()).unwrap_err();
    assert!(started.elapsed() >= Duration::from_millis(150));
    match err {
        TaskweaveError::LockTimeout { path, .. } => assert_eq!(path, Path::new(LOCK)),
        other => panic!("expected LockTimeout, got {other:?}"),
    }
    assert_eq!(lock.holder().unwrap().unwrap().pid, 4242);
}

#[test]
fn test_unreadable_lock_file_is_waited_on() {
    let fs = MockFileSystem::new();
    fs.add_file(LOCK, "garbage");
    let lock = lock_with(&fs, &[]);

    assert!(matches!(
        lock.acquire(&quick_options()),
        Err(TaskweaveError::LockTimeout { .. })
    ));
    assert_eq!(
        fs.read_optional(Path::new(LOCK)).unwrap().as_deref(),
        Some("garbage")
    );
}

#[test]
fn test_release_leaves_lock_reclaimed_by_another_process() {
    let fs = MockFileSystem::new();
    let lock = lock_with(&fs, &[]);
    lock.acquire(&quick_options()).unwrap();

    // Another process judged us stale and took over.
    plant_holder(&fs, 424242, Duration::ZERO);
    lock.release();

    assert_eq!(lock.holder().unwrap().unwrap().pid, 424242);
}

#[test]
fn test_release_without_acquire_keeps_file() {
    let fs = MockFileSystem::new();
    plant_holder(&fs, 4242, Duration::ZERO);
    let lock = lock_with(&fs, &[4242]);

    lock.release();
    assert_eq!(lock.holder().unwrap().unwrap().pid, 4242);
}

#[test]
fn test_reclaim_restores_lock_replaced_mid_reclaim() {
    let inner = MockFileSystem::new();
    plant_holder(&inner, 4242, Duration::ZERO);
    let winner = holder_aged(5151, Duration::ZERO);
    let fs = ReplacingFs {
        inner: inner.clone(),
        replacement: winner.render(),
        replaced: Arc::new(AtomicBool::new(false)),
    };
    // 4242 is dead; 5151 reclaimed first and is alive.
    let lock = FileLock::new(fs, LOCK, Arc::new(StaticLiveness::alive(&[5151])));

    assert!(matches!(
        lock.acquire(&quick_options()),
        Err(TaskweaveError::LockTimeout { .. })
    ));
    assert_eq!(lock.holder().unwrap(), Some(winner));
    assert!(leftover_tombstones(&inner).is_empty());
    assert!(!inner.exists(Path::new(GUARD)));
}

#[test]
fn test_live_reclaim_guard_blocks_second_reclaimer() {
    let fs = MockFileSystem::new();
    plant_holder(&fs, 4242, Duration::ZERO);
    fs.add_file(GUARD, holder_aged(777, Duration::ZERO).render());
    let lock = lock_with(&fs, &[777]);

    assert!(matches!(
        lock.acquire(&quick_options()),
        Err(TaskweaveError::LockTimeout { .. })
    ));
    assert_eq!(lock.holder().unwrap().unwrap().pid, 4242);
    assert!(fs.exists(Path::new(GUARD)));
}

#[test]
fn test_abandoned_reclaim_guard_is_cleared() {
    let fs = MockFileSystem::new();
    plant_holder(&fs, 4242, Duration::ZERO);
    fs.add_file(GUARD, holder_aged(778, Duration::ZERO).render());
    let lock = lock_with(&fs, &[]);

    lock.acquire(&quick_options()).unwrap();
    assert_eq!(lock.holder().unwrap().unwrap().pid, std::process::id());
    assert!(!fs.exists(Path::new(GUARD)));
    assert!(leftover_tombstones(&fs).is_empty());
}

#[test]
fn test_lock_holder_parse() {
    assert_eq!(
        LockHolder::parse("12\n1700000000000\n"),
        Some(LockHolder {
            pid: 12,
            acquired_at_ms: 1_700_000_000_000
        })
    );
    assert_eq!(LockHolder::parse("12\n"), None);
    assert_eq!(LockHolder::parse("pid\n5\n"), None);
}

#[cfg(unix)]
#[test]
fn test_process_liveness_sees_current_process() {
    use taskweave::lock::{LivenessProbe, ProcessLiveness};

    assert!(ProcessLiveness.is_alive(std::process::id()));
    assert!(!ProcessLiveness.is_alive(0));
}
