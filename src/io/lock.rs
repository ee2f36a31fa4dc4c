use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// How long store operations wait for another prio process to finish.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Advisory lock held for a whole read-mutate-write of the task file.
///
/// The lock lives in a sibling file (`tasks.json` → `tasks.json.lock`) so
/// the task file itself can be replaced by rename while the lock is held.
/// The lock file is never removed: a waiter may already hold it open, and
/// unlinking it would let a newcomer lock a fresh inode alongside it.
/// Releasing is closing the descriptor.
#[derive(Debug)]
pub struct FileLock {
    _file: File,
}

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not create lock file at {path}: {source}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("timed out waiting for {path}: another prio process is writing")]
    Timeout { path: PathBuf },
}

/// Lock file guarding `target`.
pub fn lock_path_for(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "tasks".into());
    name.push(".lock");
    target.with_file_name(name)
}

impl FileLock {
    /// Lock `target`, polling until `timeout` elapses.
    pub fn acquire(target: &Path, timeout: Duration) -> Result<Self, LockError> {
        let lock_path = lock_path_for(target);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|source| LockError::Create {
                path: lock_path.clone(),
                source,
            })?;

        let start = Instant::now();
        loop {
            match try_lock(&file) {
                Ok(()) => {
                    return Ok(FileLock { _file: file });
                }
                Err(_) if start.elapsed() < timeout => {
                    std::thread::sleep(Duration::from_millis(10));
                }
                Err(_) => return Err(LockError::Timeout { path: lock_path }),
            }
        }
    }

    pub fn acquire_default(target: &Path) -> Result<Self, LockError> {
        Self::acquire(target, DEFAULT_LOCK_TIMEOUT)
    }
}

/// Non-blocking exclusive flock.
#[cfg(unix)]
pub(crate) fn try_lock(file: &File) -> std::io::Result<()> {
    use std::os::unix::io::AsRawFd;
    let result = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if result == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
pub(crate) fn try_lock(_file: &File) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lock_path_is_sibling() {
        assert_eq!(
            lock_path_for(Path::new("/data/prio/tasks.json")),
            PathBuf::from("/data/prio/tasks.json.lock")
        );
    }

    #[test]
    fn test_acquire_release_reacquire() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("tasks.json");

        let lock = FileLock::acquire_default(&target).unwrap();
        assert!(lock_path_for(&target).exists());
        drop(lock);
        assert!(lock_path_for(&target).exists());

        assert!(FileLock::acquire_default(&target).is_ok());
    }

    #[test]
    fn test_contention_times_out() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("tasks.json");

        let _held = FileLock::acquire_default(&target).unwrap();
        let second = FileLock::acquire(&target, Duration::from_millis(50));
        assert!(matches!(second, Err(LockError::Timeout { .. })));
    }

    #[test]
    fn test_waiter_excludes_later_arrivals() {
        use std::sync::mpsc;
        use std::thread;

        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("tasks.json");

        let first = FileLock::acquire_default(&target).unwrap();
        let (acquired_tx, acquired_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let waiter_target = target.clone();
        let waiter = thread::spawn(move || {
            let lock = FileLock::acquire_default(&waiter_target).unwrap();
            acquired_tx.send(()).unwrap();
            release_rx.recv().unwrap();
            drop(lock);
        });

        // let the waiter open the lock file and start polling
        thread::sleep(Duration::from_millis(100));
        drop(first);
        acquired_rx.recv_timeout(Duration::from_secs(5)).unwrap();

        let third = FileLock::acquire(&target, Duration::from_millis(50));
        assert!(matches!(third, Err(LockError::Timeout { .. })));

        release_tx.send(()).unwrap();
        waiter.join().unwrap();
        assert!(FileLock::acquire_default(&target).is_ok());
    }

    #[test]
    fn test_missing_directory_is_create_error() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("nope").join("tasks.json");
        assert!(matches!(
            FileLock::acquire_default(&target),
            Err(LockError::Create { .. })
        ));
    }
}
