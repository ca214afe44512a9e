//! PID lock file held for the duration of a `sync`.
//!
//! The ledger's one-`IN_PROGRESS`-per-type index catches concurrent runs too,
//! but only after both have decoded their sources. The lock stops the second
//! process before it does any work.

use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const LOCK_WAIT_TIMEOUT: Duration = Duration::from_secs(30);
const LOCK_RETRY_DELAY: Duration = Duration::from_millis(250);

pub struct WriteLockGuard {
    path: PathBuf,
}

impl Drop for WriteLockGuard {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Acquire the lock at `lock_path`, waiting for a live holder to finish.
///
/// A lock whose recorded PID is no longer running is removed and retaken.
pub async fn acquire(lock_path: &Path) -> anyhow::Result<WriteLockGuard> {
    acquire_within(lock_path, LOCK_WAIT_TIMEOUT).await
}

async fn acquire_within(lock_path: &Path, timeout: Duration) -> anyhow::Result<WriteLockGuard> {
    let started = Instant::now();

    loop {
        match try_acquire(lock_path) {
            Ok(guard) => return Ok(guard),
            Err(LockState::HeldBy(pid)) => {
                if started.elapsed() >= timeout {
                    anyhow::bail!(
                        "another sync is running (pid {pid}); try again after it finishes"
                    );
                }
                tokio::time::sleep(LOCK_RETRY_DELAY).await;
            }
            Err(LockState::Stale(pid)) => {
                tracing::warn!(pid, path = %lock_path.display(), "Removing stale sync lock");
                let _ = std::fs::remove_file(lock_path);
            }
            Err(LockState::Unknown) => {
                if started.elapsed() >= timeout {
                    anyhow::bail!(
                        "could not acquire sync lock at {}; remove it if no catsync process is running",
                        lock_path.display()
                    );
                }
                tokio::time::sleep(LOCK_RETRY_DELAY).await;
            }
        }
    }
}

#[derive(Debug)]
enum LockState {
    HeldBy(i32),
    Stale(i32),
    Unknown,
}

fn try_acquire(lock_path: &Path) -> Result<WriteLockGuard, LockState> {
    if let Some(parent) = lock_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    match OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(lock_path)
    {
        Ok(mut file) => {
            let pid = std::process::id();
            let _ = writeln!(file, "{pid}");
            Ok(WriteLockGuard {
                path: lock_path.to_path_buf(),
            })
        }
        Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
            let mut pid_buf = String::new();
            if OpenOptions::new()
                .read(true)
                .open(lock_path)
                .and_then(|mut file| file.read_to_string(&mut pid_buf))
                .is_err()
            {
                return Err(LockState::Unknown);
            }

            match pid_buf.trim().parse::<i32>().ok() {
                Some(pid) if is_process_running(pid) => Err(LockState::HeldBy(pid)),
                Some(pid) => Err(LockState::Stale(pid)),
                None => Err(LockState::Unknown),
            }
        }
        Err(_) => Err(LockState::Unknown),
    }
}

fn is_process_running(pid: i32) -> bool {
    std::process::Command::new("kill")
        .arg("-0")
        .arg(pid.to_string())
        .status()
        .is_ok_and(|status| status.success())
}
