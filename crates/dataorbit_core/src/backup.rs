//! Periodic snapshots of the data file.
//!
//! Each configured [`BackupPolicy`] gets its own timer thread. When a timer
//! fires, the thread takes the store lock and copies the data file, still
//! obfuscated, into `<file>_backups/<unixEpochMillis>_backup.json`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dataorbit_core::{BackupPolicy, Config, Store};
//!
//! let config = Config::new("database.json", "mySecretKey")
//!     .backup(BackupPolicy::days(1.0))
//!     .backup(BackupPolicy::days(7.0));
//! let store = Store::open(config)?;
//!
//! let mut backups = store.start_backup_service();
//! // ...
//! backups.stop();
//! ```

use crate::config::BackupPolicy;
use crate::store::Store;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Stop signal shared by the timer threads.
#[derive(Debug, Default)]
struct Shutdown {
    stopped: Mutex<bool>,
    wake: Condvar,
}

/// Running backup timers.
///
/// Created by [`Store::start_backup_service`]. Dropping the service stops
/// every timer and waits for the threads to exit.
#[derive(Debug)]
pub struct BackupService {
    shutdown: Arc<Shutdown>,
    workers: Vec<JoinHandle<()>>,
}

impl BackupService {
    pub(crate) fn start(store: Store, policies: &[BackupPolicy]) -> Self {
        let shutdown = Arc::new(Shutdown::default());
        let mut workers = Vec::with_capacity(policies.len());

        for (n, policy) in policies.iter().enumerate() {
            let interval = policy.interval();
            let store = store.clone();
            let shutdown = Arc::clone(&shutdown);
            let spawned = thread::Builder::new()
                .name(format!("dataorbit-backup-{n}"))
                .spawn(move || run_timer(&store, interval, &shutdown));
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(err) => warn!(policy = n, error = %err, "could not start backup timer"),
            }
        }

        debug!(timers = workers.len(), "backup service started");
        Self { shutdown, workers }
    }

    /// Number of timers still running.
    #[must_use]
    pub fn timer_count(&self) -> usize {
        self.workers.len()
    }

    /// Returns true until [`stop`](Self::stop) is called.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !*self.shutdown.stopped.lock()
    }

    /// Stops every timer and waits for the threads to exit.
    ///
    /// A snapshot already in progress completes first. Calling `stop` more
    /// than once is harmless.
    pub fn stop(&mut self) {
        {
            let mut stopped = self.shutdown.stopped.lock();
            *stopped = true;
        }
        self.shutdown.wake.notify_all();

        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                warn!("backup timer thread panicked");
            }
        }
    }
}

impl Drop for BackupService {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_timer(store: &Store, interval: Duration, shutdown: &Shutdown) {
    let mut stopped = shutdown.stopped.lock();
    loop {
        match Instant::now().checked_add(interval) {
            Some(deadline) => {
                while !*stopped {
                    if shutdown.wake.wait_until(&mut stopped, deadline).timed_out() {
                        break;
                    }
                }
            }
            // Too far out to ever fire.
            None => {
                while !*stopped {
                    shutdown.wake.wait(&mut stopped);
                }
            }
        }
        if *stopped {
            return;
        }

        parking_lot::MutexGuard::unlocked(&mut stopped, || match store.backup_now() {
            Ok(path) => debug!(snapshot = %path.display(), "scheduled snapshot taken"),
            Err(err) => warn!(error = %err, "scheduled snapshot failed"),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::schema::TableSchema;
    use crate::types::Row;
    use dataorbit_storage::list_snapshots;
    use tempfile::tempdir;

    fn store_with(dir: &tempfile::TempDir, policies: &[Duration]) -> Store {
        let mut config = Config::new(dir.path().join("database.json"), "k");
        for interval in policies {
            config = config.backup(BackupPolicy::every(*interval));
        }
        Store::open(config).unwrap()
    }

    fn seed(store: &Store) {
        store.create_table("notes", TableSchema::new()).unwrap();
        store.insert("notes", Row::new()).unwrap();
    }

    fn wait_for_snapshots(store: &Store, at_least: usize) -> usize {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let count = list_snapshots(&store.backup_dir()).map_or(0, |s| s.len());
            if count >= at_least || Instant::now() > deadline {
                return count;
            }
            thread::sleep(Duration::from_millis(10));
        }
    }

    #[test]
    fn two_policies_both_snapshot() {
        let dir = tempdir().unwrap();
        let store = store_with(
            &dir,
            &[Duration::from_millis(20), Duration::from_millis(40)],
        );
        seed(&store);

        let mut service = store.start_backup_service();
        assert_eq!(service.timer_count(), 2);
        let count = wait_for_snapshots(&store, 4);
        service.stop();

        assert!(count >= 4);
        let snapshots = list_snapshots(&store.backup_dir()).unwrap();
        let data = std::fs::read(store.path()).unwrap();
        for entry in &snapshots {
            assert_eq!(std::fs::read(&entry.path).unwrap(), data);
        }
        let mut stamps: Vec<_> = snapshots.iter().map(|e| e.timestamp_ms).collect();
        stamps.dedup();
        assert_eq!(stamps.len(), snapshots.len());
    }

    #[test]
    fn missing_data_file_keeps_timer_alive() {
        let dir = tempdir().unwrap();
        let store = store_with(&dir, &[Duration::from_millis(10)]);

        let mut service = store.start_backup_service();
        thread::sleep(Duration::from_millis(50));
        assert!(service.is_running());

        seed(&store);
        assert!(wait_for_snapshots(&store, 1) >= 1);
        service.stop();
    }

    #[test]
    fn stop_is_prompt_and_idempotent() {
        let dir = tempdir().unwrap();
        let store = store_with(&dir, &[Duration::from_secs(86_400)]);

        let mut service = store.start_backup_service();
        let started = Instant::now();
        service.stop();
        service.stop();

        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(!service.is_running());
        assert_eq!(service.timer_count(), 0);
    }

    #[test]
    fn drop_stops_timers() {
        let dir = tempdir().unwrap();
        let store = store_with(&dir, &[Duration::from_millis(5)]);
        seed(&store);

        drop(store.start_backup_service());
        let after_stop = list_snapshots(&store.backup_dir()).map_or(0, |s| s.len());
        thread::sleep(Duration::from_millis(50));
        let later = list_snapshots(&store.backup_dir()).map_or(0, |s| s.len());
        assert_eq!(after_stop, later);
    }

    #[test]
    fn no_policies_no_threads() {
        let dir = tempdir().unwrap();
        let store = store_with(&dir, &[]);
        let service = store.start_backup_service();
        assert_eq!(service.timer_count(), 0);
    }
}
