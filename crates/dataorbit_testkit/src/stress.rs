//! Stress tests for DataOrbit.
//!
//! These tests verify behavior under load and concurrent access. Every
//! mutation rewrites the whole data file, so operation counts stay modest.

use dataorbit_core::{Row, Store, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {name} ===");
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of operations to perform.
    pub operations: usize,
    /// Number of concurrent threads (for concurrent tests).
    pub threads: usize,
    /// Length of the text written into each row.
    pub value_len: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 500,
            threads: 4,
            value_len: 64,
        }
    }
}

fn account(i: usize, value_len: usize) -> Row {
    Row::new()
        .with("name", "x".repeat(value_len))
        .with("email", format!("user{i}@example.com"))
}

/// Run a sequential insert stress test against the `accounts` table.
pub fn stress_sequential_inserts(store: &Store, config: &StressConfig) -> StressTestResult {
    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for i in 0..config.operations {
        match store.insert("accounts", account(i, config.value_len)) {
            Ok(_) => successful += 1,
            Err(_) => failed += 1,
        }
    }

    StressTestResult::new(successful, failed, start.elapsed())
}

/// Run a concurrent insert stress test: each thread inserts its own slice
/// of distinct emails through a clone of the store.
pub fn stress_concurrent_inserts(store: &Store, config: &StressConfig) -> StressTestResult {
    let successful = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);
    let ops_per_thread = config.operations / config.threads.max(1);

    let start = Instant::now();

    thread::scope(|scope| {
        for t in 0..config.threads {
            let store = store.clone();
            let successful = &successful;
            let failed = &failed;
            let value_len = config.value_len;

            scope.spawn(move || {
                for i in 0..ops_per_thread {
                    match store.insert("accounts", account(t * ops_per_thread + i, value_len)) {
                        Ok(_) => {
                            successful.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(_) => {
                            failed.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
            });
        }
    });

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

/// Run a contention test: every thread tries to claim the same emails, so
/// exactly one insert per email may succeed.
pub fn stress_unique_contention(store: &Store, config: &StressConfig) -> StressTestResult {
    let successful = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);
    let emails = config.operations / config.threads.max(1);

    let start = Instant::now();

    thread::scope(|scope| {
        for _ in 0..config.threads {
            let store = store.clone();
            let successful = &successful;
            let failed = &failed;
            let value_len = config.value_len;

            scope.spawn(move || {
                for i in 0..emails {
                    match store.insert("accounts", account(i, value_len)) {
                        Ok(_) => {
                            successful.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(_) => {
                            failed.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
            });
        }
    });

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

/// Run a mixed read/edit/delete stress test over rows inserted up front.
pub fn stress_mixed_operations(store: &Store, config: &StressConfig) -> StressTestResult {
    let rows = (config.operations / 4).max(1);
    for i in 0..rows {
        let _ = store.insert("accounts", account(i, config.value_len));
    }

    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for i in 0..config.operations {
        let key = Value::from((i % rows + 1) as u64);
        let ok = match i % 4 {
            0 | 1 => store.get_row("accounts", "id", &key).is_some() || i % rows >= rows / 2,
            2 => store
                .edit(
                    "accounts",
                    "id",
                    &Row::new().with("id", key).with("name", format!("edit {i}")),
                )
                .is_ok(),
            _ => {
                if i % rows >= rows / 2 {
                    store.delete("accounts", "id", &key).is_ok()
                } else {
                    true
                }
            }
        };
        if ok {
            successful += 1;
        } else {
            failed += 1;
        }
    }

    StressTestResult::new(successful, failed, start.elapsed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TestStore;
    use dataorbit_core::BackupPolicy;
    use std::collections::HashSet;

    fn small() -> StressConfig {
        StressConfig {
            operations: 200,
            threads: 4,
            value_len: 16,
        }
    }

    #[test]
    fn test_sequential_inserts() {
        let store = TestStore::new();
        let result = stress_sequential_inserts(&store, &small());
        assert_eq!(result.failed_ops, 0);
        assert_eq!(result.successful_ops, 200);
        assert_eq!(store.row_count("accounts"), 200);
    }

    #[test]
    fn test_concurrent_inserts_get_distinct_keys() {
        let store = TestStore::new();
        let result = stress_concurrent_inserts(&store, &small());
        assert_eq!(result.failed_ops, 0);

        let keys: HashSet<u64> = store
            .get_column("accounts", "id")
            .into_iter()
            .flatten()
            .filter_map(|v| v.as_integer_key())
            .collect();
        assert_eq!(keys.len(), 200);
        assert_eq!(keys.iter().max(), Some(&200));
    }

    #[test]
    fn test_unique_contention() {
        let store = TestStore::new();
        let config = small();
        let result = stress_unique_contention(&store, &config);

        let emails = config.operations / config.threads;
        assert_eq!(result.successful_ops, emails);
        assert_eq!(result.failed_ops, emails * (config.threads - 1));
        assert_eq!(store.row_count("accounts"), emails);
    }

    #[test]
    fn test_mixed_operations() {
        let store = TestStore::new();
        let result = stress_mixed_operations(&store, &small());
        assert_eq!(result.failed_ops, 0);
    }

    #[test]
    fn test_inserts_with_backups_running() {
        let store =
            TestStore::with_config(|c| c.backup(BackupPolicy::every(Duration::from_millis(5))));
        store
            .insert("accounts", account(usize::MAX, 4))
            .expect("Failed to insert seed row");
        let mut backups = store.start_backup_service();

        let result = stress_concurrent_inserts(&store, &small());
        thread::sleep(Duration::from_millis(30));
        backups.stop();
        assert_eq!(result.failed_ops, 0);

        let snapshots = dataorbit_storage::list_snapshots(&store.backup_dir()).unwrap();
        assert!(!snapshots.is_empty());
        let key = dataorbit_codec::ObfuscationKey::new(crate::fixtures::TEST_KEY).unwrap();
        for entry in snapshots {
            let blob = std::fs::read(&entry.path).unwrap();
            let decoded: dataorbit_codec::CodecResult<dataorbit_codec::RawDataset> =
                dataorbit_codec::open(&blob, &key);
            assert!(decoded.is_ok(), "torn snapshot {}", entry.path.display());
        }
    }
}
