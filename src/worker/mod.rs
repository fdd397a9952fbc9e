//! Worker pool
//!
//! This module implements the WorkerPool, the execution unit the batch drivers
//! use to evaluate many independent samples. Units are fed through a bounded
//! queue and pulled by a fixed number of scoped worker threads, so a slow unit
//! never stalls a statically assigned partition.
//!
//! # Architecture
//!
//! - **Job queue**: bounded crossbeam channel, capacity `queue_depth`
//! - **Workers**: `threads` scoped threads pulling jobs until the queue closes
//! - **Results**: unbounded crossbeam channel, reordered by submission index
//!
//! # Example
//!
//! ```
//! use hrceval::worker::WorkerPool;
//!
//! let pool = WorkerPool::new(4, 8);
//! let squares = pool.run((1..=5u64).collect(), |_, n| n * n);
//! assert_eq!(squares, vec![1, 4, 9, 16, 25]);
//! ```

use crate::config::WorkerConfig;
use crossbeam::channel::{bounded, unbounded};
use std::thread;
use tracing::debug;

/// Fixed-size pool of pull-based worker threads
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    threads: usize,
    queue_depth: usize,
}

impl WorkerPool {
    /// Create a pool; zero values are raised to one
    pub fn new(threads: usize, queue_depth: usize) -> Self {
        Self {
            threads: threads.max(1),
            queue_depth: queue_depth.max(1),
        }
    }

    pub fn from_config(config: &WorkerConfig) -> Self {
        Self::new(config.effective_threads(), config.queue_depth)
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Run `handler` over every unit and return the results in unit order
    ///
    /// `handler` receives the unit's position in `units` and the unit itself.
    /// A panicking handler propagates the panic to the caller once all
    /// threads have stopped.
    pub fn run<T, R, F>(&self, units: Vec<T>, handler: F) -> Vec<R>
    where
        T: Send,
        R: Send,
        F: Fn(usize, T) -> R + Sync,
    {
        let total = units.len();
        if total == 0 {
            return Vec::new();
        }
        let threads = self.threads.min(total);
        debug!(units = total, threads, queue_depth = self.queue_depth, "starting worker pool");

        let (job_tx, job_rx) = bounded::<(usize, T)>(self.queue_depth);
        let (result_tx, result_rx) = unbounded::<(usize, R)>();
        let handler = &handler;

        thread::scope(|scope| {
            for worker_id in 0..threads {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move || {
                    let mut done = 0usize;
                    for (index, unit) in job_rx.iter() {
                        let result = handler(index, unit);
                        if result_tx.send((index, result)).is_err() {
                            break;
                        }
                        done += 1;
                    }
                    debug!(worker_id, units = done, "worker finished");
                });
            }
            drop(job_rx);
            drop(result_tx);

            // Blocks while the queue is full; workers drain it concurrently
            for job in units.into_iter().enumerate() {
                if job_tx.send(job).is_err() {
                    break;
                }
            }
            drop(job_tx);
        });

        let mut slots: Vec<Option<R>> = (0..total).map(|_| None).collect();
        for (index, result) in result_rx.try_iter() {
            slots[index] = Some(result);
        }
        slots.into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[test]
    fn test_results_in_unit_order() {
        let pool = WorkerPool::new(3, 2);
        let out = pool.run((0..100).collect(), |index, unit: i32| {
            assert_eq!(index as i32, unit);
            unit * 2
        });
        assert_eq!(out, (0..100).map(|n| n * 2).collect::<Vec<_>>());
    }

    #[test]
    fn test_every_unit_runs_once() {
        let pool = WorkerPool::new(4, 1);
        let calls = AtomicUsize::new(0);
        let seen = Mutex::new(HashSet::new());
        pool.run((0..257).collect(), |_, unit: usize| {
            calls.fetch_add(1, Ordering::Relaxed);
            assert!(seen.lock().unwrap().insert(unit));
        });
        assert_eq!(calls.load(Ordering::Relaxed), 257);
    }

    #[test]
    fn test_uses_multiple_threads() {
        let pool = WorkerPool::new(4, 4);
        let ids = Mutex::new(HashSet::new());
        pool.run((0..64).collect(), |_, _: u32| {
            ids.lock().unwrap().insert(thread::current().id());
            thread::sleep(std::time::Duration::from_millis(2));
        });
        assert!(ids.lock().unwrap().len() > 1);
    }

    #[test]
    fn test_empty_and_zero_sizes() {
        let pool = WorkerPool::new(0, 0);
        assert_eq!(pool.threads(), 1);
        let out: Vec<u8> = pool.run(Vec::<u8>::new(), |_, u| u);
        assert!(out.is_empty());
        assert_eq!(pool.run(vec![7u8], |_, u| u + 1), vec![8]);
    }
}
