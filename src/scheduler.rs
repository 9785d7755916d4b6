//! Bounded-concurrency work runner
//!
//! A fixed pool of long-lived worker threads draining a FIFO channel of
//! closures, so at most N units of work run concurrently per scheduler
//! instance. Completion is tracked by handing each unit a wait-group guard;
//! the submitter blocks on the wait-group until every unit has finished or
//! failed. Cancellation is cooperative: it stops queued units from starting
//! but never interrupts a unit already running.
//!
//! A panic inside one unit is caught and logged; it neither kills the worker
//! thread nor prevents sibling units from completing.

use crossbeam::channel::{unbounded, Receiver, Sender};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, warn};

/// Worker count used when the caller supplies zero
pub const DEFAULT_WORKERS: usize = 5;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Fixed-capacity concurrent task runner
///
/// Dropping the scheduler closes the submission channel, lets the workers
/// drain whatever is still queued (unless cancelled), and joins them.
pub struct BoundedScheduler {
    tx: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
    cancelled: Arc<AtomicBool>,
    max_workers: usize,
}

impl BoundedScheduler {
    /// Create a scheduler running at most `max_workers` units concurrently
    ///
    /// A value below 1 is coerced to [`DEFAULT_WORKERS`].
    #[must_use]
    pub fn new(max_workers: usize) -> Self {
        let max_workers = if max_workers < 1 {
            DEFAULT_WORKERS
        } else {
            max_workers
        };

        let (tx, rx) = unbounded::<Job>();
        let cancelled = Arc::new(AtomicBool::new(false));

        let workers = (0..max_workers)
            .map(|i| {
                let rx = rx.clone();
                let cancelled = Arc::clone(&cancelled);
                std::thread::Builder::new()
                    .name(format!("ftpsync-worker-{i}"))
                    .spawn(move || worker_loop(&rx, &cancelled))
                    .unwrap_or_else(|e| panic!("failed to spawn worker thread: {e}"))
            })
            .collect();

        Self {
            tx: Some(tx),
            workers,
            cancelled,
            max_workers,
        }
    }

    /// Queue one unit of work
    ///
    /// Units run in FIFO submission order across the pool; with a single
    /// worker this degrades to strictly sequential execution.
    pub fn submit<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if let Some(tx) = &self.tx {
            // Send only fails when all workers are gone, which cannot happen
            // while the scheduler owns their join handles.
            let _ = tx.send(Box::new(job));
        }
    }

    /// Stop queued units from starting; units already running finish normally
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been signaled
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Maximum number of concurrently running units
    #[must_use]
    pub const fn max_workers(&self) -> usize {
        self.max_workers
    }
}

impl Drop for BoundedScheduler {
    fn drop(&mut self) {
        // Closing the channel ends each worker's recv loop once the queue
        // is drained.
        self.tx.take();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                warn!("worker thread panicked outside a unit of work");
            }
        }
    }
}

fn worker_loop(rx: &Receiver<Job>, cancelled: &AtomicBool) {
    while let Ok(job) = rx.recv() {
        if cancelled.load(Ordering::SeqCst) {
            // Dropping the closure releases its completion guard without
            // running it, so waiters are not left hanging.
            debug!("dropping queued unit after cancellation");
            continue;
        }
        if catch_unwind(AssertUnwindSafe(job)).is_err() {
            warn!("unit of work panicked; sibling units continue");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::sync::WaitGroup;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use std::time::Duration;

    #[test]
    fn zero_workers_coerces_to_default() {
        let scheduler = BoundedScheduler::new(0);
        assert_eq!(scheduler.max_workers(), DEFAULT_WORKERS);
    }

    #[test]
    fn never_runs_more_than_n_units_concurrently() {
        let n = 3;
        let scheduler = BoundedScheduler::new(n);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let wg = WaitGroup::new();

        for _ in 0..24 {
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            let guard = wg.clone();
            scheduler.submit(move || {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(10));
                running.fetch_sub(1, Ordering::SeqCst);
                drop(guard);
            });
        }
        wg.wait();

        assert!(peak.load(Ordering::SeqCst) <= n);
        assert!(peak.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn single_worker_preserves_fifo_order() {
        let scheduler = BoundedScheduler::new(1);
        let order = Arc::new(Mutex::new(Vec::new()));
        let wg = WaitGroup::new();

        for i in 0..16 {
            let order = Arc::clone(&order);
            let guard = wg.clone();
            scheduler.submit(move || {
                order.lock().unwrap().push(i);
                drop(guard);
            });
        }
        wg.wait();

        let seen = order.lock().unwrap();
        assert_eq!(*seen, (0..16).collect::<Vec<_>>());
    }

    #[test]
    fn panicking_unit_does_not_prevent_siblings() {
        let scheduler = BoundedScheduler::new(4);
        let completed = Arc::new(AtomicUsize::new(0));
        let wg = WaitGroup::new();

        for i in 0..20 {
            let completed = Arc::clone(&completed);
            let guard = wg.clone();
            scheduler.submit(move || {
                let _guard = guard;
                if i == 7 {
                    panic!("injected failure");
                }
                completed.fetch_add(1, Ordering::SeqCst);
            });
        }
        wg.wait();

        assert_eq!(completed.load(Ordering::SeqCst), 19);
    }

    #[test]
    fn cancellation_stops_queued_units_but_releases_their_guards() {
        let scheduler = BoundedScheduler::new(1);
        let ran = Arc::new(AtomicUsize::new(0));
        let wg = WaitGroup::new();

        {
            let guard = wg.clone();
            scheduler.submit(move || {
                std::thread::sleep(Duration::from_millis(50));
                drop(guard);
            });
        }
        // Queued behind the sleeper; cancelled before it can start.
        for _ in 0..8 {
            let ran = Arc::clone(&ran);
            let guard = wg.clone();
            scheduler.submit(move || {
                let _guard = guard;
                ran.fetch_add(1, Ordering::SeqCst);
            });
        }
        scheduler.cancel();
        wg.wait();

        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert!(scheduler.is_cancelled());
    }

    #[test]
    fn drop_joins_all_workers() {
        let scheduler = BoundedScheduler::new(2);
        let done = Arc::new(AtomicUsize::new(0));
        for _ in 0..6 {
            let done = Arc::clone(&done);
            scheduler.submit(move || {
                done.fetch_add(1, Ordering::SeqCst);
            });
        }
        drop(scheduler);
        // Drop drains the queue before joining, so everything ran.
        assert_eq!(done.load(Ordering::SeqCst), 6);
    }
}
