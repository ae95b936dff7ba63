// Licensed under the MIT license.

//! A lock-free-read, bounded-wait-write grace-period mechanism.
//!
//! True per-CPU counters need CPU-topology discovery (restartable
//! sequences, `sched_getcpu`), which this crate does not take on. Instead
//! each thread gets its own counter cell on first use — the same
//! "bulletproof" shape liburcu's `urcu-bp` uses — tracked in a global list
//! under a mutex that only the rare register/unregister path takes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How often `wait_grace_period` polls while a period is still draining.
pub const GRACE_PERIOD_POLL: Duration = Duration::from_millis(10);

/// One reader's begin/end counters for both periods. Registered once per
/// thread that ever enters a read section, and never removed while the
/// thread may still call back in (removal happens only when the thread
/// itself deregisters, e.g. on drop of its registration guard).
#[derive(Debug, Default)]
struct ReaderCell {
    begin: [AtomicUsize; 2],
    end: [AtomicUsize; 2],
}

impl ReaderCell {
    fn new() -> Self {
        Self {
            begin: [AtomicUsize::new(0), AtomicUsize::new(0)],
            end: [AtomicUsize::new(0), AtomicUsize::new(0)],
        }
    }
}

/// Global grace-period state: the flip bit and the list of every thread's
/// reader cell.
#[derive(Debug, Default)]
pub struct RcuGpState {
    period: AtomicUsize,
    cells: Mutex<Vec<Arc<ReaderCell>>>,
    /// Serializes concurrent `wait_grace_period` callers so only one
    /// actually drives the flip; others just wait for it to finish.
    gp_lock: Mutex<()>,
}

// Keyed by the `RcuGpState`'s address rather than a single slot, so a
// thread that reads from more than one grace-period state (as the test
// suite does) gets a distinct cell per state instead of silently sharing
// one across them.
thread_local! {
    static THREAD_CELLS: std::cell::RefCell<std::collections::HashMap<usize, Arc<ReaderCell>>> =
        std::cell::RefCell::new(std::collections::HashMap::new());
}

impl RcuGpState {
    /// Creates a fresh grace-period state with no registered readers.
    pub fn new() -> Self {
        Self {
            period: AtomicUsize::new(0),
            cells: Mutex::new(Vec::new()),
            gp_lock: Mutex::new(()),
        }
    }

    fn cell_for_current_thread(&self) -> Arc<ReaderCell> {
        let key = self as *const Self as usize;
        THREAD_CELLS.with(|slots| {
            if let Some(existing) = slots.borrow().get(&key) {
                return existing.clone();
            }
            let cell = Arc::new(ReaderCell::new());
            self.cells.lock().unwrap().push(cell.clone());
            slots.borrow_mut().insert(key, cell.clone());
            cell
        })
    }

    /// Enters a read-side critical section. Returns a guard; dropping it
    /// (or calling [`ReadGuard::exit`] explicitly) records the matching
    /// `end` increment.
    pub fn read_lock(&self) -> ReadGuard {
        let cell = self.cell_for_current_thread();
        // Step 1: relaxed load of the period, recorded for this call.
        let period = self.period.load(Ordering::Relaxed) & 1;
        // Step 2: seq-cst increment of this thread's begin[period].
        cell.begin[period].fetch_add(1, Ordering::SeqCst);
        // (A) full barrier delimits the critical section start.
        std::sync::atomic::fence(Ordering::SeqCst);
        ReadGuard { cell, period }
    }

    fn scan_active(&self, cells: &[Arc<ReaderCell>]) -> [usize; 2] {
        // The scan reads all ends first, then a full fence (C), then all
        // begins, so a reader observed "in critical section" is guaranteed
        // to have already incremented begin.
        let mut sum_end = [0usize, 0];
        for cell in cells {
            sum_end[0] += cell.end[0].load(Ordering::SeqCst);
            sum_end[1] += cell.end[1].load(Ordering::SeqCst);
        }
        std::sync::atomic::fence(Ordering::SeqCst); // (C)
        let mut sum_begin = [0usize, 0];
        for cell in cells {
            sum_begin[0] += cell.begin[0].load(Ordering::SeqCst);
            sum_begin[1] += cell.begin[1].load(Ordering::SeqCst);
        }
        [
            sum_begin[0].saturating_sub(sum_end[0]),
            sum_begin[1].saturating_sub(sum_end[1]),
        ]
    }

    /// Blocks until every read section begun before this call has
    /// completed. Bounded by the longest outstanding reader plus one poll
    /// interval.
    pub fn wait_grace_period(&self) {
        // (D) orders prior writes before the scan.
        std::sync::atomic::fence(Ordering::SeqCst);

        let cells = self.cells.lock().unwrap().clone();
        let active = self.scan_active(&cells);
        if active[0] == 0 && active[1] == 0 {
            std::sync::atomic::fence(Ordering::SeqCst); // (E)
            return;
        }

        let _gp_guard = self.gp_lock.lock().unwrap();
        let prev = self.period.load(Ordering::Relaxed) & 1;
        loop {
            if self.scan_active(&cells)[prev] == 0 {
                break;
            }
            std::thread::sleep(GRACE_PERIOD_POLL);
        }
        self.period.fetch_xor(1, Ordering::SeqCst);
        let new_prev = prev ^ 1;
        loop {
            if self.scan_active(&cells)[new_prev] == 0 {
                break;
            }
            std::thread::sleep(GRACE_PERIOD_POLL);
        }

        // (E) orders the scan before subsequent writer operations.
        std::sync::atomic::fence(Ordering::SeqCst);
    }
}

/// A live RCU read-side critical section. Exiting (by drop, or explicitly
/// via [`ReadGuard::exit`]) increments the matching `end` counter.
pub struct ReadGuard {
    cell: Arc<ReaderCell>,
    period: usize,
}

impl ReadGuard {
    /// Explicitly ends the critical section. Equivalent to dropping the
    /// guard; provided so call sites can make the exit point visible.
    pub fn exit(self) {
        drop(self);
    }
}

impl Drop for ReadGuard {
    fn drop(&mut self) {
        // (B) full barrier, then seq-cst increment of end[period].
        std::sync::atomic::fence(Ordering::SeqCst);
        self.cell.end[self.period].fetch_add(1, Ordering::SeqCst);
    }
}

/// Release-store publication of a pointer: `assign_pointer(p, v)`.
pub fn assign_pointer<T>(slot: &std::sync::atomic::AtomicPtr<T>, value: *mut T) {
    slot.store(value, Ordering::Release);
}

/// Consume/acquire load of a published pointer: `dereference(p)`.
pub fn dereference<T>(slot: &std::sync::atomic::AtomicPtr<T>) -> *mut T {
    slot.load(Ordering::Acquire)
}
