use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{anyhow, Result};
use log::debug;
use tokio::sync::Notify;

use crate::job::JobId;
use crate::slot::{FinishedJob, SlotTable};

/// Bookkeeping shared between the dispatch loop and the completion path.
#[derive(Debug)]
struct PoolState {
    slots: SlotTable,
    in_flight: usize,
    completed: usize,
    launched: usize,
    skipped: usize,
    errors: usize,
    peak_in_flight: usize,
    /// Sticky flag: at least one job finished since the last drain.
    finished_pending: bool,
}

/// Counter snapshot used for the end-of-run summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub launched: usize,
    pub skipped: usize,
    pub errors: usize,
    pub completed: usize,
    pub peak_in_flight: usize,
}

/// The scheduler context: the slot table plus the counters that drive the
/// dispatch loop, guarded by one mutex so the completion path's reclaim
/// never interleaves with the dispatcher's drain.
///
/// A [`Notify`] carries the "something finished" wakeup. Its stored permit
/// means a completion landing between the dispatcher's state check and its
/// suspension is not lost, and a burst of completions wakes the dispatcher
/// at least once after the last of them.
#[derive(Debug)]
pub struct WorkerPool {
    state: Mutex<PoolState>,
    completions: Notify,
}

impl WorkerPool {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(WorkerPool {
            state: Mutex::new(PoolState {
                slots: SlotTable::new(capacity),
                in_flight: 0,
                completed: 0,
                launched: 0,
                skipped: 0,
                errors: 0,
                peak_in_flight: 0,
                finished_pending: false,
            }),
            completions: Notify::new(),
        })
    }

    fn locked(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn capacity(&self) -> usize {
        self.locked().slots.capacity()
    }

    /// Files accounted for so far: reaped jobs plus skips and path errors.
    pub fn completed(&self) -> usize {
        self.locked().completed
    }

    pub fn is_full(&self) -> bool {
        !self.locked().slots.has_free()
    }

    /// Reserve a free slot for `job`. The dispatcher is the only occupier
    /// and checks for a free slot first, so a full pool here is a
    /// scheduling bug and surfaces as an error.
    pub fn acquire(&self, job: JobId, output: PathBuf) -> Result<()> {
        let mut state = self.locked();
        state
            .slots
            .acquire(job, output)
            .ok_or_else(|| anyhow!("no free worker slot at launch"))?;
        state.in_flight += 1;
        state.launched += 1;
        state.peak_in_flight = state.peak_in_flight.max(state.in_flight);
        Ok(())
    }

    /// Completion path: reconcile a finished job against the slot table,
    /// update the counters, set the sticky flag and wake the dispatcher.
    /// Called exactly once per job by its watcher task; completions of
    /// unknown jobs are ignored.
    pub fn complete(&self, job: JobId) {
        let mut state = self.locked();
        if state.slots.reclaim(job) {
            state.in_flight -= 1;
            state.completed += 1;
            state.finished_pending = true;
        } else {
            debug!("completion for unknown job {job}");
        }
        drop(state);
        self.completions.notify_one();
    }

    /// Account for a file that needs no job: its output already exists.
    pub fn count_skipped(&self) {
        let mut state = self.locked();
        state.skipped += 1;
        state.completed += 1;
    }

    /// Account for a file dropped on a path-derivation error.
    pub fn count_error(&self) {
        let mut state = self.locked();
        state.errors += 1;
        state.completed += 1;
    }

    /// Suspend until the next completion notification.
    pub async fn wait(&self) {
        self.completions.notified().await;
    }

    /// If the sticky completion flag is set, clear it and release every
    /// exited slot, returning their records in table order.
    pub fn drain_finished(&self) -> Option<Vec<FinishedJob>> {
        let mut state = self.locked();
        if !state.finished_pending {
            return None;
        }
        state.finished_pending = false;
        Some(state.slots.drain())
    }

    /// Snapshot of the run counters.
    pub fn stats(&self) -> PoolStats {
        let state = self.locked();
        PoolStats {
            launched: state.launched,
            skipped: state.skipped,
            errors: state.errors,
            completed: state.completed,
            peak_in_flight: state.peak_in_flight,
        }
    }
}
