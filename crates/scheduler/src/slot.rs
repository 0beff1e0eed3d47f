use std::path::PathBuf;
use chrono::{DateTime, Utc};
use crate::job::JobId;

/// State of one worker slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// No job assigned.
    Free,
    /// A job's stage chain is running.
    Occupied(JobId),
    /// The job finished but the dispatcher has not drained the slot yet.
    Exited,
}

/// One unit of worker-pool capacity: the identity of the job occupying it
/// and the output file that job is producing.
#[derive(Debug, Clone)]
pub struct WorkerSlot {
    pub state: SlotState,
    pub output: PathBuf,
    pub started: Option<DateTime<Utc>>,
}

/// Record handed back by [`SlotTable::drain`] for each finished slot.
#[derive(Debug, Clone)]
pub struct FinishedJob {
    pub output: PathBuf,
    pub started: Option<DateTime<Utc>>,
}

/// Fixed-capacity table of worker slots, sized once at start-up and never
/// resized. All lookups are linear scans over the small, constant capacity.
///
/// Invariant: at most one slot holds a given job identity, and the number
/// of occupied slots never exceeds the capacity.
#[derive(Debug)]
pub struct SlotTable {
    slots: Vec<WorkerSlot>,
}

impl SlotTable {
    pub fn new(capacity: usize) -> Self {
        let slots = vec![
            WorkerSlot {
                state: SlotState::Free,
                output: PathBuf::new(),
                started: None,
            };
            capacity
        ];
        SlotTable { slots }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots currently running a job.
    pub fn occupied(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| matches!(s.state, SlotState::Occupied(_)))
            .count()
    }

    pub fn has_free(&self) -> bool {
        self.slots.iter().any(|s| s.state == SlotState::Free)
    }

    /// Mark the first free slot as running `job`. Returns the slot index,
    /// or None when every slot is taken.
    pub fn acquire(&mut self, job: JobId, output: PathBuf) -> Option<usize> {
        let idx = self.slots.iter().position(|s| s.state == SlotState::Free)?;
        let slot = &mut self.slots[idx];
        slot.state = SlotState::Occupied(job);
        slot.output = output;
        slot.started = Some(Utc::now());
        Some(idx)
    }

    /// Mark the slot running `job` as exited. Called once per distinct
    /// finished job, including bursts that land before the next drain.
    /// Unknown identities are ignored.
    pub fn reclaim(&mut self, job: JobId) -> bool {
        for slot in &mut self.slots {
            if slot.state == SlotState::Occupied(job) {
                slot.state = SlotState::Exited;
                return true;
            }
        }
        false
    }

    /// Release every exited slot, returning their records in table order
    /// (not completion order).
    pub fn drain(&mut self) -> Vec<FinishedJob> {
        let mut finished = Vec::new();
        for slot in &mut self.slots {
            if slot.state == SlotState::Exited {
                finished.push(FinishedJob {
                    output: std::mem::take(&mut slot.output),
                    started: slot.started.take(),
                });
                slot.state = SlotState::Free;
            }
        }
        finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn table_with_jobs(capacity: usize, jobs: &[JobId]) -> SlotTable {
        let mut table = SlotTable::new(capacity);
        for (i, id) in jobs.iter().enumerate() {
            let idx = table.acquire(*id, PathBuf::from(format!("out_{i}.webm")));
            assert_eq!(idx, Some(i));
        }
        table
    }

    #[test]
    fn acquire_fills_slots_in_table_order_up_to_capacity() {
        let jobs: Vec<JobId> = (0..3).map(|_| Uuid::new_v4()).collect();
        let mut table = table_with_jobs(3, &jobs);
        assert_eq!(table.occupied(), 3);
        assert!(!table.has_free());
        assert_eq!(table.acquire(Uuid::new_v4(), PathBuf::from("extra")), None);
    }

    #[test]
    fn burst_of_completions_reclaims_each_slot_once() {
        let jobs: Vec<JobId> = (0..4).map(|_| Uuid::new_v4()).collect();
        let mut table = table_with_jobs(4, &jobs);
        for id in &jobs {
            assert!(table.reclaim(*id));
        }
        assert_eq!(table.occupied(), 0);

        let finished = table.drain();
        assert_eq!(finished.len(), 4);
        assert_eq!(finished[0].output, PathBuf::from("out_0.webm"));
        assert_eq!(finished[3].output, PathBuf::from("out_3.webm"));
        assert!(table.has_free());
        assert!(table.drain().is_empty());
    }

    #[test]
    fn reclaim_ignores_unknown_jobs() {
        let mut table = SlotTable::new(2);
        assert!(!table.reclaim(Uuid::new_v4()));
    }

    #[test]
    fn drain_returns_table_order_even_for_reversed_completions() {
        let jobs: Vec<JobId> = (0..3).map(|_| Uuid::new_v4()).collect();
        let mut table = table_with_jobs(3, &jobs);
        for id in jobs.iter().rev() {
            assert!(table.reclaim(*id));
        }
        let finished = table.drain();
        assert_eq!(finished[0].output, PathBuf::from("out_0.webm"));
        assert_eq!(finished[2].output, PathBuf::from("out_2.webm"));
    }

    #[test]
    fn slots_are_reusable_after_drain() {
        let job = Uuid::new_v4();
        let mut table = SlotTable::new(1);
        assert_eq!(table.acquire(job, PathBuf::from("a.webm")), Some(0));
        assert!(table.reclaim(job));
        assert_eq!(table.drain().len(), 1);
        assert_eq!(table.acquire(Uuid::new_v4(), PathBuf::from("b.webm")), Some(0));
    }
}
