//! Task Scheduling in Simulated Time
//!
//! Cooperative timers: callers schedule payloads at a point in simulated
//! time and drain whatever is due each frame. Tasks fire in `(time, order
//! scheduled)` order, so two runs with the same inputs interleave the same
//! way. Cancelled tasks never fire.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Handle to a scheduled task
    pub struct TaskId;
}

/// A task that has come due
#[derive(Debug, Clone, PartialEq)]
pub struct Due<T> {
    /// Handle the task was scheduled under
    pub id: TaskId,
    /// Time the task was due at
    pub at: f64,
    /// Caller data
    pub payload: T,
}

#[derive(Debug)]
struct Pending<T> {
    at: f64,
    payload: T,
}

/// Heap entry; the payload lives in the slot map so cancellation is O(1)
#[derive(Debug, Clone, Copy)]
struct QueueEntry {
    at: f64,
    sequence: u64,
    id: TaskId,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.at
            .total_cmp(&other.at)
            .then(self.sequence.cmp(&other.sequence))
    }
}

/// Timer queue over simulated time
#[derive(Debug)]
pub struct Scheduler<T> {
    now: f64,
    tasks: SlotMap<TaskId, Pending<T>>,
    queue: BinaryHeap<Reverse<QueueEntry>>,
    sequence: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    /// Create an empty scheduler at time zero
    pub fn new() -> Self {
        Self {
            now: 0.0,
            tasks: SlotMap::with_key(),
            queue: BinaryHeap::new(),
            sequence: 0,
        }
    }

    /// Time of the most recently fired task, or of the last [`Self::settle`]
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Number of tasks waiting to fire
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Whether a task is still waiting to fire
    pub fn is_pending(&self, id: TaskId) -> bool {
        self.tasks.contains_key(id)
    }

    /// Due time of a pending task
    pub fn due_at(&self, id: TaskId) -> Option<f64> {
        self.tasks.get(id).map(|task| task.at)
    }

    /// Schedule a payload at an absolute time
    ///
    /// Times in the past fire on the next drain.
    pub fn schedule_at(&mut self, at: f64, payload: T) -> TaskId {
        let id = self.tasks.insert(Pending { at, payload });
        self.queue.push(Reverse(QueueEntry {
            at,
            sequence: self.sequence,
            id,
        }));
        self.sequence += 1;
        id
    }

    /// Schedule a payload `delay` seconds after [`Self::now`]
    pub fn schedule_in(&mut self, delay: f64, payload: T) -> TaskId {
        self.schedule_at(self.now + delay.max(0.0), payload)
    }

    /// Cancel a pending task, returning its payload
    pub fn cancel(&mut self, id: TaskId) -> Option<T> {
        // The heap entry stays behind and is skipped when it surfaces
        self.tasks.remove(id).map(|task| task.payload)
    }

    /// Cancel every pending task
    pub fn cancel_all(&mut self) -> usize {
        let count = self.tasks.len();
        self.tasks.clear();
        self.queue.clear();
        count
    }

    /// Pop the earliest task due at or before `until`
    ///
    /// Advances [`Self::now`] to the task's due time, so tasks scheduled
    /// from inside a handler with [`Self::schedule_in`] are relative to the
    /// moment the handler fired.
    pub fn pop_due(&mut self, until: f64) -> Option<Due<T>> {
        while let Some(Reverse(entry)) = self.queue.peek().copied() {
            if entry.at > until {
                return None;
            }
            self.queue.pop();
            if let Some(task) = self.tasks.remove(entry.id) {
                self.now = self.now.max(task.at);
                return Some(Due {
                    id: entry.id,
                    at: task.at,
                    payload: task.payload,
                });
            }
        }
        None
    }

    /// Move [`Self::now`] forward once everything due has been drained
    pub fn settle(&mut self, until: f64) {
        self.now = self.now.max(until);
    }

    /// Drain every task due at or before `until` and settle at `until`
    ///
    /// Handlers that schedule follow-up tasks should loop over
    /// [`Self::pop_due`] instead, so follow-ups due before `until` fire too.
    pub fn drain_due(&mut self, until: f64) -> Vec<Due<T>> {
        let mut due = Vec::new();
        while let Some(task) = self.pop_due(until) {
            due.push(task);
        }
        self.settle(until);
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fires_in_time_then_schedule_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_at(2.0, "late");
        scheduler.schedule_at(1.0, "first");
        scheduler.schedule_at(1.0, "second");

        let fired: Vec<_> = scheduler.drain_due(5.0).into_iter().map(|d| d.payload).collect();
        assert_eq!(fired, vec!["first", "second", "late"]);
        assert_relative_eq!(scheduler.now(), 5.0);
    }

    #[test]
    fn test_nothing_fires_early() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_at(3.0, ());
        assert!(scheduler.pop_due(2.999).is_none());
        assert_eq!(scheduler.pending(), 1);
        assert!(scheduler.pop_due(3.0).is_some());
    }

    #[test]
    fn test_cancelled_task_never_fires() {
        let mut scheduler = Scheduler::new();
        let keep = scheduler.schedule_at(1.0, 1);
        let drop = scheduler.schedule_at(1.0, 2);

        assert_eq!(scheduler.cancel(drop), Some(2));
        assert_eq!(scheduler.cancel(drop), None);
        assert!(scheduler.is_pending(keep));

        let fired = scheduler.drain_due(10.0);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].id, keep);
    }

    #[test]
    fn test_rescheduling_from_handler_is_relative_to_fire_time() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_in(1.5, 0_u32);

        let mut fired = Vec::new();
        while let Some(due) = scheduler.pop_due(10.0) {
            fired.push(due.at);
            if due.payload < 3 {
                scheduler.schedule_in(2.0, due.payload + 1);
            }
        }
        assert_eq!(fired, vec![1.5, 3.5, 5.5, 7.5]);
    }

    #[test]
    fn test_cancel_all() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_at(1.0, ());
        scheduler.schedule_at(2.0, ());
        assert_eq!(scheduler.cancel_all(), 2);
        assert!(scheduler.drain_due(100.0).is_empty());
    }
}
