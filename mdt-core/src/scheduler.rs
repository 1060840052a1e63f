//! Delayed Task Queue
//!
//! Transient effects (hit flashes, banner auto-hide, lookup timeouts) are
//! queued here against a caller-supplied millisecond clock. Nothing reads a
//! wall clock, so tests drive time by passing timestamps to [`Scheduler::due`].
//!
//! Tasks are independent: scheduling a second task of the same kind does
//! not cancel or postpone the first.

use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    next_id: u64,
    /// Ordered by due time, then by scheduling order
    queue: BTreeMap<(u64, TaskId), T>,
    due_at: HashMap<TaskId, u64>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Scheduler {
            next_id: 1,
            queue: BTreeMap::new(),
            due_at: HashMap::new(),
        }
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Scheduler::default()
    }

    pub fn schedule(&mut self, now: u64, delay_ms: u64, task: T) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;

        let at = now.saturating_add(delay_ms);
        self.queue.insert((at, id), task);
        self.due_at.insert(id, at);
        id
    }

    /// Returns false if the task already ran or was cancelled
    pub fn cancel(&mut self, id: TaskId) -> bool {
        match self.due_at.remove(&id) {
            Some(at) => self.queue.remove(&(at, id)).is_some(),
            None => false,
        }
    }

    /// Remove and return every task due at or before `now`, oldest first
    pub fn due(&mut self, now: u64) -> Vec<(TaskId, T)> {
        let mut fired = Vec::new();
        while let Some(entry) = self.queue.first_entry() {
            let (at, id) = *entry.key();
            if at > now {
                break;
            }
            let task = entry.remove();
            self.due_at.remove(&id);
            fired.push((id, task));
        }
        fired
    }

    pub fn next_due(&self) -> Option<u64> {
        self.queue.keys().next().map(|(at, _)| *at)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drop every task matching `predicate`
    pub fn cancel_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let doomed: Vec<(u64, TaskId)> = self
            .queue
            .iter()
            .filter(|(_, task)| predicate(task))
            .map(|(k, _)| *k)
            .collect();
        for key in &doomed {
            self.queue.remove(key);
            self.due_at.remove(&key.1);
        }
        doomed.len()
    }
}
