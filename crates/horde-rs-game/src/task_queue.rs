//! Deadline-ordered task queue driven by the game tick counter.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashSet};

/// Game ticks per simulated second (one tick every 50 ms).
pub const TICKS_PER_SECOND: u64 = 20;

/// Wall time covered by one tick.
pub const TICK_MILLIS: u64 = 1000 / TICKS_PER_SECOND;

/// Handle to a scheduled task, used for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u64);

/// A task scheduled for a future game tick.
#[derive(Debug, Clone)]
pub struct ScheduledTask<T> {
    pub id: TaskId,
    pub target_tick: u64,
    pub task: T,
}

// Ordered by deadline, then by scheduling order.
impl<T> Ord for ScheduledTask<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.target_tick
            .cmp(&other.target_tick)
            .then(self.id.cmp(&other.id))
    }
}

impl<T> PartialOrd for ScheduledTask<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> PartialEq for ScheduledTask<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for ScheduledTask<T> {}

/// Min-heap of tasks keyed by target tick. Cancelled tasks stay in the heap
/// until their deadline and are dropped on drain.
pub struct TaskQueue<T> {
    queue: BinaryHeap<Reverse<ScheduledTask<T>>>,
    pending: HashSet<TaskId>,
    next_id: u64,
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TaskQueue<T> {
    pub fn new() -> Self {
        Self {
            queue: BinaryHeap::new(),
            pending: HashSet::new(),
            next_id: 0,
        }
    }

    /// Schedule `task` to fire `delay` ticks after `current_tick`.
    pub fn schedule(&mut self, delay: u64, current_tick: u64, task: T) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.pending.insert(id);
        self.queue.push(Reverse(ScheduledTask {
            id,
            target_tick: current_tick.saturating_add(delay),
            task,
        }));
        id
    }

    /// Cancel a pending task. Returns `false` if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        self.pending.remove(&id)
    }

    /// Pop every live task whose target tick is `<= current_tick`, in deadline order.
    pub fn drain_ready(&mut self, current_tick: u64) -> Vec<ScheduledTask<T>> {
        let mut ready = Vec::new();
        while let Some(Reverse(next)) = self.queue.peek() {
            if next.target_tick > current_tick {
                break;
            }
            let Some(Reverse(task)) = self.queue.pop() else {
                break;
            };
            if self.pending.remove(&task.id) {
                ready.push(task);
            }
        }
        ready
    }

    pub fn is_scheduled(&self, id: TaskId) -> bool {
        self.pending.contains(&id)
    }

    /// Number of live (not cancelled) tasks.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Cancel everything.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.pending.clear();
    }
}
