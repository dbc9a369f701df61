use std::cmp::Ordering;
use std::collections::HashMap;

/// Ordering hook for heap entries. Kept as a plain function pointer so an
/// alternate ordering (e.g. FIFO tie-breaks) can be injected in tests.
pub type Comparator = fn(&QueueEntry, &QueueEntry) -> Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueEntry {
    pub task_id: u64,
    pub rank: u8,
}

pub fn rank_order(a: &QueueEntry, b: &QueueEntry) -> Ordering {
    a.rank.cmp(&b.rank)
}

/// Array-backed binary min-heap over task references.
///
/// Deletions from the store remove the matching entry eagerly through an
/// id-to-position index, so the heap never holds a stale reference and pops
/// need no revalidation against the store.
#[derive(Debug)]
pub struct PriorityQueue {
    heap: Vec<QueueEntry>,
    positions: HashMap<u64, usize>,
    compare: Comparator,
}

impl Default for PriorityQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl PriorityQueue {
    pub fn new() -> Self {
        Self::with_comparator(rank_order)
    }

    pub fn with_comparator(compare: Comparator) -> Self {
        Self {
            heap: Vec::new(),
            positions: HashMap::new(),
            compare,
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn contains(&self, task_id: u64) -> bool {
        self.positions.contains_key(&task_id)
    }

    /// Returns false and leaves the heap untouched if the id is already
    /// queued; the queue holds at most one entry per task.
    pub fn insert(&mut self, entry: QueueEntry) -> bool {
        if self.positions.contains_key(&entry.task_id) {
            return false;
        }

        self.heap.push(entry);
        let index = self.heap.len() - 1;
        self.positions.insert(entry.task_id, index);
        self.sift_up(index);
        true
    }

    pub fn peek_min(&self) -> Option<QueueEntry> {
        self.heap.first().copied()
    }

    pub fn extract_min(&mut self) -> Option<QueueEntry> {
        if self.heap.is_empty() {
            return None;
        }

        let last = self.heap.len() - 1;
        self.swap_entries(0, last);
        let min = self.heap.pop()?;
        self.positions.remove(&min.task_id);
        if !self.heap.is_empty() {
            self.sift_down(0);
        }

        Some(min)
    }

    pub fn remove(&mut self, task_id: u64) -> bool {
        let index = match self.positions.get(&task_id) {
            Some(&index) => index,
            None => return false,
        };

        let last = self.heap.len() - 1;
        self.swap_entries(index, last);
        self.heap.pop();
        self.positions.remove(&task_id);

        if index < self.heap.len() {
            // The displaced entry may be out of order in either direction.
            let index = self.sift_up(index);
            self.sift_down(index);
        }

        true
    }

    fn sift_up(&mut self, mut index: usize) -> usize {
        while index > 0 {
            let parent = (index - 1) / 2;
            if (self.compare)(&self.heap[index], &self.heap[parent]) != Ordering::Less {
                break;
            }
            self.swap_entries(index, parent);
            index = parent;
        }

        index
    }

    fn sift_down(&mut self, mut index: usize) {
        loop {
            let left = 2 * index + 1;
            let right = 2 * index + 2;
            let mut smallest = index;

            if left < self.heap.len()
                && (self.compare)(&self.heap[left], &self.heap[smallest]) == Ordering::Less
            {
                smallest = left;
            }
            if right < self.heap.len()
                && (self.compare)(&self.heap[right], &self.heap[smallest]) == Ordering::Less
            {
                smallest = right;
            }

            if smallest == index {
                break;
            }
            self.swap_entries(index, smallest);
            index = smallest;
        }
    }

    fn swap_entries(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.heap.swap(a, b);
        self.positions.insert(self.heap[a].task_id, a);
        self.positions.insert(self.heap[b].task_id, b);
    }
}
