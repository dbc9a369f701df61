use crate::error::AppError;
use crate::model::{Priority, Task, TaskStatus, UNASSIGNED};
use crate::queue::{PriorityQueue, QueueEntry};

const MAX_PROGRESS: f64 = 100.0;
// Accumulated f64 steps (e.g. 1000 * 0.1) land a hair under the limit, so
// saturation tolerates that error and snaps progress to exactly 100.
const SATURATION_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub assignee: Option<String>,
    pub tags: Vec<String>,
}

/// The single owner of task state. Tasks keep insertion order; the queue
/// mirrors the live id set at all times (inserted on add, removed on delete).
#[derive(Debug)]
pub struct TaskStore {
    tasks: Vec<Task>,
    queue: PriorityQueue,
    next_id: u64,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            queue: PriorityQueue::new(),
            next_id: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn queue(&self) -> &PriorityQueue {
        &self.queue
    }

    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn snapshot(&self) -> Vec<Task> {
        self.tasks.clone()
    }

    pub fn add(&mut self, input: NewTask, created_at: &str) -> Result<Task, AppError> {
        let title = input.title.trim();
        if title.is_empty() {
            return Err(AppError::invalid_input("title is required"));
        }

        let assignee = match input.assignee.as_deref().map(str::trim) {
            Some(value) if !value.is_empty() => value.to_string(),
            _ => UNASSIGNED.to_string(),
        };

        let mut tags: Vec<String> = Vec::new();
        for tag in &input.tags {
            let tag = tag.trim();
            if !tag.is_empty() && !tags.iter().any(|existing| existing == tag) {
                tags.push(tag.to_string());
            }
        }

        let id = self.next_id;
        self.next_id += 1;

        let task = Task {
            id,
            title: title.to_string(),
            description: input.description.trim().to_string(),
            priority: input.priority,
            status: TaskStatus::Pending,
            duration: 0,
            created_at: created_at.to_string(),
            assignee,
            tags,
            progress: 0.0,
        };

        self.tasks.push(task.clone());
        self.queue.insert(QueueEntry {
            task_id: id,
            rank: task.priority.rank(),
        });

        Ok(task)
    }

    pub fn remove(&mut self, id: u64) -> Result<Task, AppError> {
        let index = self
            .tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or_else(|| AppError::not_found("task not found"))?;

        let removed = self.tasks.remove(index);
        self.queue.remove(id);

        Ok(removed)
    }

    pub fn set_status(&mut self, id: u64, status: TaskStatus) -> Result<Task, AppError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or_else(|| AppError::not_found("task not found"))?;

        task.status = status;
        if status == TaskStatus::Completed {
            task.progress = MAX_PROGRESS;
        }

        Ok(task.clone())
    }

    /// The task the queue would pop next; the queue itself is left intact so
    /// it keeps mirroring the store.
    pub fn most_urgent(&self) -> Option<&Task> {
        let entry = self.queue.peek_min()?;
        self.get(entry.task_id)
    }

    /// One tick pass: advance every in-progress task by `seconds` of duration
    /// and `increment` points of progress. A task that saturates flips to
    /// Completed in this same pass. Returns the ids that completed.
    pub fn advance_in_progress(&mut self, seconds: u64, increment: f64) -> Vec<u64> {
        let mut completed = Vec::new();

        for task in &mut self.tasks {
            if task.status != TaskStatus::InProgress {
                continue;
            }

            task.duration += seconds;
            let next = task.progress + increment;
            if next + SATURATION_TOLERANCE >= MAX_PROGRESS {
                task.progress = MAX_PROGRESS;
                task.status = TaskStatus::Completed;
                completed.push(task.id);
            } else {
                task.progress = next;
            }
        }

        completed
    }
}
