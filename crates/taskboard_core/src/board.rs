use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::AppError;
use crate::model::{Task, TaskStatus};
use crate::stats::{self, Statistics, TrendPoint};
use crate::store::{NewTask, TaskStore};
use crate::view::{self, SortKey, StatusFilter};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use time::UtcOffset;
use time::format_description::well_known::Rfc3339;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Emitted after every mutation and every tick so the presentation layer
/// knows to refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardEvent {
    TaskAdded(u64),
    TaskRemoved(u64),
    StatusChanged(u64),
    Tick,
}

/// The engine boundary handed to callers. Mutations and the tick pass
/// serialize on the store lock; reads copy a snapshot out and compute
/// outside it.
#[derive(Clone)]
pub struct TaskBoard {
    state: Arc<Mutex<TaskStore>>,
    clock: Arc<dyn Clock>,
    config: Config,
    events: broadcast::Sender<BoardEvent>,
}

impl TaskBoard {
    pub fn new(config: Config) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: Config, clock: Arc<dyn Clock>) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            state: Arc::new(Mutex::new(TaskStore::new())),
            clock,
            config,
            events,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.config.tick_seconds)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BoardEvent> {
        self.events.subscribe()
    }

    pub fn add_task(&self, input: NewTask) -> Result<Task, AppError> {
        let created_at = self
            .clock
            .now()
            .format(&Rfc3339)
            .map_err(|err| AppError::invalid_data(err.to_string()))?;

        let task = self.state.lock().add(input, &created_at)?;
        info!(task_id = task.id, title = %task.title, "task added");
        self.publish(BoardEvent::TaskAdded(task.id));

        Ok(task)
    }

    pub fn delete_task(&self, id: u64) -> Result<Task, AppError> {
        let removed = self.state.lock().remove(id)?;
        info!(task_id = id, "task deleted");
        self.publish(BoardEvent::TaskRemoved(id));

        Ok(removed)
    }

    pub fn set_task_status(&self, id: u64, status: TaskStatus) -> Result<Task, AppError> {
        let updated = self.state.lock().set_status(id, status)?;
        info!(task_id = id, status = ?status, "task status changed");
        self.publish(BoardEvent::StatusChanged(id));

        Ok(updated)
    }

    pub fn snapshot(&self) -> Vec<Task> {
        self.state.lock().snapshot()
    }

    pub fn most_urgent(&self) -> Option<Task> {
        self.state.lock().most_urgent().cloned()
    }

    pub fn statistics(&self) -> Statistics {
        let snapshot = self.snapshot();
        stats::compute_statistics(&snapshot)
    }

    pub fn trend(&self, window_days: u32) -> Result<Vec<TrendPoint>, AppError> {
        let snapshot = self.snapshot();
        let reference = self.clock.now().to_offset(UtcOffset::UTC).date();
        stats::compute_trend(&snapshot, window_days, reference)
    }

    pub fn filtered_sorted(
        &self,
        search_term: &str,
        filter: StatusFilter,
        sort: Option<SortKey>,
    ) -> Result<Vec<Task>, AppError> {
        let snapshot = self.snapshot();
        view::apply(&snapshot, search_term, filter, sort)
    }

    /// One tick pass. The store lock is held for the whole pass, so a pass
    /// and a mutation never interleave. Returns the ids completed by
    /// saturation.
    pub fn run_tick(&self) -> Vec<u64> {
        let completed = self
            .state
            .lock()
            .advance_in_progress(self.config.tick_seconds, self.config.progress_per_tick);

        debug!(completed = completed.len(), "tick pass");
        self.publish(BoardEvent::Tick);

        completed
    }

    fn publish(&self, event: BoardEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
