use crate::error::AppError;
use crate::model::{Priority, Task, TaskStatus};
use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime, UtcOffset};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub total: usize,
    pub completed: usize,
    pub high_priority: usize,
    pub in_progress: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub date: String,
    pub created: usize,
    pub completed: usize,
}

pub fn compute_statistics(tasks: &[Task]) -> Statistics {
    Statistics {
        total: tasks.len(),
        completed: tasks
            .iter()
            .filter(|task| task.status == TaskStatus::Completed)
            .count(),
        high_priority: tasks
            .iter()
            .filter(|task| task.priority == Priority::High)
            .count(),
        in_progress: tasks
            .iter()
            .filter(|task| task.status == TaskStatus::InProgress)
            .count(),
    }
}

/// One bucket per UTC calendar day, `window_days` long, ending at `reference`
/// (inclusive), oldest first. Both series count tasks by their creation date;
/// a task completed on a later day still lands in its creation-day bucket.
pub fn compute_trend(
    tasks: &[Task],
    window_days: u32,
    reference: Date,
) -> Result<Vec<TrendPoint>, AppError> {
    let mut creation_days = Vec::with_capacity(tasks.len());
    for task in tasks {
        creation_days.push((
            creation_date_utc(task)?,
            task.status == TaskStatus::Completed,
        ));
    }

    let mut points = Vec::with_capacity(window_days as usize);
    for offset in (0..window_days).rev() {
        let bucket = reference - Duration::days(i64::from(offset));
        let created = creation_days
            .iter()
            .filter(|(day, _)| *day == bucket)
            .count();
        let completed = creation_days
            .iter()
            .filter(|(day, done)| *day == bucket && *done)
            .count();

        points.push(TrendPoint {
            date: format_bucket_date(bucket)?,
            created,
            completed,
        });
    }

    Ok(points)
}

fn creation_date_utc(task: &Task) -> Result<Date, AppError> {
    let created = OffsetDateTime::parse(&task.created_at, &Rfc3339)
        .map_err(|_| AppError::invalid_data("created_at must be RFC3339"))?;
    Ok(created.to_offset(UtcOffset::UTC).date())
}

fn format_bucket_date(date: Date) -> Result<String, AppError> {
    let format = format_description!("[year]-[month]-[day]");
    date.format(&format)
        .map_err(|err| AppError::invalid_data(err.to_string()))
}
