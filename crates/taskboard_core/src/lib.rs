pub mod board;
pub mod clock;
pub mod config;
pub mod error;
pub mod model;
pub mod queue;
pub mod stats;
pub mod store;
pub mod tick;
pub mod view;

#[cfg(test)]
mod tests {
    use crate::error::AppError;
    use crate::model::{Priority, Task, TaskStatus};

    #[test]
    fn task_has_required_fields() {
        let task = Task {
            id: 1,
            title: "demo".to_string(),
            description: "demo description".to_string(),
            priority: Priority::Medium,
            status: TaskStatus::Pending,
            duration: 0,
            created_at: "2026-08-06T00:00:00Z".to_string(),
            assignee: "Unassigned".to_string(),
            tags: Vec::new(),
            progress: 0.0,
        };

        assert_eq!(task.id, 1);
        assert_eq!(task.title, "demo");
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.duration, 0);
        assert_eq!(task.progress, 0.0);
        assert!(task.tags.is_empty());
    }

    #[test]
    fn app_error_exposes_code() {
        let err = AppError::invalid_input("missing title");
        assert_eq!(err.code(), "invalid_input");

        let err = AppError::not_found("task not found");
        assert_eq!(err.code(), "not_found");
    }
}
