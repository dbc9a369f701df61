use crate::error::AppError;
use crate::model::{Task, TaskStatus, canonical_token};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(TaskStatus),
}

impl StatusFilter {
    pub fn parse(raw: &str) -> Option<Self> {
        if canonical_token(raw)?.as_str() == "all" {
            return Some(Self::All);
        }
        TaskStatus::parse(raw).map(Self::Only)
    }

    fn keeps(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Only(status) => task.status == status,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Priority,
    Duration,
    Created,
}

impl SortKey {
    /// Unknown keys parse to None; `apply` then leaves the snapshot order
    /// untouched.
    pub fn parse(raw: &str) -> Option<Self> {
        match canonical_token(raw)?.as_str() {
            "priority" => Some(Self::Priority),
            "duration" => Some(Self::Duration),
            "created" | "created_at" => Some(Self::Created),
            _ => None,
        }
    }
}

/// Search, then filter, then a stable sort: priority ascending (High first),
/// duration descending (longest running first), created descending (newest
/// first). Tasks with equal keys keep their snapshot order.
pub fn apply(
    tasks: &[Task],
    search_term: &str,
    filter: StatusFilter,
    sort: Option<SortKey>,
) -> Result<Vec<Task>, AppError> {
    let needle = search_term.to_lowercase();
    let mut filtered: Vec<Task> = tasks
        .iter()
        .filter(|task| search_term.is_empty() || matches_search(task, &needle))
        .filter(|task| filter.keeps(task))
        .cloned()
        .collect();

    match sort {
        None => {}
        Some(SortKey::Priority) => filtered.sort_by_key(|task| task.priority.rank()),
        Some(SortKey::Duration) => filtered.sort_by(|a, b| b.duration.cmp(&a.duration)),
        Some(SortKey::Created) => {
            let mut keyed = Vec::with_capacity(filtered.len());
            for task in filtered {
                let created = OffsetDateTime::parse(&task.created_at, &Rfc3339)
                    .map_err(|_| AppError::invalid_data("created_at must be RFC3339"))?;
                keyed.push((created.unix_timestamp_nanos(), task));
            }
            keyed.sort_by(|a, b| b.0.cmp(&a.0));
            filtered = keyed.into_iter().map(|(_, task)| task).collect();
        }
    }

    Ok(filtered)
}

fn matches_search(task: &Task, needle: &str) -> bool {
    task.title.to_lowercase().contains(needle)
        || task.description.to_lowercase().contains(needle)
        || task.tags.iter().any(|tag| tag.to_lowercase().contains(needle))
}

#[cfg(test)]
mod tests {
    use super::{SortKey, StatusFilter, apply};
    use crate::model::{Priority, Task, TaskStatus};

    fn task(id: u64, title: &str, priority: Priority, status: TaskStatus) -> Task {
        Task {
            id,
            title: title.to_string(),
            description: String::new(),
            priority,
            status,
            duration: 0,
            created_at: "2026-08-06T08:00:00Z".to_string(),
            assignee: "Unassigned".to_string(),
            tags: Vec::new(),
            progress: 0.0,
        }
    }

    #[test]
    fn search_matches_title_description_and_tags_case_insensitively() {
        let mut with_description = task(2, "other", Priority::Medium, TaskStatus::Pending);
        with_description.description = "Refactor the AUTH layer".to_string();
        let mut with_tag = task(3, "misc", Priority::Medium, TaskStatus::Pending);
        with_tag.tags = vec!["auth".to_string()];
        let tasks = vec![
            task(1, "Auth rework", Priority::High, TaskStatus::Pending),
            with_description,
            with_tag,
            task(4, "unrelated", Priority::Low, TaskStatus::Pending),
        ];

        let result = apply(&tasks, "auth", StatusFilter::All, None).unwrap();

        let ids: Vec<_> = result.iter().map(|task| task.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn empty_search_keeps_every_task() {
        let tasks = vec![
            task(1, "a", Priority::High, TaskStatus::Pending),
            task(2, "b", Priority::Low, TaskStatus::Completed),
        ];

        let result = apply(&tasks, "", StatusFilter::All, None).unwrap();
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn status_filter_keeps_only_matching_tasks() {
        let tasks = vec![
            task(1, "a", Priority::High, TaskStatus::Pending),
            task(2, "b", Priority::Low, TaskStatus::InProgress),
            task(3, "c", Priority::Low, TaskStatus::InProgress),
        ];

        let result = apply(
            &tasks,
            "",
            StatusFilter::Only(TaskStatus::InProgress),
            None,
        )
        .unwrap();

        let ids: Vec<_> = result.iter().map(|task| task.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn sort_by_priority_puts_high_first_and_is_stable() {
        let tasks = vec![
            task(1, "low-a", Priority::Low, TaskStatus::Pending),
            task(2, "med-a", Priority::Medium, TaskStatus::Pending),
            task(3, "high", Priority::High, TaskStatus::Pending),
            task(4, "med-b", Priority::Medium, TaskStatus::Pending),
        ];

        let result = apply(&tasks, "", StatusFilter::All, Some(SortKey::Priority)).unwrap();

        let ids: Vec<_> = result.iter().map(|task| task.id).collect();
        // Equal-priority tasks keep their snapshot order (2 before 4).
        assert_eq!(ids, vec![3, 2, 4, 1]);
    }

    #[test]
    fn sort_by_duration_puts_longest_running_first() {
        let mut short = task(1, "short", Priority::Medium, TaskStatus::InProgress);
        short.duration = 5;
        let mut long = task(2, "long", Priority::Medium, TaskStatus::InProgress);
        long.duration = 50;
        let tasks = vec![short, long];

        let result = apply(&tasks, "", StatusFilter::All, Some(SortKey::Duration)).unwrap();

        let ids: Vec<_> = result.iter().map(|task| task.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn sort_by_created_puts_newest_first() {
        let mut older = task(1, "older", Priority::Medium, TaskStatus::Pending);
        older.created_at = "2026-08-04T08:00:00Z".to_string();
        let mut newer = task(2, "newer", Priority::Medium, TaskStatus::Pending);
        newer.created_at = "2026-08-06T08:00:00Z".to_string();
        let tasks = vec![older, newer];

        let result = apply(&tasks, "", StatusFilter::All, Some(SortKey::Created)).unwrap();

        let ids: Vec<_> = result.iter().map(|task| task.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn sort_by_created_rejects_malformed_timestamp() {
        let mut bad = task(1, "bad", Priority::Medium, TaskStatus::Pending);
        bad.created_at = "not-a-date".to_string();

        let err = apply(&[bad], "", StatusFilter::All, Some(SortKey::Created)).unwrap_err();
        assert_eq!(err.code(), "invalid_data");
    }

    #[test]
    fn missing_sort_key_preserves_snapshot_order() {
        let tasks = vec![
            task(1, "b", Priority::Low, TaskStatus::Pending),
            task(2, "a", Priority::High, TaskStatus::Pending),
        ];

        assert_eq!(SortKey::parse("alphabetical"), None);
        let result = apply(&tasks, "", StatusFilter::All, SortKey::parse("alphabetical")).unwrap();

        let ids: Vec<_> = result.iter().map(|task| task.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn apply_is_idempotent_for_a_fixed_query() {
        let tasks = vec![
            task(1, "med-a", Priority::Medium, TaskStatus::Pending),
            task(2, "high", Priority::High, TaskStatus::Pending),
            task(3, "med-b", Priority::Medium, TaskStatus::Pending),
            task(4, "low", Priority::Low, TaskStatus::Pending),
        ];

        let once = apply(&tasks, "", StatusFilter::All, Some(SortKey::Priority)).unwrap();
        let twice = apply(&once, "", StatusFilter::All, Some(SortKey::Priority)).unwrap();

        assert_eq!(once, twice);
    }

    #[test]
    fn status_filter_parse_accepts_variants() {
        assert_eq!(StatusFilter::parse("all"), Some(StatusFilter::All));
        assert_eq!(
            StatusFilter::parse("in-progress"),
            Some(StatusFilter::Only(TaskStatus::InProgress))
        );
        assert_eq!(
            StatusFilter::parse("Completed"),
            Some(StatusFilter::Only(TaskStatus::Completed))
        );
        assert_eq!(StatusFilter::parse("archived"), None);
    }

    #[test]
    fn sort_key_parse_accepts_known_keys() {
        assert_eq!(SortKey::parse("priority"), Some(SortKey::Priority));
        assert_eq!(SortKey::parse("Duration"), Some(SortKey::Duration));
        assert_eq!(SortKey::parse("created_at"), Some(SortKey::Created));
        assert_eq!(SortKey::parse(""), None);
    }
}
