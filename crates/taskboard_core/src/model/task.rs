use serde::{Deserialize, Serialize};

pub const UNASSIGNED: &str = "Unassigned";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Numeric scheduling key: smaller sorts first, so High pops before Low.
    pub fn rank(self) -> u8 {
        match self {
            Self::High => 1,
            Self::Medium => 2,
            Self::Low => 3,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match canonical_token(raw)?.as_str() {
            "high" | "1" => Some(Self::High),
            "medium" | "2" => Some(Self::Medium),
            "low" | "3" => Some(Self::Low),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match canonical_token(raw)?.as_str() {
            "pending" => Some(Self::Pending),
            "in_progress" | "inprogress" => Some(Self::InProgress),
            "completed" | "done" => Some(Self::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub priority: Priority,
    pub status: TaskStatus,
    pub duration: u64,
    pub created_at: String,
    pub assignee: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub progress: f64,
}

/// Lowercase a raw token and collapse separator runs to single underscores,
/// so "In Progress", "in-progress" and "IN_PROGRESS" all parse alike.
pub(crate) fn canonical_token(raw: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
